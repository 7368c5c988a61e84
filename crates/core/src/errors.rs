use thiserror::Error;

/// Unified error type for the entire wallet-tracker-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
///
/// Transient provider trouble (rate limits, 5xx, flaky networks) is
/// handled inside the retry loops and does not surface here; these
/// variants cover the conditions that actually stop or degrade a run.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API key for {provider} is missing or malformed")]
    ApiKeyMalformed { provider: String },

    #[error("API key rejected by {provider}")]
    ApiKeyRejected { provider: String },

    // ── Storage / File ──────────────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Snapshot {0} not found in the record log")]
    SnapshotNotFound(usize),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("{provider} still failing after {attempts} attempts")]
    ProviderUnavailable {
        provider: String,
        attempts: u32,
    },

    // ── Valuation ───────────────────────────────────────────────────
    #[error("Input validation failed: {0}")]
    ValidationError(String),

    #[error("No valid holdings in input")]
    EmptyHoldings,

    #[error("No price could be retrieved for any holding")]
    NoPrices,

    #[error("Unsupported currency pair {base}/{quote}")]
    UnsupportedCurrencyPair {
        base: String,
        quote: String,
    },
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Sanitize error message: strip query parameters from URLs to prevent
        // API key leakage. reqwest errors often contain full URLs with secrets.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
