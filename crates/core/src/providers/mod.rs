pub mod registry;
pub mod resolver;
pub mod retry;
pub mod traits;

// API provider implementations
pub mod coingecko;
pub mod coinmarketcap;
pub mod yahoo_finance;
