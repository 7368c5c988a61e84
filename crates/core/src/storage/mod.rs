pub mod catalog_store;
pub mod record_log;
pub mod symbol_cache_store;
