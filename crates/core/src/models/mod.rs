pub mod asset;
pub mod catalog;
pub mod chart;
pub mod record;
pub mod settings;
pub mod symbol_cache;
pub mod wallet;
