pub mod allocation_service;
pub mod price_service;
pub mod report_service;
pub mod valuation_service;
