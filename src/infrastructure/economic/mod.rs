pub mod bank_of_canada;
pub mod static_provider;
