// Macroeconomic indicators and composites
pub mod economic;

// Domain-specific error types
pub mod errors;

// Feature layout and model metadata
pub mod ml;

// Port interfaces
pub mod ports;

// Property records and categorical encodings
pub mod property;

// Undervaluation ranking
pub mod ranking;

// Prediction and analysis value objects
pub mod valuation;
