// Economic indicator snapshot cache
pub mod economic;

// Feature assembly, model registry and prediction
pub mod ml;

// Scoring, comparables and insights
pub mod analysis;

// Undervaluation ranking
pub mod ranking;

// Orchestrator
pub mod valuation_service;
