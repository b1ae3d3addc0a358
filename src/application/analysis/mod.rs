pub mod comparables;
pub mod insights;
pub mod scoring;
