use thiserror::Error;

/// Errors raised by the valuation pipeline.
///
/// Data-quality problems (missing fields, stale economics, no model) never show up
/// here; they degrade to defaults and are reported as [`Degradation`] entries.
/// Only consistency errors and model-side failures are modelled as errors.
///
/// [`Degradation`]: crate::domain::valuation::Degradation
#[derive(Debug, Error)]
pub enum ValuationError {
    #[error("Feature vector length mismatch: expected {expected}, got {actual}")]
    FeatureLengthMismatch { expected: usize, actual: usize },

    #[error("Unknown feature name: {name}")]
    UnknownFeature { name: String },

    #[error("Model artifact '{name}' not found")]
    ModelNotFound { name: String },

    #[error("Invalid model artifact '{name}': {reason}")]
    InvalidArtifact { name: String, reason: String },

    #[error("Model inference failed: {reason}")]
    InferenceFailed { reason: String },
}

impl ValuationError {
    /// True for errors that signal a programming/consistency bug rather than bad data.
    pub fn is_consistency_error(&self) -> bool {
        matches!(
            self,
            Self::FeatureLengthMismatch { .. } | Self::UnknownFeature { .. }
        )
    }
}

/// Errors returned by economic indicator providers.
#[derive(Debug, Error)]
pub enum EconomicDataError {
    #[error("Provider request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Provider timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("Provider returned no usable observations")]
    EmptyResponse,
}
