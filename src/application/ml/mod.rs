// Model abstraction and artifacts
pub mod model_artifact;
pub mod predictor;

// Inference pipeline
pub mod feature_assembler;
pub mod model_registry;
pub mod prediction_engine;
pub mod statistical_estimator;

pub mod feature_importance;
