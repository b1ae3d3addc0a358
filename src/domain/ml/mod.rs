pub mod feature_registry;
pub mod model_metadata;
