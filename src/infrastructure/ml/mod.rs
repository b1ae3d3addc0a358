pub mod file_model_loader;
