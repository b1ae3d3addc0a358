pub mod economic;
pub mod http_client_factory;
pub mod mock;
pub mod ml;

pub use economic::bank_of_canada::BankOfCanadaProvider;
pub use economic::static_provider::StaticIndicatorProvider;
pub use ml::file_model_loader::FileModelLoader;
