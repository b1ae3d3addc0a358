pub mod indicator_cache;
