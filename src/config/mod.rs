pub mod env;
mod loader;

pub use env::{AppConfig, ClassifierMode, DirectoryConfig, GeminiConfig};
pub use loader::load_config;
