pub mod app_config;
pub mod engine;
pub mod error;

pub use app_config::Config;
pub use engine::GridEngine;
pub use error::EngineError;
