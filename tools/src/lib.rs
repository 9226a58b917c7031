pub mod config;
pub mod migrate;

pub use config::ToolConfig;
