pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::store::LocalStore;
pub use config::toml_config::TomlConfig;
pub use core::engine::CompilerEngine;
pub use utils::error::{PlcError, Result};
