//! Configuration loading
//!
//! Sources, lowest priority first:
//! 1. Embedded defaults (`config/default.toml`, compiled in)
//! 2. `config/default`, `config/{MNEME_ENV}` and `config/local` files in the
//!    working directory, all optional
//! 3. `MNEME_*` environment variables, `__` separating nested keys

use crate::error::{Error, Result};
use crate::manager::StorageConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::de::DeserializeOwned;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

fn layered() -> ConfigBuilder<DefaultState> {
    let env = std::env::var("MNEME_ENV").unwrap_or_else(|_| "development".to_string());

    Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", env)).required(false))
        .add_source(File::with_name("config/local").required(false))
        // prefix_separator("_") so MNEME_STORAGE__X works with a single `_` after the prefix
        .add_source(
            Environment::with_prefix("MNEME")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
}

fn section<T: DeserializeOwned>(builder: ConfigBuilder<DefaultState>, name: &str) -> Result<T> {
    let config = builder
        .build()
        .map_err(|e| Error::Configuration(format!("Failed to build configuration: {}", e)))?;

    config
        .get::<T>(name)
        .map_err(|e| Error::Configuration(format!("Invalid [{}] configuration: {}", name, e)))
}

/// Load one top-level table from the layered configuration
pub fn load_section<T: DeserializeOwned>(name: &str) -> Result<T> {
    section(layered(), name)
}

/// Load one table from the embedded defaults overlaid with a TOML string
///
/// Files and environment are ignored, which keeps the result reproducible.
pub fn load_section_from_str<T: DeserializeOwned>(overrides: &str, name: &str) -> Result<T> {
    let builder = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::from_str(overrides, FileFormat::Toml));
    section(builder, name)
}

/// Load the `[storage]` table
pub fn load_config() -> Result<StorageConfig> {
    load_section("storage")
}
