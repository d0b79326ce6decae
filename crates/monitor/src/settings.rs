//! Configuration loading
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. `pairwatch.{toml,json,yaml}` in the working directory, or the file
//!    named by `PAIRWATCH_CONFIG` (which must then exist)
//! 3. `PAIRWATCH__SECTION__KEY` environment variables

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use std::env;

use pairwatch_core::MonitorConfig;

pub const CONFIG_PATH_VAR: &str = "PAIRWATCH_CONFIG";
const DEFAULT_CONFIG_NAME: &str = "pairwatch";
const ENV_PREFIX: &str = "PAIRWATCH";

pub fn load_config() -> Result<MonitorConfig> {
    let builder = match env::var(CONFIG_PATH_VAR) {
        Ok(path) => Config::builder().add_source(File::with_name(&path)),
        Err(_) => Config::builder().add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
    };

    finish(builder.add_source(environment()))
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<MonitorConfig> {
    let config: MonitorConfig = builder
        .build()
        .context("failed to read configuration")?
        .try_deserialize()
        .context("failed to parse configuration")?;

    config.validate()?;
    Ok(config)
}
