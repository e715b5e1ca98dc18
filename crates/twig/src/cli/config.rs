use std::path::Path;

use eyre::Result;
use tracing::debug;
use twig_core::config::ForkConfig;

/// Load fork settings from `path` if given, otherwise from the user config
/// file. An explicit path must exist and parse.
pub fn load_config(path: Option<&Path>) -> Result<ForkConfig> {
    let config = match path {
        Some(path) => ForkConfig::load_from(path)?,
        None => ForkConfig::load()?,
    };

    debug!(
        target: "twig::cli::config",
        default_option = %config.default_option,
        monotonic_timestamps = config.monotonic_timestamps,
        "Loaded fork config"
    );
    Ok(config)
}
