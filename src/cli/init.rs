//! Init command - write an example config file

use crate::config::{ServiceConfig, LOCAL_CONFIG_FILE};
use anyhow::Result;
use std::path::Path;

/// Write the example config to `path`, or `./code-quality.toml`
pub fn run(path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(Path::new(LOCAL_CONFIG_FILE));

    if ServiceConfig::init_config(path)? {
        println!("Created {}", path.display());
    } else {
        println!("Config already exists at {}", path.display());
    }
    Ok(())
}
