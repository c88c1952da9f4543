//! Serve command - run the HTTP service

use crate::config::ServiceConfig;
use anyhow::Result;

/// Run the HTTP service, optionally overriding the bind address
pub fn run(mut config: ServiceConfig, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = Some(bind);
    }

    super::runtime()?.block_on(crate::server::serve(&config))
}
