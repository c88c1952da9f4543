//! Configuration module
//!
//! This module handles:
//! - Server settings (bind address, CORS origin, upload limits)
//! - Result store settings
//! - Analyzer commands and behaviour

mod service_config;

pub use service_config::{
    AnalysisSettings, ServerSettings, ServiceConfig, StoreSettings, LOCAL_CONFIG_FILE,
};
