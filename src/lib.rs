//! Code quality service
//!
//! Accepts Python source uploads, runs complexity, lint and maintainability
//! analyses on them, persists the results and renders PDF reports.

pub mod analyzers;
pub mod assembler;
pub mod cli;
pub mod config;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod store;
