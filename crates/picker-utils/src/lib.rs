//! Shared utilities for stock-picker
//!
//! This crate provides common functionality used across the stock-picker workspace:
//! tracing setup and the application-level configuration read from the environment.

pub mod config;
pub mod logging;

pub use config::{Config, LogFormat};
pub use logging::init_tracing_with;
