//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions (Config, HttpConfig, TeamspeakConfig)
//! - [`defaults`]: serde default value functions
//! - [`validation`]: startup checks that report every problem at once

mod defaults;
mod types;
mod validation;

pub use types::{Config, ConfigError, HttpConfig, QueryTransport, TeamspeakConfig};
pub use validation::{validate, ValidationError};
