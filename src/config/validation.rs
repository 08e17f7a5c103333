//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("teamspeak.host is required")]
    MissingHost,
    #[error("teamspeak.user is required")]
    MissingUser,
    #[error("teamspeak.password is required")]
    MissingPassword,
    #[error("teamspeak.port must not be 0")]
    InvalidPort,
    #[error("teamspeak.server_id must be a positive number, got '{0}'")]
    InvalidServerId(String),
    #[error("http.host_connection_link must not contain whitespace: '{0}'")]
    InvalidConnectionLink(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let ts = &config.teamspeak;

    // Required fields
    if ts.host.trim().is_empty() {
        errors.push(ValidationError::MissingHost);
    }
    if ts.user.is_empty() {
        errors.push(ValidationError::MissingUser);
    }
    if ts.password.is_empty() {
        errors.push(ValidationError::MissingPassword);
    }

    if ts.port == Some(0) {
        errors.push(ValidationError::InvalidPort);
    }

    // Virtual server ids are positive integers
    if !matches!(ts.server_id.parse::<u32>(), Ok(id) if id > 0) {
        errors.push(ValidationError::InvalidServerId(ts.server_id.clone()));
    }

    let link = &config.http.host_connection_link;
    if link.chars().any(char::is_whitespace) {
        errors.push(ValidationError::InvalidConnectionLink(link.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
