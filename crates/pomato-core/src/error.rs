//! Core error types for pomato-core.
//!
//! Two families: [`EngineError`] for failures while the cycle is running and
//! [`ConfigError`] for failures while building a [`crate::CycleConfig`].
//! Neither is retried anywhere; callers surface them and exit.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised by the countdown and the cycle controller.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Standard input reached end of file or failed while the engine was
    /// waiting on it.
    #[error("input stream closed")]
    InputClosed,

    /// Writing the countdown line or a prompt failed.
    #[error("Render error: {0}")]
    Render(#[source] std::io::Error),

    /// Switching the terminal mode failed.
    #[error("Terminal error: {0}")]
    Terminal(#[source] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file exists but could not be read.
    #[error("Failed to read configuration from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or carries unknown keys.
    #[error("Failed to parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to save configuration
    #[error("Failed to write configuration to {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Result type alias for EngineError
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
