//! Error types for slocountlib

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during line counting
#[derive(Error, Debug)]
pub enum SlocountError {
    /// Invalid glob pattern in the exclude list
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    /// Invalid configuration option
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
