//! Error types for the exporter.

use garmin_connect_client::GarminError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal exporter errors. Per-activity download failures never become one of
/// these; they are collected in the export summary instead.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Garmin Connect error: {0}")]
    Client(#[from] GarminError),

    #[error("cannot use output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("Input error: {0}")]
    Input(String),
}

impl ExportError {
    /// Short explanation printed before exiting.
    pub fn user_message(&self) -> &'static str {
        match self {
            ExportError::Client(GarminError::Config(_)) => {
                "Invalid Garmin service configuration."
            }
            ExportError::Client(e) if e.is_auth() => {
                "Authentication failed. Check your credentials and 2FA settings."
            }
            ExportError::Client(GarminError::Http(_) | GarminError::TooManyRequests(_)) => {
                "Unable to connect to Garmin Connect right now."
            }
            ExportError::Client(_) => "Garmin Connect returned an unexpected response.",
            ExportError::OutputDir { .. } => "Could not prepare the output directory.",
            ExportError::Io(_) => "Could not read from or write to the terminal.",
            ExportError::Credentials(_) => "Garmin credentials are required.",
            ExportError::Input(_) => "Could not read the activity selection.",
        }
    }
}

/// Result type alias for exporter operations.
pub type ExportResult<T> = Result<T, ExportError>;
