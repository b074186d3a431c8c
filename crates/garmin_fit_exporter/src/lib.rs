//! Interactive Garmin Connect FIT exporter.
//!
//! The pipeline is strictly sequential: resolve credentials, sign in, list the
//! whole activity history, ask which categories to keep, then download every
//! matching activity into the output directory.

pub mod app;
pub mod cli;
pub mod credentials;
pub mod error;
pub mod export;
pub mod listing;
pub mod logging;
pub mod naming;
pub mod selection;

mod test_utils;

pub use error::{ExportError, ExportResult};
