//! CLI error type.

use alcary_core::{CatalogError, CheckoutError, WhatsAppNumberError};
use thiserror::Error;

/// Errors a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Writing command output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON input or output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The product given on the command line is unusable.
    #[error("Invalid product: {0}")]
    Catalog(#[from] CatalogError),

    /// The order was rejected.
    #[error("{0}")]
    Checkout(#[from] CheckoutError),

    /// The shop's WhatsApp number is malformed.
    #[error("Invalid WhatsApp number: {0}")]
    WhatsApp(#[from] WhatsAppNumberError),

    /// The zone ID is not in the zone table.
    #[error("Unknown zone: {0}")]
    UnknownZone(String),

    /// The UTC offset is out of range.
    #[error("Invalid UTC offset: {0} hours")]
    InvalidOffset(i32),
}
