//! Supabase REST, Storage and Auth clients.
//!
//! # Architecture
//!
//! - Supabase is the source of truth for products; nothing is synced locally
//! - `PostgREST` `/rest/v1/products` for catalog reads and admin writes
//! - Storage bucket `product-images` for product photos
//! - `GoTrue` `/auth/v1/user` to resolve admin access tokens
//! - In-memory caching via `moka` for catalog reads (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use alcary_storefront::supabase::SupabaseClient;
//!
//! let client = SupabaseClient::new(&config.supabase);
//!
//! let products = client.list_products().await?;
//! let product = client.get_product(&ProductId::from(12)).await?;
//! ```

mod cache;
mod client;

pub use client::SupabaseClient;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Supabase answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Could not build a request URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The access token was missing, expired or rejected.
    #[error("Access token rejected")]
    Unauthorized,
}

/// The user behind an access token, as reported by `/auth/v1/user`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Pull a human-readable message out of a Supabase error body.
///
/// `PostgREST`, Storage and `GoTrue` each use different field names.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
        })
        .map_or_else(
            || body.chars().take(200).collect(),
            ToString::to_string,
        )
}
