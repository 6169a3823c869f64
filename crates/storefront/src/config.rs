//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPABASE_URL` - Supabase project URL (e.g., <https://abcd.supabase.co>)
//! - `SUPABASE_ANON_KEY` - Supabase anon (public) API key
//!
//! ## Optional
//! - `SUPABASE_SERVICE_KEY` - Service role key for admin writes (high entropy)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: `http://{host}:{port}`)
//! - `SHOP_NAME` - Shop display name (default: Roti Alcary)
//! - `SHOP_WHATSAPP_NUMBER` - Order WhatsApp number (default: 6282152673902)
//! - `SHOP_UTC_OFFSET_HOURS` - Shop clock offset for order timestamps (default: 7)
//! - `ADMIN_EMAILS` - Comma-separated admin allowlist
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use alcary_core::checkout::{DEFAULT_SHOP_NAME, DEFAULT_WHATSAPP_NUMBER};
use alcary_core::{Email, ShopProfile, WhatsAppNumber};
use chrono::FixedOffset;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Admins allowed when `ADMIN_EMAILS` is not set.
pub const DEFAULT_ADMIN_EMAILS: &str = "alcary@gmail.com,admin@alcary.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Shop name and WhatsApp contact
    pub shop: ShopProfile,
    /// Offset of the shop's wall clock from UTC
    pub utc_offset: FixedOffset,
    /// Supabase project configuration
    pub supabase: SupabaseConfig,
    /// Emails allowed to use the admin API
    pub admin_emails: Vec<Email>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Supabase project configuration.
///
/// Implements `Debug` manually to redact the service key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL without a trailing slash
    pub url: Url,
    /// Anon API key (safe to expose in browser)
    pub anon_key: String,
    /// Service role key, bypasses row level security
    pub service_key: Option<SecretString>,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &self.anon_key)
            .field(
                "service_key",
                &self.service_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl SupabaseConfig {
    /// Host of the project URL, used to allow product images in the CSP.
    #[must_use]
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_optional_env("STOREFRONT_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));

        let whatsapp_number =
            WhatsAppNumber::parse(&get_env_or_default("SHOP_WHATSAPP_NUMBER", DEFAULT_WHATSAPP_NUMBER))
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("SHOP_WHATSAPP_NUMBER".to_string(), e.to_string())
                })?;
        let shop = ShopProfile {
            name: get_env_or_default("SHOP_NAME", DEFAULT_SHOP_NAME),
            whatsapp_number,
        };

        let utc_offset = parse_utc_offset(&get_env_or_default("SHOP_UTC_OFFSET_HOURS", "7"))?;

        let admin_emails = Email::parse_list(&get_env_or_default("ADMIN_EMAILS", DEFAULT_ADMIN_EMAILS));
        if admin_emails.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_EMAILS".to_string(),
                "no valid email addresses".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            base_url,
            shop,
            utc_offset,
            supabase: SupabaseConfig::from_env()?,
            admin_emails,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Whether `email` is on the admin allowlist.
    #[must_use]
    pub fn is_admin(&self, email: &Email) -> bool {
        self.admin_emails.contains(email)
    }
}

impl SupabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("SUPABASE_URL")?;
        let url = Url::parse(raw_url.trim_end_matches('/'))
            .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e.to_string()))?;
        if url.host_str().is_none() {
            return Err(ConfigError::InvalidEnvVar(
                "SUPABASE_URL".to_string(),
                "must have a host".to_string(),
            ));
        }

        let service_key = match get_optional_env("SUPABASE_SERVICE_KEY") {
            Some(value) => {
                validate_secret_strength(&value, "SUPABASE_SERVICE_KEY")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        Ok(Self {
            url,
            anon_key: get_required_env("SUPABASE_ANON_KEY")?,
            service_key,
        })
    }

    /// Service key, if configured.
    #[must_use]
    pub fn service_key(&self) -> Option<&str> {
        self.service_key.as_ref().map(ExposeSecret::expose_secret)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse a whole-hour UTC offset such as `7` or `-3`.
fn parse_utc_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("SHOP_UTC_OFFSET_HOURS".to_string(), reason);

    let hours: i32 = value.trim().parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
    FixedOffset::east_opt(hours * 3600).ok_or_else(|| invalid(format!("{hours} is out of range")))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from the Supabase dashboard."
            ),
        ));
    }

    Ok(())
}
