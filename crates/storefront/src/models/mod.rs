//! Domain models for storefront.
//!
//! The catalog and cart types live in `alcary-core`; this module only holds
//! what is specific to the web session.

pub mod session;

pub use session::{SessionCart, keys as session_keys, load_cart, save_cart, selected_zone};
