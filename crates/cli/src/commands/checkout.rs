//! Compose the WhatsApp order for a stored cart.

use std::io::Write;

use alcary_core::{CartStore, CustomerInfo, ShopProfile, dispatch, format_rupiah};
use chrono::{DateTime, FixedOffset};

use crate::error::CliError;
use crate::storage::FileStorage;

/// Validate the cart, print the message and deep link, and clear the cart.
///
/// The cart is left untouched when validation fails.
///
/// # Errors
///
/// Returns [`CliError::Checkout`] with the customer-facing reason.
pub fn run(
    out: &mut impl Write,
    store: &mut CartStore<FileStorage>,
    shop: &ShopProfile,
    customer: CustomerInfo,
    zone_id: &str,
    placed_at: DateTime<FixedOffset>,
) -> Result<(), CliError> {
    let sent = dispatch(store, shop, customer, zone_id, placed_at)?;

    writeln!(out, "{}", sent.message)?;
    writeln!(out)?;
    writeln!(out, "Total: {}", format_rupiah(sent.totals.total))?;
    writeln!(out, "{}", sent.link)?;
    Ok(())
}
