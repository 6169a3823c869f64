//! Delivery zone and quote commands.

use std::io::Write;

use alcary_core::pricing::{amount_until_free_shipping, zone_quotes};
use alcary_core::zones::find_zone;
use alcary_core::{OrderTotals, Rupiah, format_rupiah, suggest_zone_for_area};

use crate::error::CliError;

/// Display an amount, spelling out zero as "GRATIS".
fn cost_label(amount: Rupiah) -> String {
    if amount.is_zero() {
        "GRATIS".to_string()
    } else {
        format_rupiah(amount)
    }
}

/// List every zone with its cost for `subtotal`.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn list(out: &mut impl Write, subtotal: Rupiah) -> Result<(), CliError> {
    for quote in zone_quotes(subtotal) {
        writeln!(
            out,
            "{:<8} {:<22} {:<10} {}",
            quote.zone.id,
            quote.zone.name,
            quote.zone.distance_label,
            cost_label(quote.cost)
        )?;
    }
    Ok(())
}

/// Suggest a zone for an area name.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn suggest(out: &mut impl Write, area: &str) -> Result<(), CliError> {
    match suggest_zone_for_area(area) {
        Some(zone) => writeln!(out, "{} ({}, {})", zone.id, zone.name, zone.distance_label)?,
        None => writeln!(out, "Ketik minimal 3 huruf untuk mencari zona.")?,
    }
    Ok(())
}

/// Show shipping and total for a subtotal delivered to a zone.
///
/// # Errors
///
/// Returns [`CliError::UnknownZone`] if the zone does not exist.
pub fn quote(out: &mut impl Write, subtotal: Rupiah, zone_id: &str) -> Result<(), CliError> {
    let zone = find_zone(zone_id).ok_or_else(|| CliError::UnknownZone(zone_id.to_string()))?;
    let totals = OrderTotals::for_subtotal(subtotal, zone.id);

    writeln!(out, "Zona:     {} ({})", zone.name, zone.distance_label)?;
    writeln!(out, "Subtotal: {}", format_rupiah(totals.subtotal))?;
    writeln!(out, "Ongkir:   {}", cost_label(totals.shipping))?;
    writeln!(out, "Total:    {}", format_rupiah(totals.total))?;

    let remaining = amount_until_free_shipping(totals.subtotal);
    if !zone.is_pickup() && !remaining.is_zero() {
        writeln!(out, "Belanja {} lagi untuk gratis ongkir.", format_rupiah(remaining))?;
    }
    Ok(())
}
