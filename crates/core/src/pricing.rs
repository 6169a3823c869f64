//! Shipping cost and order totals.
//!
//! Pure functions with no state of their own. Amounts are whole rupiah so no
//! rounding happens here.

use serde::Serialize;

use crate::cart::Cart;
use crate::types::Rupiah;
use crate::zones::{DELIVERY_ZONES, DeliveryZone, PICKUP_ZONE_ID, find_zone};

/// Subtotal at or above which delivery is free in every zone.
pub const FREE_SHIPPING_THRESHOLD: Rupiah = Rupiah::new(100_000);

/// Shipping cost for a zone given the cart subtotal.
///
/// Pickup is always free, as is any order reaching
/// [`FREE_SHIPPING_THRESHOLD`]. An unknown zone ID costs nothing rather than
/// blocking the checkout.
#[must_use]
pub fn shipping_cost(zone_id: &str, subtotal: Rupiah) -> Rupiah {
    if zone_id == PICKUP_ZONE_ID {
        return Rupiah::ZERO;
    }
    let Some(zone) = find_zone(zone_id) else {
        return Rupiah::ZERO;
    };
    if subtotal >= FREE_SHIPPING_THRESHOLD {
        return Rupiah::ZERO;
    }
    zone.flat_cost
}

/// Subtotal plus shipping.
#[must_use]
pub fn grand_total(subtotal: Rupiah, shipping: Rupiah) -> Rupiah {
    subtotal + shipping
}

/// Whether delivery to this zone costs nothing at this subtotal.
#[must_use]
pub fn is_eligible_free_shipping(subtotal: Rupiah, zone_id: &str) -> bool {
    zone_id == PICKUP_ZONE_ID || subtotal >= FREE_SHIPPING_THRESHOLD
}

/// Whether a real delivery became free because the threshold was reached.
///
/// Pickup and unknown zones never count.
#[must_use]
pub fn is_threshold_free_delivery(subtotal: Rupiah, zone_id: &str) -> bool {
    find_zone(zone_id).is_some_and(|zone| !zone.is_pickup())
        && is_eligible_free_shipping(subtotal, zone_id)
}

/// How much more the customer needs to spend to get free delivery.
#[must_use]
pub fn amount_until_free_shipping(subtotal: Rupiah) -> Rupiah {
    FREE_SHIPPING_THRESHOLD.saturating_sub(subtotal)
}

/// Derived totals for a cart and a selected zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Rupiah,
    pub shipping: Rupiah,
    pub total: Rupiah,
}

impl OrderTotals {
    /// Compute totals for a subtotal delivered to `zone_id`.
    #[must_use]
    pub fn for_subtotal(subtotal: Rupiah, zone_id: &str) -> Self {
        let shipping = shipping_cost(zone_id, subtotal);
        Self {
            subtotal,
            shipping,
            total: grand_total(subtotal, shipping),
        }
    }

    /// Compute totals for a cart delivered to `zone_id`.
    #[must_use]
    pub fn compute(cart: &Cart, zone_id: &str) -> Self {
        Self::for_subtotal(cart.subtotal(), zone_id)
    }
}

/// A zone together with what it would cost for the current subtotal.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneQuote {
    pub zone: &'static DeliveryZone,
    pub cost: Rupiah,
}

/// Quote every zone for the zone selector.
#[must_use]
pub fn zone_quotes(subtotal: Rupiah) -> Vec<ZoneQuote> {
    DELIVERY_ZONES
        .iter()
        .map(|zone| ZoneQuote {
            zone,
            cost: shipping_cost(zone.id, subtotal),
        })
        .collect()
}
