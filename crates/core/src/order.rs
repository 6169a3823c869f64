//! WhatsApp order message formatter.
//!
//! The order leaves the shop as a single chat message, so the layout here is
//! what the staff read on their phones. WhatsApp renders `*bold*` and
//! `_italic_`; everything else is plain text.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::checkout::ShopProfile;
use crate::pricing::{OrderTotals, is_threshold_free_delivery};
use crate::types::format_rupiah;
use crate::zones::{PICKUP_ZONE_ID, find_zone};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Contact details entered on the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    /// Delivery address; ignored for pickup.
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
}

/// Everything the formatter needs besides the cart itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutContext {
    pub customer: CustomerInfo,
    pub zone_id: String,
    pub totals: OrderTotals,
    /// When the order was placed, in the shop's local offset.
    pub placed_at: DateTime<FixedOffset>,
}

impl CheckoutContext {
    /// Build a context, computing totals from the cart.
    #[must_use]
    pub fn new(
        customer: CustomerInfo,
        zone_id: &str,
        cart: &Cart,
        placed_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            customer,
            zone_id: zone_id.to_string(),
            totals: OrderTotals::compute(cart, zone_id),
            placed_at,
        }
    }

    /// Returns `true` when the customer collects the order at the shop.
    #[must_use]
    pub fn is_pickup(&self) -> bool {
        self.zone_id == PICKUP_ZONE_ID
    }
}

/// Render the order as a WhatsApp message.
///
/// Sections appear in a fixed order: header, customer, date, items,
/// shipping, totals, confirmation footer. The address line is only present
/// for delivery orders and the notes line only when notes were given. An
/// unknown zone ID is shown as-is without a distance line.
#[must_use]
pub fn format_order_message(shop: &ShopProfile, cart: &Cart, ctx: &CheckoutContext) -> String {
    let customer = &ctx.customer;
    let totals = &ctx.totals;
    let zone = find_zone(&ctx.zone_id);
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("🍞 *PESANAN {}* 🧁", shop.name.to_uppercase()));
    lines.push(RULE.to_string());
    lines.push(String::new());

    lines.push("👤 *DATA PELANGGAN:*".to_string());
    lines.push(format!("Nama: *{}*", customer.name.trim()));
    lines.push(format!("HP: {}", customer.phone.trim()));
    let address = customer.address.trim();
    if !ctx.is_pickup() && !address.is_empty() {
        lines.push(format!("Alamat: {address}"));
    }
    let notes = customer.notes.trim();
    if !notes.is_empty() {
        lines.push(format!("Catatan: _{notes}_"));
    }
    lines.push(String::new());
    lines.push(format!("📅 *Tanggal:* {}", format_long_datetime(&ctx.placed_at)));
    lines.push(String::new());

    lines.push("🛒 *DETAIL PESANAN:*".to_string());
    lines.push(RULE.to_string());
    for (index, item) in cart.items().iter().enumerate() {
        lines.push(format!("{}. *{}*", index + 1, item.name));
        lines.push(format!("   Kategori: {}", item.category));
        lines.push(format!(
            "   {} x {} = *{}*",
            format_rupiah(item.price),
            item.quantity,
            format_rupiah(item.line_total())
        ));
        lines.push(String::new());
    }

    lines.push("🚚 *PENGIRIMAN:*".to_string());
    lines.push(RULE.to_string());
    lines.push(format!(
        "Metode: *{}*",
        zone.map_or(ctx.zone_id.as_str(), |z| z.name)
    ));
    if ctx.is_pickup() {
        lines.push("Ambil di toko".to_string());
    } else if let Some(zone) = zone {
        lines.push(format!("Jarak: {}", zone.distance_label));
    }
    let shipping_label = if totals.shipping.is_zero() {
        "GRATIS ✅".to_string()
    } else {
        format_rupiah(totals.shipping)
    };
    lines.push(format!("Ongkir: *{shipping_label}*"));
    lines.push(String::new());

    lines.push("💰 *TOTAL PEMBAYARAN:*".to_string());
    lines.push(RULE.to_string());
    lines.push(format!("Subtotal: {}", format_rupiah(totals.subtotal)));
    let shipping_total = if totals.shipping.is_zero() {
        "Gratis".to_string()
    } else {
        format_rupiah(totals.shipping)
    };
    lines.push(format!("Ongkir: {shipping_total}"));
    lines.push(format!("*TOTAL: {}*", format_rupiah(totals.total)));
    lines.push(String::new());

    if is_threshold_free_delivery(totals.subtotal, &ctx.zone_id) {
        lines.push("🎉 *Selamat! Anda mendapat GRATIS ONGKIR!*".to_string());
        lines.push(String::new());
    }

    lines.push("📝 *KONFIRMASI PESANAN:*".to_string());
    lines.push("Mohon balas dengan \"YA PESAN\" untuk konfirmasi".to_string());
    lines.push(String::new());
    lines.push(format!("🙏 _Terima kasih telah memilih {}!_", shop.name));

    lines.join("\n")
}

/// Long Indonesian date and time, e.g. `Sabtu, 17 Oktober 2026 pukul 14.30`.
#[must_use]
pub fn format_long_datetime(at: &DateTime<FixedOffset>) -> String {
    let month = usize::try_from(at.month0())
        .ok()
        .and_then(|i| MONTHS.get(i))
        .copied()
        .unwrap_or_default();
    format!(
        "{}, {} {} {} pukul {:02}.{:02}",
        day_name(at.weekday()),
        at.day(),
        month,
        at.year(),
        at.hour(),
        at.minute()
    )
}

const fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Senin",
        Weekday::Tue => "Selasa",
        Weekday::Wed => "Rabu",
        Weekday::Thu => "Kamis",
        Weekday::Fri => "Jumat",
        Weekday::Sat => "Sabtu",
        Weekday::Sun => "Minggu",
    }
}
