//! Checkout validation and WhatsApp hand-off.
//!
//! Checkout has no server-side order record. A successful dispatch means the
//! order message was formatted, wrapped in a `wa.me` deep link and the cart
//! was cleared; what happens in the chat afterwards is outside the system.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Cart, CartStorage, CartStore};
use crate::order::{CheckoutContext, CustomerInfo, format_order_message};
use crate::pricing::OrderTotals;
use crate::zones::PICKUP_ZONE_ID;

/// Shop name used when none is configured.
pub const DEFAULT_SHOP_NAME: &str = "Roti Alcary";

/// WhatsApp number orders are sent to when none is configured.
pub const DEFAULT_WHATSAPP_NUMBER: &str = "6282152673902";

const WHATSAPP_BASE_URL: &str = "https://wa.me";

/// Reasons a checkout is refused. Messages are shown to the customer as-is.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Keranjang kosong!")]
    EmptyCart,

    #[error("Nama dan nomor HP wajib diisi!")]
    MissingContact,

    #[error("Alamat wajib diisi untuk pengiriman!")]
    MissingAddress,
}

/// Errors that can occur when parsing a [`WhatsAppNumber`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WhatsAppNumberError {
    #[error("WhatsApp number cannot be empty")]
    Empty,

    #[error("WhatsApp number must contain only digits")]
    NotDigits,

    #[error("WhatsApp number must be {min} to {max} digits")]
    Length { min: usize, max: usize },

    #[error("WhatsApp number must start with the country code, not 0")]
    MissingCountryCode,
}

/// A phone number in international format without the leading `+`.
///
/// Spaces, dashes and a leading `+` are stripped on parse, since that is how
/// numbers tend to be pasted into config files.
///
/// ```rust
/// use alcary_core::WhatsAppNumber;
///
/// let number = WhatsAppNumber::parse("+62 821-5267-3902").unwrap();
/// assert_eq!(number.as_str(), "6282152673902");
/// assert!(WhatsAppNumber::parse("0821").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WhatsAppNumber(String);

impl WhatsAppNumber {
    const MIN_DIGITS: usize = 8;
    const MAX_DIGITS: usize = 15;

    /// Parse and normalize a number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, has characters other than
    /// digits and separators, starts with a trunk `0`, or has fewer than 8
    /// or more than 15 digits.
    pub fn parse(s: &str) -> Result<Self, WhatsAppNumberError> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let digits: String = trimmed
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
            .collect();

        if digits.is_empty() {
            return Err(WhatsAppNumberError::Empty);
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(WhatsAppNumberError::NotDigits);
        }
        if digits.starts_with('0') {
            return Err(WhatsAppNumberError::MissingCountryCode);
        }
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(WhatsAppNumberError::Length {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(digits))
    }

    /// Returns the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WhatsAppNumber {
    fn default() -> Self {
        Self(DEFAULT_WHATSAPP_NUMBER.to_string())
    }
}

impl fmt::Display for WhatsAppNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WhatsAppNumber {
    type Err = WhatsAppNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WhatsAppNumber {
    type Error = WhatsAppNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WhatsAppNumber> for String {
    fn from(number: WhatsAppNumber) -> Self {
        number.0
    }
}

/// The shop's display name and order contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopProfile {
    pub name: String,
    pub whatsapp_number: WhatsAppNumber,
}

impl Default for ShopProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_SHOP_NAME.to_string(),
            whatsapp_number: WhatsAppNumber::default(),
        }
    }
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDispatch {
    /// `wa.me` deep link carrying the message.
    pub link: String,
    /// The formatted order message.
    pub message: String,
    pub totals: OrderTotals,
    /// The cart as it was when the order was sent.
    pub order: Cart,
}

/// Check that a cart and form can be checked out.
///
/// Whitespace-only fields count as missing. The address is only required
/// for delivery.
///
/// # Errors
///
/// Returns the first problem found, in the order: empty cart, missing name
/// or phone, missing address.
pub fn validate(cart: &Cart, customer: &CustomerInfo, zone_id: &str) -> Result<(), CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    if customer.name.trim().is_empty() || customer.phone.trim().is_empty() {
        return Err(CheckoutError::MissingContact);
    }
    if zone_id != PICKUP_ZONE_ID && customer.address.trim().is_empty() {
        return Err(CheckoutError::MissingAddress);
    }
    Ok(())
}

/// Build the `https://wa.me/<number>?text=<message>` link.
#[must_use]
pub fn whatsapp_link(number: &WhatsAppNumber, message: &str) -> String {
    format!(
        "{WHATSAPP_BASE_URL}/{number}?text={}",
        urlencoding::encode(message)
    )
}

/// Validate, format and hand the order to WhatsApp, then clear the cart.
///
/// On failure the cart is left exactly as it was.
///
/// # Errors
///
/// Returns a [`CheckoutError`] when [`validate`] rejects the input.
pub fn dispatch<S: CartStorage>(
    store: &mut CartStore<S>,
    shop: &ShopProfile,
    customer: CustomerInfo,
    zone_id: &str,
    placed_at: DateTime<FixedOffset>,
) -> Result<CheckoutDispatch, CheckoutError> {
    validate(store.cart(), &customer, zone_id)?;

    let order = store.cart().clone();
    let ctx = CheckoutContext::new(customer, zone_id, &order, placed_at);
    let message = format_order_message(shop, &order, &ctx);
    let link = whatsapp_link(&shop.whatsapp_number, &message);

    store.clear();
    tracing::info!(
        zone = zone_id,
        items = order.total_item_count(),
        total = %ctx.totals.total,
        "Order handed to WhatsApp"
    );

    Ok(CheckoutDispatch {
        link,
        message,
        totals: ctx.totals,
        order,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroU32;

    use chrono::TimeZone;

    use super::*;
    use crate::cart::{CART_STORAGE_KEY, CartProduct, MemoryStorage};
    use crate::types::{ProductId, Rupiah};

    fn placed_at() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 17, 14, 30, 0)
            .unwrap()
    }

    fn store_with_bolu(quantity: u32) -> CartStore<MemoryStorage> {
        let mut store = CartStore::load(MemoryStorage::new());
        store.add_item(
            CartProduct {
                id: ProductId::from(1),
                name: "Bolu Tape".to_string(),
                category: "Kue".to_string(),
                price: Rupiah::new(27_000),
                image: None,
            },
            NonZeroU32::new(quantity).unwrap(),
        );
        store
    }

    fn customer(address: &str) -> CustomerInfo {
        CustomerInfo {
            name: "Sari".to_string(),
            phone: "08123456789".to_string(),
            address: address.to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_whatsapp_number_parse() {
        assert_eq!(WhatsAppNumber::parse(" 6282152673902 ").unwrap().as_str(), "6282152673902");
        assert_eq!(WhatsAppNumber::parse(""), Err(WhatsAppNumberError::Empty));
        assert_eq!(WhatsAppNumber::parse("62abc"), Err(WhatsAppNumberError::NotDigits));
        assert_eq!(
            WhatsAppNumber::parse("082152673902"),
            Err(WhatsAppNumberError::MissingCountryCode)
        );
        assert!(matches!(
            WhatsAppNumber::parse("6281"),
            Err(WhatsAppNumberError::Length { .. })
        ));
    }

    #[test]
    fn test_validate_order_of_checks() {
        let empty = Cart::new();
        assert_eq!(validate(&empty, &CustomerInfo::default(), "zone1"), Err(CheckoutError::EmptyCart));

        let store = store_with_bolu(1);
        let mut nameless = customer("Jl. Mawar");
        nameless.name = "   ".to_string();
        assert_eq!(validate(store.cart(), &nameless, "pickup"), Err(CheckoutError::MissingContact));

        assert_eq!(validate(store.cart(), &customer(" "), "zone1"), Err(CheckoutError::MissingAddress));
        assert_eq!(validate(store.cart(), &customer(""), "pickup"), Ok(()));
    }

    #[test]
    fn test_error_messages_are_user_facing() {
        assert_eq!(CheckoutError::MissingContact.to_string(), "Nama dan nomor HP wajib diisi!");
        assert_eq!(CheckoutError::MissingAddress.to_string(), "Alamat wajib diisi untuk pengiriman!");
    }

    #[test]
    fn test_dispatch_clears_cart_and_builds_link() {
        let mut store = store_with_bolu(2);
        let shop = ShopProfile::default();

        let sent = dispatch(&mut store, &shop, customer("Kelurahan A"), "zone1", placed_at()).unwrap();

        assert!(store.cart().is_empty());
        assert_eq!(store.storage().get(CART_STORAGE_KEY), Some("[]"));
        assert_eq!(sent.totals.total, Rupiah::new(62_000));
        assert_eq!(sent.order.total_item_count(), 2);
        assert!(sent.link.starts_with("https://wa.me/6282152673902?text="));

        let encoded = sent.link.split_once("?text=").unwrap().1;
        assert_eq!(urlencoding::decode(encoded).unwrap(), sent.message);
    }

    #[test]
    fn test_dispatch_failure_leaves_cart_untouched() {
        let mut store = store_with_bolu(3);
        let before = store.cart().clone();

        let result = dispatch(&mut store, &ShopProfile::default(), customer(""), "zone2", placed_at());

        assert_eq!(result, Err(CheckoutError::MissingAddress));
        assert_eq!(store.cart(), &before);
    }
}
