//! Cart line items and the persisted cart store.
//!
//! A [`Cart`] is an ordered list of [`CartLineItem`] with unique product IDs
//! and strictly positive quantities. [`CartStore`] wraps a cart together with
//! a [`CartStorage`] backend and writes the full JSON snapshot after every
//! mutation, so the persisted copy never lags behind what the customer sees.
//!
//! # Snapshot format
//!
//! A JSON array of `{id, name, price, image, category, quantity}` objects
//! stored under [`CART_STORAGE_KEY`]. Reading is tolerant: rows written by
//! the old browser cart (`selling_price`, `image_url`) are accepted, rows
//! with a non-positive quantity are dropped and duplicate IDs are merged.

use std::collections::HashMap;
use std::num::NonZeroU32;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogError, Product};
use crate::types::{ProductId, Rupiah};

/// Storage key the cart snapshot lives under.
pub const CART_STORAGE_KEY: &str = "alcary-cart";

// =============================================================================
// Product normalization
// =============================================================================

/// The canonical product shape accepted by [`Cart::add_item`].
///
/// Products reach the cart from the catalog, from form posts and from old
/// snapshots, each with slightly different field names. Every one of them
/// goes through this type first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: Rupiah,
    pub image: Option<String>,
}

impl CartProduct {
    /// Normalize a loosely-shaped product object.
    ///
    /// The price is taken from `selling_price`, falling back to `price` when
    /// that is missing or zero; the image from `image`, falling back to
    /// `image_url`. A missing price becomes zero and an empty image none.
    /// Text fields are kept exactly as given so a snapshot reloads into the
    /// same cart it was written from.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object or has no usable `id`.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, CatalogError> {
        let object = value.as_object().ok_or(CatalogError::NotAnObject)?;

        let id = object
            .get("id")
            .and_then(ProductId::from_value)
            .ok_or(CatalogError::MissingField("id"))?;

        let price = object
            .get("selling_price")
            .and_then(Rupiah::from_value)
            .filter(|p| !p.is_zero())
            .or_else(|| object.get("price").and_then(Rupiah::from_value))
            .unwrap_or_default();

        let image = ["image", "image_url"].iter().find_map(|key| {
            object
                .get(*key)
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)
        });

        Ok(Self {
            id,
            name: string_field(object, "name"),
            category: string_field(object, "category"),
            price,
            image,
        })
    }
}

impl From<&Product> for CartProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.selling_price,
            image: product.image_url.clone().filter(|url| !url.is_empty()),
        }
    }
}

fn string_field(object: &serde_json::Map<String, serde_json::Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(String::from)
        .unwrap_or_default()
}

// =============================================================================
// Cart
// =============================================================================

/// One product in the cart with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: ProductId,
    pub name: String,
    pub price: Rupiah,
    pub image: Option<String>,
    pub category: String,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLineItem {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Rupiah {
        self.price.times(self.quantity)
    }
}

/// An ordered list of line items with unique product IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Returns `true` if the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Add `quantity` of a product, merging with an existing row.
    pub fn add_item(&mut self, product: CartProduct, quantity: NonZeroU32) {
        if let Some(existing) = self.items.iter_mut().find(|item| item.id == product.id) {
            existing.quantity = existing.quantity.saturating_add(quantity.get());
            return;
        }

        self.items.push(CartLineItem {
            id: product.id,
            name: product.name,
            price: product.price,
            image: product.image,
            category: product.category,
            quantity: quantity.get(),
        });
    }

    /// Remove a product. Returns `true` if a row was removed.
    pub fn remove_item(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        self.items.len() != before
    }

    /// Replace a product's quantity; zero or less removes it.
    ///
    /// Returns `true` if the cart changed.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(id);
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.items.iter_mut().find(|item| &item.id == id) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Remove every line item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of price times quantity over all rows.
    #[must_use]
    pub fn subtotal(&self) -> Rupiah {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Quantity of a product in the cart, zero if absent.
    #[must_use]
    pub fn item_quantity(&self, id: &ProductId) -> u32 {
        self.items
            .iter()
            .find(|item| &item.id == id)
            .map_or(0, |item| item.quantity)
    }

    /// Serialize the snapshot stored under [`CART_STORAGE_KEY`].
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    /// Parse a snapshot, repairing rows that break the cart invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a JSON array.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn from_rows(rows: &[serde_json::Value]) -> Self {
        let mut cart = Self::new();
        for row in rows {
            let Some(quantity) = row
                .get("quantity")
                .and_then(parse_quantity)
                .and_then(NonZeroU32::new)
            else {
                continue;
            };

            match CartProduct::from_value(row) {
                Ok(product) => cart.add_item(product, quantity),
                Err(e) => tracing::debug!(error = %e, "Skipping unreadable cart row"),
            }
        }
        cart
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<serde_json::Value>::deserialize(deserializer)?;
        Ok(Self::from_rows(&rows))
    }
}

fn parse_quantity(value: &serde_json::Value) -> Option<u32> {
    let quantity = match value {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    u32::try_from(quantity).ok()
}

// =============================================================================
// Storage
// =============================================================================

/// Errors raised by a cart storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend refused the write because it is full.
    #[error("storage quota exceeded: {needed} bytes needed, {limit} available")]
    QuotaExceeded { needed: usize, limit: usize },

    /// The backend could not be read or written.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A durable string key/value store for cart snapshots.
///
/// All calls are synchronous; hosts with async backends load the snapshot
/// before building the store and flush it afterwards.
pub trait CartStorage {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory storage with an optional byte quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Create empty storage without a quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty storage that rejects values larger than `bytes`.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(bytes),
        }
    }

    /// Pre-populate a key.
    #[must_use]
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Raw value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl CartStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(limit) = self.quota
            && value.len() > limit
        {
            return Err(StorageError::QuotaExceeded {
                needed: value.len(),
                limit,
            });
        }
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// A cart kept in sync with a storage backend.
///
/// There is exactly one writer per store; every mutating call writes the
/// whole snapshot back. Storage failures are logged and swallowed so the
/// in-memory cart keeps working.
///
/// # Example
///
/// ```rust
/// use std::num::NonZeroU32;
/// use alcary_core::{CART_STORAGE_KEY, CartProduct, CartStore, MemoryStorage, ProductId, Rupiah};
///
/// let mut store = CartStore::load(MemoryStorage::new());
/// store.add_item(
///     CartProduct {
///         id: ProductId::from(1),
///         name: "Bolu Tape".to_string(),
///         category: "Bolu".to_string(),
///         price: Rupiah::new(27_000),
///         image: None,
///     },
///     NonZeroU32::MIN,
/// );
///
/// assert_eq!(store.subtotal(), Rupiah::new(27_000));
/// assert!(store.storage().get(CART_STORAGE_KEY).is_some());
/// ```
#[derive(Debug)]
pub struct CartStore<S: CartStorage> {
    cart: Cart,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Rehydrate the cart from storage.
    ///
    /// An absent key, unreadable storage or an unparsable snapshot all
    /// produce an empty cart.
    pub fn load(storage: S) -> Self {
        let cart = match storage.read(CART_STORAGE_KEY) {
            Ok(Some(snapshot)) => Cart::from_json(&snapshot).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding unreadable cart snapshot");
                Cart::new()
            }),
            Ok(None) => Cart::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Cart storage unavailable, starting empty");
                Cart::new()
            }
        };

        Self { cart, storage }
    }

    /// The current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Split into the cart and its backend.
    pub fn into_parts(self) -> (Cart, S) {
        (self.cart, self.storage)
    }

    /// See [`Cart::add_item`].
    pub fn add_item(&mut self, product: CartProduct, quantity: NonZeroU32) {
        self.cart.add_item(product, quantity);
        self.persist();
    }

    /// See [`Cart::remove_item`].
    pub fn remove_item(&mut self, id: &ProductId) -> bool {
        let removed = self.cart.remove_item(id);
        self.persist();
        removed
    }

    /// See [`Cart::set_quantity`].
    pub fn set_quantity(&mut self, id: &ProductId, quantity: i64) -> bool {
        let changed = self.cart.set_quantity(id, quantity);
        self.persist();
        changed
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.persist();
    }

    /// See [`Cart::total_item_count`].
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.cart.total_item_count()
    }

    /// See [`Cart::subtotal`].
    #[must_use]
    pub fn subtotal(&self) -> Rupiah {
        self.cart.subtotal()
    }

    fn persist(&mut self) {
        let snapshot = match self.cart.to_json() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize cart snapshot");
                return;
            }
        };

        if let Err(e) = self.storage.write(CART_STORAGE_KEY, &snapshot) {
            tracing::warn!(error = %e, "Failed to persist cart, keeping in-memory copy");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(id: i64, price: i64) -> CartProduct {
        CartProduct {
            id: ProductId::from(id),
            name: format!("Roti {id}"),
            category: "Roti Manis".to_string(),
            price: Rupiah::new(price),
            image: None,
        }
    }

    fn qty(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn test_repeated_add_merges_into_one_row() {
        let mut cart = Cart::new();
        for _ in 0..5 {
            cart.add_item(product(1, 10_000), NonZeroU32::MIN);
        }
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut cart = Cart::new();
        cart.add_item(product(3, 1_000), NonZeroU32::MIN);
        cart.add_item(product(1, 1_000), NonZeroU32::MIN);
        cart.add_item(product(3, 1_000), NonZeroU32::MIN);
        let ids: Vec<_> = cart.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 10_000), NonZeroU32::MIN);
        cart.add_item(product(2, 5_000), NonZeroU32::MIN);

        assert!(cart.remove_item(&ProductId::from(1)));
        let once = cart.clone();
        assert!(!cart.remove_item(&ProductId::from(1)));
        assert_eq!(cart, once);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 10_000), qty(3));
        cart.add_item(product(2, 5_000), NonZeroU32::MIN);

        cart.set_quantity(&ProductId::from(1), 0);
        assert_eq!(cart.item_quantity(&ProductId::from(1)), 0);
        assert_eq!(cart.subtotal(), Rupiah::new(5_000));

        cart.set_quantity(&ProductId::from(2), -4);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 10_000), NonZeroU32::MIN);
        assert!(!cart.set_quantity(&ProductId::from(9), 4));
        assert_eq!(cart.total_item_count(), 1);
    }

    #[test]
    fn test_subtotal_is_additive() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 27_000), qty(2));
        let before = cart.subtotal();
        cart.add_item(product(2, 12_500), qty(3));
        assert_eq!(cart.subtotal(), before + Rupiah::new(37_500));
        assert_eq!(cart.total_item_count(), 5);
    }

    #[test]
    fn test_zero_price_contributes_nothing() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 0), qty(4));
        cart.add_item(product(2, 3_000), NonZeroU32::MIN);
        assert_eq!(cart.subtotal(), Rupiah::new(3_000));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut cart = Cart::new();
        cart.add_item(product(2, 15_000), qty(2));
        let mut with_image = product(1, 27_000);
        with_image.image = Some("https://cdn.example/bolu.jpg".to_string());
        cart.add_item(with_image, NonZeroU32::MIN);

        let json = cart.to_json().unwrap();
        assert_eq!(Cart::from_json(&json).unwrap(), cart);
    }

    #[test]
    fn test_snapshot_round_trip_keeps_text_verbatim() {
        let paddings = ["", " ", "  ", "\t", "\n "];
        let mut cart = Cart::new();
        let mut id = 0;
        for lead in paddings {
            for trail in paddings {
                id += 1;
                cart.add_item(
                    CartProduct {
                        id: ProductId::from(id),
                        name: format!("{lead}Bolu Tape{trail}"),
                        category: format!("{trail}Kue{lead}"),
                        price: Rupiah::new(27_000),
                        image: Some(format!("{lead}https://cdn.example/{id}.jpg{trail}")),
                    },
                    qty(u32::try_from(id).unwrap()),
                );
            }
        }

        let reloaded = Cart::from_json(&cart.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, cart);
        assert_eq!(reloaded.items()[1].name, "Bolu Tape ");
    }

    #[test]
    fn test_catalog_product_with_padded_fields_reloads_unchanged() {
        let row: Product = serde_json::from_value(json!({
            "id": 7,
            "name": "Bolu Tape ",
            "category": " Kue",
            "selling_price": 27000,
            "image_url": " https://cdn.example/bolu.jpg"
        }))
        .unwrap();

        let mut store = CartStore::load(MemoryStorage::new());
        store.add_item(CartProduct::from(&row), qty(2));
        let (cart, storage) = store.into_parts();

        let mut reloaded = CartStore::load(storage);
        assert_eq!(reloaded.cart(), &cart);
        assert_eq!(reloaded.cart().items()[0].name, "Bolu Tape ");
        assert_eq!(reloaded.cart().items()[0].category, " Kue");

        reloaded.set_quantity(&ProductId::from(7), 5);
        let (mutated, storage) = reloaded.into_parts();
        let again = CartStore::load(storage);
        assert_eq!(again.cart(), &mutated);
        assert_eq!(again.cart().items()[0].quantity, 5);
    }

    #[test]
    fn test_snapshot_field_names() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 27_000), qty(2));
        let value: serde_json::Value = serde_json::from_str(&cart.to_json().unwrap()).unwrap();
        let row = &value[0];
        for key in ["id", "name", "price", "image", "category", "quantity"] {
            assert!(row.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_snapshot_repairs_invariants() {
        let json = json!([
            {"id": 1, "name": "Bolu", "price": 1000, "category": "Kue", "quantity": 2},
            {"id": "1", "name": "Bolu", "price": 1000, "category": "Kue", "quantity": 1},
            {"id": 2, "name": "Donat", "price": 500, "category": "Kue", "quantity": 0},
            {"name": "No id", "price": 500, "quantity": 1},
        ])
        .to_string();

        let cart = Cart::from_json(&json).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_legacy_browser_rows_are_accepted() {
        let json = json!([{
            "id": 7,
            "name": "Bolu Tape",
            "selling_price": 27000,
            "image_url": "https://x.supabase.co/storage/v1/object/public/product-images/products/a.jpg",
            "category": "Bolu",
            "quantity": 2
        }])
        .to_string();

        let cart = Cart::from_json(&json).unwrap();
        let item = &cart.items()[0];
        assert_eq!(item.price, Rupiah::new(27_000));
        assert!(item.image.as_deref().unwrap().ends_with("a.jpg"));
    }

    #[test]
    fn test_product_normalization_prefers_selling_price() {
        let p = CartProduct::from_value(&json!({
            "id": 1, "name": "Roti", "selling_price": 0, "price": "9000", "image": ""
        }))
        .unwrap();
        assert_eq!(p.price, Rupiah::new(9_000));
        assert_eq!(p.image, None);

        let p = CartProduct::from_value(&json!({"id": 1, "name": "Roti"})).unwrap();
        assert_eq!(p.price, Rupiah::ZERO);
    }

    #[test]
    fn test_product_normalization_requires_id() {
        assert!(matches!(
            CartProduct::from_value(&json!({"name": "Roti"})),
            Err(CatalogError::MissingField("id"))
        ));
        assert!(matches!(
            CartProduct::from_value(&json!([1, 2])),
            Err(CatalogError::NotAnObject)
        ));
    }

    #[test]
    fn test_store_persists_every_mutation() {
        let mut store = CartStore::load(MemoryStorage::new());
        store.add_item(product(1, 27_000), qty(2));
        let persisted = Cart::from_json(store.storage().get(CART_STORAGE_KEY).unwrap()).unwrap();
        assert_eq!(&persisted, store.cart());

        store.clear();
        assert_eq!(store.storage().get(CART_STORAGE_KEY), Some("[]"));
    }

    #[test]
    fn test_store_reload_yields_equal_cart() {
        let mut store = CartStore::load(MemoryStorage::new());
        store.add_item(product(1, 27_000), qty(2));
        store.add_item(product(2, 8_000), NonZeroU32::MIN);
        let (cart, storage) = store.into_parts();

        let reloaded = CartStore::load(storage);
        assert_eq!(reloaded.cart(), &cart);
    }

    #[test]
    fn test_store_parse_failure_starts_empty() {
        let storage = MemoryStorage::new().with_entry(CART_STORAGE_KEY, "{not json");
        let store = CartStore::load(storage);
        assert!(store.cart().is_empty());
    }

    #[test]
    fn test_store_quota_failure_keeps_memory_copy() {
        let mut store = CartStore::load(MemoryStorage::with_quota(4));
        store.add_item(product(1, 27_000), qty(2));
        assert_eq!(store.total_item_count(), 2);
        assert!(store.storage().get(CART_STORAGE_KEY).is_none());
    }
}
