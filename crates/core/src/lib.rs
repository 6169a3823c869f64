//! Roti Alcary Core - cart, pricing and checkout logic.
//!
//! This crate provides the domain logic shared by all Roti Alcary components:
//! - `storefront` - Public-facing bakery site and admin product API
//! - `cli` - Command-line tools for quoting and composing orders
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no HTTP clients, no
//! async, no global state. The cart is persisted through the [`CartStorage`]
//! seam so each host (session store, JSON file, in-memory map) supplies its
//! own durable key/value backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, rupiah amounts and emails
//! - [`catalog`] - Product rows, catalog filtering and admin field mapping
//! - [`zones`] - Static delivery zone table and area-based zone suggestion
//! - [`cart`] - Cart line items and the persisted cart store
//! - [`pricing`] - Shipping cost, free-shipping threshold and order totals
//! - [`order`] - WhatsApp order message formatter
//! - [`checkout`] - Checkout validation and WhatsApp deep-link dispatch

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod order;
pub mod pricing;
pub mod types;
pub mod zones;

pub use cart::{
    CART_STORAGE_KEY, Cart, CartLineItem, CartProduct, CartStorage, CartStore, MemoryStorage,
    StorageError,
};
pub use catalog::{CatalogError, NewProduct, Product, ProductQuery, ProductSort, ProductUpdate};
pub use checkout::{
    CheckoutDispatch, CheckoutError, ShopProfile, WhatsAppNumber, WhatsAppNumberError, dispatch,
};
pub use order::{CheckoutContext, CustomerInfo, format_order_message};
pub use pricing::{
    FREE_SHIPPING_THRESHOLD, OrderTotals, grand_total, is_eligible_free_shipping,
    is_threshold_free_delivery, shipping_cost,
};
pub use types::*;
pub use zones::{DELIVERY_ZONES, DeliveryZone, find_zone, suggest_zone_for_area};
