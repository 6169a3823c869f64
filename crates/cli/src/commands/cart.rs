//! Cart commands against a JSON storage file.

use std::io::Write;
use std::num::NonZeroU32;

use alcary_core::{CartProduct, CartStore, ProductId, format_rupiah};

use crate::error::CliError;
use crate::storage::FileStorage;

/// Print the cart.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn show(out: &mut impl Write, store: &CartStore<FileStorage>) -> Result<(), CliError> {
    let cart = store.cart();
    if cart.is_empty() {
        writeln!(out, "Keranjang kosong.")?;
        return Ok(());
    }

    for (index, item) in cart.items().iter().enumerate() {
        writeln!(
            out,
            "{}. [{}] {} x{} @ {} = {}",
            index + 1,
            item.id,
            item.name,
            item.quantity,
            format_rupiah(item.price),
            format_rupiah(item.line_total())
        )?;
    }
    writeln!(
        out,
        "Total {} item, subtotal {}",
        cart.total_item_count(),
        format_rupiah(cart.subtotal())
    )?;
    Ok(())
}

/// Add a product given as a JSON object.
///
/// Accepts catalog rows and cart rows alike (`selling_price` or `price`,
/// `image` or `image_url`).
///
/// # Errors
///
/// Returns an error if the JSON is malformed or has no `id`.
pub fn add(
    store: &mut CartStore<FileStorage>,
    product_json: &str,
    quantity: NonZeroU32,
) -> Result<(), CliError> {
    let value: serde_json::Value = serde_json::from_str(product_json)?;
    let product = CartProduct::from_value(&value)?;
    tracing::info!(product_id = %product.id, quantity = quantity.get(), "Adding to cart");
    store.add_item(product, quantity);
    Ok(())
}

/// Set a line's quantity; zero or less removes it.
pub fn set(store: &mut CartStore<FileStorage>, id: &str, quantity: i64) {
    if !store.set_quantity(&ProductId::new(id), quantity) {
        tracing::warn!(product_id = id, "Product not in cart");
    }
}

/// Remove a line. Removing an absent product is a no-op.
pub fn remove(store: &mut CartStore<FileStorage>, id: &str) {
    if !store.remove_item(&ProductId::new(id)) {
        tracing::warn!(product_id = id, "Product not in cart");
    }
}
