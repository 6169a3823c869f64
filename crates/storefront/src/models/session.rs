//! Session-related types.
//!
//! The cart lives in the session as the same JSON snapshot every other host
//! writes, under [`keys::CART`]. Handlers load it into a [`CartStore`],
//! mutate it synchronously and write it back before responding.

use alcary_core::{CART_STORAGE_KEY, Cart, CartStorage, CartStore, StorageError};
use alcary_core::zones::{PICKUP_ZONE_ID, find_zone};
use tower_sessions::Session;

/// Session keys.
pub mod keys {
    /// Key for the cart snapshot.
    pub const CART: &str = alcary_core::CART_STORAGE_KEY;

    /// Key for the delivery zone picked on the cart page.
    pub const SELECTED_ZONE: &str = "selectedDeliveryZone";
}

/// Cart backend holding one session's snapshot between load and save.
#[derive(Debug, Default)]
pub struct SessionCart {
    snapshot: Option<String>,
    dirty: bool,
}

impl SessionCart {
    /// Wrap a snapshot read from the session.
    #[must_use]
    pub const fn new(snapshot: Option<String>) -> Self {
        Self {
            snapshot,
            dirty: false,
        }
    }

    /// Whether the cart was written since it was loaded.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl CartStorage for SessionCart {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok((key == CART_STORAGE_KEY)
            .then(|| self.snapshot.clone())
            .flatten())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if key != CART_STORAGE_KEY {
            return Err(StorageError::Unavailable(format!("unknown key {key}")));
        }
        self.snapshot = Some(value.to_string());
        self.dirty = true;
        Ok(())
    }
}

/// Load this session's cart.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(
    session: &Session,
) -> Result<CartStore<SessionCart>, tower_sessions::session::Error> {
    let snapshot = session.get::<String>(keys::CART).await?;
    Ok(CartStore::load(SessionCart::new(snapshot)))
}

/// Write the cart back if it changed and return it.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn save_cart(
    session: &Session,
    store: CartStore<SessionCart>,
) -> Result<Cart, tower_sessions::session::Error> {
    let (cart, backend) = store.into_parts();
    if backend.is_dirty()
        && let Some(snapshot) = backend.snapshot
    {
        session.insert(keys::CART, snapshot).await?;
    }
    Ok(cart)
}

/// The zone picked for this session, or pickup when none is stored.
///
/// A stored id that no longer exists in the zone table falls back to pickup.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn selected_zone(session: &Session) -> Result<String, tower_sessions::session::Error> {
    let zone = session.get::<String>(keys::SELECTED_ZONE).await?;
    Ok(zone
        .filter(|id| find_zone(id).is_some())
        .unwrap_or_else(|| PICKUP_ZONE_ID.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroU32;
    use std::sync::Arc;

    use alcary_core::{CartProduct, ProductId, Rupiah};
    use tower_sessions::MemoryStore;

    use super::*;

    fn bolu_tape() -> CartProduct {
        CartProduct {
            id: ProductId::from(1),
            name: "Bolu Tape".to_string(),
            category: "kue".to_string(),
            price: Rupiah::new(27_000),
            image: None,
        }
    }

    #[test]
    fn test_session_cart_only_serves_cart_key() {
        let mut backend = SessionCart::new(Some("[]".to_string()));
        assert_eq!(backend.read(CART_STORAGE_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(backend.read("other").unwrap(), None);
        assert!(backend.write("other", "x").is_err());
        assert!(!backend.is_dirty());
    }

    #[tokio::test]
    async fn test_cart_round_trips_through_session() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        let mut store = load_cart(&session).await.unwrap();
        assert!(store.cart().is_empty());
        store.add_item(bolu_tape(), NonZeroU32::new(2).unwrap());
        save_cart(&session, store).await.unwrap();

        let store = load_cart(&session).await.unwrap();
        assert_eq!(store.subtotal(), Rupiah::new(54_000));
        assert_eq!(store.total_item_count(), 2);
    }

    #[tokio::test]
    async fn test_unchanged_cart_is_not_written_back() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        session
            .insert(keys::CART, "legacy".to_string())
            .await
            .unwrap();

        let store = load_cart(&session).await.unwrap();
        assert!(!store.storage().is_dirty());
        save_cart(&session, store).await.unwrap();
        assert_eq!(
            session.get::<String>(keys::CART).await.unwrap().as_deref(),
            Some("legacy")
        );

        let mut store = load_cart(&session).await.unwrap();
        store.add_item(bolu_tape(), NonZeroU32::MIN);
        assert!(store.storage().is_dirty());
        save_cart(&session, store).await.unwrap();
        assert_ne!(
            session.get::<String>(keys::CART).await.unwrap().as_deref(),
            Some("legacy")
        );
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_loads_empty() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        session
            .insert(keys::CART, "not json".to_string())
            .await
            .unwrap();

        let store = load_cart(&session).await.unwrap();
        assert!(store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_selected_zone_defaults_to_pickup() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert_eq!(selected_zone(&session).await.unwrap(), "pickup");

        session
            .insert(keys::SELECTED_ZONE, "zone2".to_string())
            .await
            .unwrap();
        assert_eq!(selected_zone(&session).await.unwrap(), "zone2");

        session
            .insert(keys::SELECTED_ZONE, "mars".to_string())
            .await
            .unwrap();
        assert_eq!(selected_zone(&session).await.unwrap(), "pickup");
    }
}
