//! Cart route handlers.
//!
//! The cart lives in the session as a JSON snapshot. Each handler loads it,
//! mutates it through a [`alcary_core::CartStore`] and writes it back.
//! Plain form posts are answered with a redirect to the cart page; HTMX
//! requests get a fragment and an `HX-Trigger: cart-updated` header.

use std::num::NonZeroU32;

use alcary_core::pricing::{amount_until_free_shipping, is_threshold_free_delivery, zone_quotes};
use alcary_core::zones::{PICKUP_ZONE_ID, find_zone};
use alcary_core::{
    Cart, CartProduct, DeliveryZone, OrderTotals, ProductId, Rupiah, suggest_zone_for_area,
};
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::{load_cart, save_cart, selected_zone, session_keys};
use crate::routes::{PageContext, is_htmx};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub image: Option<String>,
    pub price: Rupiah,
    pub quantity: u32,
    pub line_total: Rupiah,
}

/// Delivery zone option in the zone selector.
#[derive(Clone)]
pub struct ZoneOption {
    pub id: &'static str,
    pub name: &'static str,
    pub distance_label: &'static str,
    pub cost: Rupiah,
    pub selected: bool,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u64,
    pub zone_id: String,
    pub zone_name: String,
    pub is_pickup: bool,
    pub zones: Vec<ZoneOption>,
    pub totals: OrderTotals,
    /// Delivery became free through the threshold.
    pub free_delivery: bool,
    /// How much more to spend before delivery is free.
    pub until_free_shipping: Rupiah,
}

impl CartView {
    /// Build the view of `cart` delivered to `zone_id`.
    #[must_use]
    pub fn build(cart: &Cart, zone_id: &str) -> Self {
        let zone = find_zone(zone_id);
        let totals = OrderTotals::compute(cart, zone_id);
        let is_pickup = zone_id == PICKUP_ZONE_ID;

        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView {
                    id: item.id.to_string(),
                    name: item.name.clone(),
                    category: item.category.clone(),
                    image: item.image.clone(),
                    price: item.price,
                    quantity: item.quantity,
                    line_total: item.line_total(),
                })
                .collect(),
            item_count: cart.total_item_count(),
            zone_id: zone_id.to_string(),
            zone_name: zone.map_or_else(|| zone_id.to_string(), |z| z.name.to_string()),
            is_pickup,
            zones: zone_quotes(totals.subtotal)
                .into_iter()
                .map(|quote| ZoneOption {
                    id: quote.zone.id,
                    name: quote.zone.name,
                    distance_label: quote.zone.distance_label,
                    cost: quote.cost,
                    selected: quote.zone.id == zone_id,
                })
                .collect(),
            free_delivery: is_threshold_free_delivery(totals.subtotal, zone_id),
            until_free_shipping: if is_pickup {
                Rupiah::ZERO
            } else {
                amount_until_free_shipping(totals.subtotal)
            },
            totals,
        }
    }

    /// Returns `true` if the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Zone selection form data.
#[derive(Debug, Deserialize)]
pub struct ZoneForm {
    pub zone_id: String,
}

/// Area lookup query.
#[derive(Debug, Default, Deserialize)]
pub struct AreaQuery {
    #[serde(default)]
    pub area: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub area: String,
    pub suggestion: Option<&'static DeliveryZone>,
}

/// Cart items and totals fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_summary.html")]
pub struct CartSummaryTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Zone suggestion fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/zone_suggestion.html")]
pub struct ZoneSuggestionTemplate {
    pub area: String,
    pub suggestion: Option<&'static DeliveryZone>,
}

/// Respond to a cart mutation: the summary fragment for HTMX, a redirect
/// back to the cart page otherwise.
async fn cart_changed(session: &Session, headers: &HeaderMap, cart: &Cart) -> Result<Response> {
    if !is_htmx(headers) {
        return Ok(Redirect::to("/cart").into_response());
    }

    let zone_id = selected_zone(session).await?;
    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartSummaryTemplate {
            cart: CartView::build(cart, &zone_id),
        },
    )
        .into_response())
}

/// Quantity for an add: one when the field is absent, at least one otherwise.
fn requested_quantity(quantity: Option<u32>) -> Result<NonZeroU32> {
    quantity.map_or(Ok(NonZeroU32::MIN), |n| {
        NonZeroU32::new(n).ok_or_else(|| AppError::BadRequest("Jumlah minimal 1".to_string()))
    })
}

fn area_of(query: AreaQuery) -> String {
    query.area.unwrap_or_default().trim().to_string()
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<AreaQuery>,
) -> Result<impl IntoResponse> {
    let page = PageContext::load(&state, &session).await;
    let store = load_cart(&session).await?;
    let zone_id = selected_zone(&session).await?;
    let area = area_of(query);

    Ok(CartShowTemplate {
        page,
        cart: CartView::build(store.cart(), &zone_id),
        suggestion: suggest_zone_for_area(&area),
        area,
    })
}

/// Add item to cart.
///
/// The product is looked up in the catalog so the cart stores the current
/// name and price. A missing quantity adds one; an explicit zero is
/// rejected.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = requested_quantity(form.quantity)?;
    let id = ProductId::new(form.product_id);
    let product = state.supabase().get_product(&id).await?;
    if !product.in_stock() {
        return Err(AppError::BadRequest(format!("{} sedang habis", product.name)));
    }

    let mut store = load_cart(&session).await?;
    store.add_item(CartProduct::from(&product), quantity);
    let cart = save_cart(&session, store).await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));

    if !is_htmx(&headers) {
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: cart.total_item_count(),
        },
    )
        .into_response())
}

/// Set an item's quantity. Zero or less removes it.
#[instrument(skip(session, headers))]
pub async fn update(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let id = ProductId::new(form.product_id);

    let mut store = load_cart(&session).await?;
    store.set_quantity(&id, form.quantity);
    let cart = save_cart(&session, store).await?;

    cart_changed(&session, &headers, &cart).await
}

/// Remove item from cart. Removing an absent item is a no-op.
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let id = ProductId::new(form.product_id);

    let mut store = load_cart(&session).await?;
    store.remove_item(&id);
    let cart = save_cart(&session, store).await?;

    cart_changed(&session, &headers, &cart).await
}

/// Empty the cart.
#[instrument(skip(session, headers))]
pub async fn clear(session: Session, headers: HeaderMap) -> Result<Response> {
    let mut store = load_cart(&session).await?;
    store.clear();
    let cart = save_cart(&session, store).await?;

    cart_changed(&session, &headers, &cart).await
}

/// Get cart count badge (for HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<impl IntoResponse> {
    let store = load_cart(&session).await?;
    Ok(CartCountTemplate {
        count: store.total_item_count(),
    })
}

/// Store the delivery zone picked on the cart page.
#[instrument(skip(session, headers))]
pub async fn select_zone(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ZoneForm>,
) -> Result<Response> {
    let zone = find_zone(form.zone_id.trim())
        .ok_or_else(|| AppError::BadRequest(format!("unknown zone {}", form.zone_id)))?;

    session
        .insert(session_keys::SELECTED_ZONE, zone.id.to_string())
        .await?;

    let store = load_cart(&session).await?;
    cart_changed(&session, &headers, store.cart()).await
}

/// Suggest a zone for a typed area name (for HTMX).
#[instrument]
pub async fn suggest_zone(Query(query): Query<AreaQuery>) -> impl IntoResponse {
    let area = area_of(query);
    ZoneSuggestionTemplate {
        suggestion: suggest_zone_for_area(&area),
        area,
    }
}
