//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (hero, best sellers)
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Catalog (category, search, sort, page)
//! GET  /products/{id}          - Product detail
//!
//! # Cart (full pages, HTMX fragments when HX-Request is set)
//! GET  /cart                   - Cart page with zone selector and totals
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Set quantity, 0 removes (returns cart summary fragment)
//! POST /cart/remove            - Remove item (returns cart summary fragment)
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Cart count badge (fragment)
//! POST /cart/zone              - Select delivery zone
//! GET  /zones/suggest          - Zone suggestion for an area (fragment)
//!
//! # Checkout
//! GET  /checkout               - Checkout form
//! POST /checkout               - Validate and hand the order to WhatsApp
//!
//! # Admin API (bearer token, allowlisted email)
//! GET    /admin/api/products            - List products
//! POST   /admin/api/products            - Create product (multipart, optional image)
//! PUT    /admin/api/products/{id}       - Update product
//! DELETE /admin/api/products/{id}       - Delete product and its image
//! POST   /admin/api/products/{id}/sales - Record a sale
//! ```

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;

use alcary_core::catalog::MAX_IMAGE_BYTES;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderMap,
    middleware::from_fn,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::Session;

use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::models::load_cart;
use crate::state::AppState;

/// Header HTMX sets on every request it issues.
const HX_REQUEST: &str = "HX-Request";

/// Admin uploads carry an image plus the text fields.
const ADMIN_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// Whether the request came from HTMX and wants a fragment back.
fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Data every full page needs for the header and footer.
#[derive(Clone)]
pub struct PageContext {
    pub shop_name: String,
    pub cart_count: u64,
}

impl PageContext {
    /// Build the context for this session.
    ///
    /// A session that cannot be read shows an empty cart badge.
    pub async fn load(state: &AppState, session: &Session) -> Self {
        let cart_count = match load_cart(session).await {
            Ok(store) => store.total_item_count(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cart for page header");
                0
            }
        };

        Self {
            shop_name: state.config().shop.name.clone(),
            cart_count,
        }
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
        .route("/zone", post(cart::select_zone))
}

/// Create the admin API router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(admin::list).post(admin::create))
        .route("/products/{id}", put(admin::update).delete(admin::remove))
        .route("/products/{id}/sales", post(admin::record_sale))
        .layer(DefaultBodyLimit::max(ADMIN_BODY_LIMIT))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/zones/suggest", get(cart::suggest_zone))
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .nest("/admin/api", admin_routes())
}

/// Build the complete application: routes, static files, sessions and
/// the middleware stack.
pub fn app(state: AppState, static_dir: &str) -> Router {
    let session_layer = create_session_layer(state.config());

    // Outermost first
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware))
        .layer(session_layer)
        .layer(from_fn_with_state(state.clone(), security_headers_middleware));

    Router::new()
        .merge(routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(middleware)
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
