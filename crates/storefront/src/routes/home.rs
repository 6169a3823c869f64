//! Home page route handler.

use alcary_core::catalog::{BEST_SELLER_LIMIT, best_sellers, category_counts};
use alcary_core::{FREE_SHIPPING_THRESHOLD, Product};
use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::routes::PageContext;
use crate::state::AppState;

/// Category tile on the homepage.
#[derive(Clone)]
pub struct CategoryTile {
    pub id: &'static str,
    pub name: &'static str,
    pub count: usize,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub best_sellers: Vec<Product>,
    pub categories: Vec<CategoryTile>,
    pub free_shipping_threshold: i64,
}

/// Display the home page.
///
/// A catalog outage still renders the page, just without products.
#[instrument(skip(state, session))]
pub async fn home(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let page = PageContext::load(&state, &session).await;

    let products = match state.supabase().list_products().await {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load products for home page");
            Default::default()
        }
    };

    let categories = category_counts(&products)
        .into_iter()
        .map(|(category, count)| CategoryTile {
            id: category.id,
            name: category.name,
            count,
        })
        .collect();

    HomeTemplate {
        page,
        best_sellers: best_sellers(&products, BEST_SELLER_LIMIT)
            .into_iter()
            .cloned()
            .collect(),
        categories,
        free_shipping_threshold: FREE_SHIPPING_THRESHOLD.amount(),
    }
}
