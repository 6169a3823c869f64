//! Product route handlers.

use alcary_core::catalog::{
    ALL_CATEGORIES, CATEGORIES, PRODUCTS_PER_PAGE, filter_products, paginate,
};
use alcary_core::{Product, ProductId, ProductQuery, ProductSort};
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::models::load_cart;
use crate::routes::PageContext;
use crate::state::AppState;

/// Category filter tab.
#[derive(Clone)]
pub struct CategoryTab {
    pub name: &'static str,
    pub url: String,
    pub active: bool,
}

/// Sort dropdown option.
#[derive(Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<Product>,
    pub tabs: Vec<CategoryTab>,
    pub sorts: Vec<SortOption>,
    pub category: String,
    pub search: String,
    pub result_count: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: Product,
    pub in_cart: u32,
    pub related_products: Vec<Product>,
}

/// Catalog URL for a query, keeping every active parameter.
fn catalog_url(category: &str, search: &str, sort: ProductSort, page: usize) -> String {
    let mut url = format!("/products?category={}", urlencoding::encode(category));
    if !search.is_empty() {
        url.push_str("&search=");
        url.push_str(&urlencoding::encode(search));
    }
    if sort != ProductSort::default() {
        url.push_str("&sort=");
        url.push_str(sort.as_str());
    }
    if page > 1 {
        url.push_str(&format!("&page={page}"));
    }
    url
}

/// Display product listing page.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse> {
    let page = PageContext::load(&state, &session).await;
    let products = state.supabase().list_products().await?;

    let filtered = filter_products(&products, &query);
    let result_count = filtered.len();
    let (visible, total_pages) =
        paginate(&filtered, query.page.unwrap_or(1), PRODUCTS_PER_PAGE);
    let current_page = query.page.unwrap_or(1).clamp(1, total_pages);

    let category = query.category_filter().unwrap_or(ALL_CATEGORIES).to_string();
    let search = query.search.as_deref().map(str::trim).unwrap_or_default().to_string();

    let tabs = CATEGORIES
        .iter()
        .map(|c| CategoryTab {
            name: c.name,
            url: catalog_url(c.id, &search, query.sort, 1),
            active: c.id == category,
        })
        .collect();

    let sorts = ProductSort::ALL
        .iter()
        .map(|sort| SortOption {
            value: sort.as_str(),
            label: sort.label(),
            selected: *sort == query.sort,
        })
        .collect();

    let prev_url =
        (current_page > 1).then(|| catalog_url(&category, &search, query.sort, current_page - 1));
    let next_url = (current_page < total_pages)
        .then(|| catalog_url(&category, &search, query.sort, current_page + 1));

    Ok(ProductsIndexTemplate {
        page,
        products: visible.iter().map(|p| (*p).clone()).collect(),
        tabs,
        sorts,
        category,
        search,
        result_count,
        current_page,
        total_pages,
        prev_url,
        next_url,
    })
}

/// Display product detail page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let product = state.supabase().get_product(&id).await?;

    let in_cart = load_cart(&session).await?.cart().item_quantity(&id);
    let page = PageContext::load(&state, &session).await;

    // Up to four others from the same category
    let related_products = match state.supabase().list_products().await {
        Ok(products) => products
            .iter()
            .filter(|p| p.category == product.category && p.id != product.id)
            .take(4)
            .cloned()
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load related products");
            Vec::new()
        }
    };

    Ok(ProductShowTemplate {
        page,
        product,
        in_cart,
        related_products,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_url() {
        assert_eq!(
            catalog_url("all", "", ProductSort::Popular, 1),
            "/products?category=all"
        );
        assert_eq!(
            catalog_url("kue", "bolu tape", ProductSort::PriceLow, 2),
            "/products?category=kue&search=bolu%20tape&sort=price-low&page=2"
        );
    }
}
