//! Integration tests for Roti Alcary.
//!
//! Each test starts two servers on ephemeral ports: a mock Supabase project
//! (`PostgREST` products table, Storage bucket and Auth user endpoint) and
//! the real storefront router pointed at it. Requests go through `reqwest`
//! with a cookie store so the session cart carries across calls.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p alcary-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - Cart, zone and WhatsApp checkout scenarios
//! - `storefront_routes` - Catalog pages, fragments and headers
//! - `admin_api` - Admin product API against the mock project

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use alcary_core::{Email, ShopProfile};
use alcary_storefront::config::{StorefrontConfig, SupabaseConfig};
use alcary_storefront::{AppState, app};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::FixedOffset;
use serde_json::{Map, Value, json};

/// Anon key the storefront is configured with.
pub const ANON_KEY: &str = "test-anon-key";

/// Access token of an allowlisted admin.
pub const ADMIN_TOKEN: &str = "admin-token";

/// Access token of a signed-in user who is not an admin.
pub const CUSTOMER_TOKEN: &str = "customer-token";

/// Email of the admin behind [`ADMIN_TOKEN`].
pub const ADMIN_EMAIL: &str = "alcary@gmail.com";

// =============================================================================
// Mock Supabase
// =============================================================================

#[derive(Default)]
struct MockData {
    products: Vec<Value>,
    next_id: i64,
    objects: BTreeMap<String, Vec<u8>>,
    users: HashMap<String, (String, String)>,
}

/// In-process stand-in for a Supabase project.
#[derive(Clone)]
pub struct MockSupabase {
    data: Arc<Mutex<MockData>>,
    /// Base URL, e.g. `http://127.0.0.1:54321`.
    pub url: String,
}

fn id_of(row: &Value) -> String {
    match row.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn id_filter(params: &HashMap<String, String>) -> Option<String> {
    params
        .get("id")
        .and_then(|v| v.strip_prefix("eq."))
        .map(ToString::to_string)
}

fn has_anon_key(headers: &HeaderMap) -> bool {
    headers
        .get("apikey")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == ANON_KEY)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(ToString::to_string)
}

fn missing_key() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "No API key found in request"})),
    )
        .into_response()
}

async fn list_products(
    State(mock): State<MockSupabase>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !has_anon_key(&headers) {
        return missing_key();
    }
    let data = mock.data.lock().unwrap();
    let rows: Vec<Value> = match id_filter(&params) {
        Some(id) => data
            .products
            .iter()
            .filter(|p| id_of(p) == id)
            .cloned()
            .collect(),
        None => data.products.iter().rev().cloned().collect(),
    };
    Json(rows).into_response()
}

async fn insert_products(
    State(mock): State<MockSupabase>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !has_anon_key(&headers) || bearer(&headers).is_none() {
        return missing_key();
    }
    let rows = match body {
        Value::Array(rows) => rows,
        row => vec![row],
    };

    let mut data = mock.data.lock().unwrap();
    let mut inserted = Vec::new();
    for mut row in rows {
        data.next_id += 1;
        if let Some(object) = row.as_object_mut() {
            object.insert("id".to_string(), json!(data.next_id));
        }
        data.products.push(row.clone());
        inserted.push(row);
    }
    (StatusCode::CREATED, Json(inserted)).into_response()
}

async fn update_products(
    State(mock): State<MockSupabase>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(patch): Json<Map<String, Value>>,
) -> Response {
    if !has_anon_key(&headers) || bearer(&headers).is_none() {
        return missing_key();
    }
    let Some(id) = id_filter(&params) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let mut data = mock.data.lock().unwrap();
    let mut updated = Vec::new();
    for row in data.products.iter_mut().filter(|p| id_of(p) == id) {
        if let Some(object) = row.as_object_mut() {
            for (key, value) in &patch {
                object.insert(key.clone(), value.clone());
            }
        }
        updated.push(row.clone());
    }
    Json(updated).into_response()
}

async fn delete_products(
    State(mock): State<MockSupabase>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !has_anon_key(&headers) || bearer(&headers).is_none() {
        return missing_key();
    }
    let Some(id) = id_filter(&params) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    mock.data.lock().unwrap().products.retain(|p| id_of(p) != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn upload_object(
    State(mock): State<MockSupabase>,
    Path(path): Path<String>,
    body: Bytes,
) -> Response {
    let mut data = mock.data.lock().unwrap();
    if data.objects.contains_key(&path) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"error": "Duplicate", "message": "The resource already exists"})),
        )
            .into_response();
    }
    data.objects.insert(path.clone(), body.to_vec());
    Json(json!({"Key": format!("product-images/{path}")})).into_response()
}

async fn delete_objects(State(mock): State<MockSupabase>, Json(body): Json<Value>) -> Response {
    let mut data = mock.data.lock().unwrap();
    let mut removed = Vec::new();
    for prefix in body["prefixes"].as_array().into_iter().flatten() {
        if let Some(path) = prefix.as_str()
            && data.objects.remove(path).is_some()
        {
            removed.push(json!({"name": path}));
        }
    }
    Json(removed).into_response()
}

async fn get_user(State(mock): State<MockSupabase>, headers: HeaderMap) -> Response {
    if !has_anon_key(&headers) {
        return missing_key();
    }
    let data = mock.data.lock().unwrap();
    match bearer(&headers).and_then(|token| data.users.get(&token).cloned()) {
        Some((id, email)) => Json(json!({"id": id, "email": email, "aud": "authenticated"}))
            .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"msg": "invalid JWT: unable to parse or verify signature"})),
        )
            .into_response(),
    }
}

impl MockSupabase {
    /// Start a mock project seeded with the bakery catalog.
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let mock = Self {
            data: Arc::new(Mutex::new(MockData::default())),
            url,
        };
        mock.seed();

        let router = Router::new()
            .route(
                "/rest/v1/products",
                get(list_products)
                    .post(insert_products)
                    .patch(update_products)
                    .delete(delete_products),
            )
            .route("/storage/v1/object/product-images", axum::routing::delete(delete_objects))
            .route("/storage/v1/object/product-images/{*path}", post(upload_object))
            .route("/auth/v1/user", get(get_user))
            .with_state(mock.clone());

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        mock
    }

    fn seed(&self) {
        let mut data = self.data.lock().unwrap();
        let image = format!(
            "{}/storage/v1/object/public/product-images/products/1-seed.jpg",
            self.url
        );
        data.objects
            .insert("products/1-seed.jpg".to_string(), b"jpeg".to_vec());
        data.products = vec![
            json!({
                "id": 1, "name": "Bolu Tape", "category": "kue",
                "description": "Bolu tape singkong yang lembut dan harum",
                "short_description": "Lembut dan harum",
                "selling_price": 27000, "cost_price": 15000, "stock": 20,
                "rating": 4.9, "review_count": 31, "sales_count": 120,
                "is_best_seller": true, "image_url": image,
                "created_at": "2026-09-01T08:00:00Z"
            }),
            json!({
                "id": 2, "name": "Roti Sobek Coklat", "category": "roti",
                "description": "Roti sobek isi coklat lumer",
                "selling_price": 18000, "cost_price": 9000, "stock": 15,
                "rating": 4.7, "review_count": 12, "sales_count": 80,
                "is_best_seller": false, "image_url": null,
                "created_at": "2026-09-05T08:00:00Z"
            }),
            json!({
                "id": 3, "name": "Kue Ulang Tahun Custom", "category": "custom",
                "description": "Kue ulang tahun dengan desain sesuai permintaan",
                "selling_price": 250000, "cost_price": 150000, "stock": 3,
                "rating": 5.0, "review_count": 8, "sales_count": 15,
                "is_best_seller": false, "image_url": "",
                "created_at": "2026-09-10T08:00:00Z"
            }),
            json!({
                "id": 4, "name": "Donat Gula", "category": "roti",
                "description": "Donat empuk bertabur gula halus",
                "selling_price": 5000, "cost_price": 2000, "stock": 0,
                "rating": 4.5, "review_count": 20, "sales_count": 200,
                "is_best_seller": false, "image_url": null,
                "created_at": "2026-09-12T08:00:00Z"
            }),
        ];
        data.next_id = 4;
        data.users.insert(
            ADMIN_TOKEN.to_string(),
            ("admin-uid".to_string(), ADMIN_EMAIL.to_string()),
        );
        data.users.insert(
            CUSTOMER_TOKEN.to_string(),
            ("customer-uid".to_string(), "pelanggan@example.com".to_string()),
        );
    }

    /// A product row as currently stored.
    #[must_use]
    pub fn product(&self, id: i64) -> Option<Value> {
        self.data
            .lock()
            .unwrap()
            .products
            .iter()
            .find(|p| id_of(p) == id.to_string())
            .cloned()
    }

    /// Number of stored product rows.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.data.lock().unwrap().products.len()
    }

    /// Whether the bucket holds an object at `path`.
    #[must_use]
    pub fn has_object(&self, path: &str) -> bool {
        self.data.lock().unwrap().objects.contains_key(path)
    }

    /// Paths of every stored object.
    #[must_use]
    pub fn object_paths(&self) -> Vec<String> {
        self.data.lock().unwrap().objects.keys().cloned().collect()
    }
}

// =============================================================================
// Test context
// =============================================================================

/// A running storefront wired to a mock Supabase project.
pub struct TestContext {
    /// Client with a cookie store, so the session persists across requests.
    pub client: reqwest::Client,
    /// Storefront base URL.
    pub storefront_url: String,
    /// The mock project behind the storefront.
    pub supabase: MockSupabase,
}

/// Storefront configuration pointing at `supabase_url`.
#[must_use]
pub fn test_config(supabase_url: &str, port: u16) -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port,
        base_url: format!("http://127.0.0.1:{port}"),
        shop: ShopProfile::default(),
        utc_offset: FixedOffset::east_opt(7 * 3600).unwrap(),
        supabase: SupabaseConfig {
            url: url::Url::parse(supabase_url).unwrap(),
            anon_key: ANON_KEY.to_string(),
            service_key: None,
        },
        admin_emails: vec![Email::parse(ADMIN_EMAIL).unwrap()],
        sentry_dsn: None,
        sentry_environment: None,
    }
}

impl TestContext {
    /// Start both servers and return a fresh client.
    pub async fn new() -> Self {
        let supabase = MockSupabase::start().await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();

        let state = AppState::new(test_config(&supabase.url, addr.port()));
        let static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/static");
        let router = app(state, static_dir);

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap();

        Self {
            client,
            storefront_url: format!("http://{addr}"),
            supabase,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// GET a page and return status and body.
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.text().await.unwrap())
    }

    /// POST a form and return status and body, following redirects.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> (StatusCode, String) {
        let body = form
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let response = self
            .client
            .post(self.url(path))
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.text().await.unwrap())
    }

    /// Add a product to the session cart.
    pub async fn add_to_cart(&self, product_id: i64, quantity: u32) {
        let (status, _) = self
            .post_form(
                "/cart/add",
                &[
                    ("product_id", &product_id.to_string()),
                    ("quantity", &quantity.to_string()),
                ],
            )
            .await;
        assert_eq!(status, StatusCode::OK, "add to cart should land on /cart");
    }

    /// Pick a delivery zone for the session.
    pub async fn select_zone(&self, zone_id: &str) {
        let (status, _) = self.post_form("/cart/zone", &[("zone_id", zone_id)]).await;
        assert_eq!(status, StatusCode::OK);
    }

    /// Item count shown in the cart badge fragment.
    pub async fn cart_count(&self) -> u64 {
        let (_, body) = self.get("/cart/count").await;
        let digits: String = body.chars().filter(char::is_ascii_digit).collect();
        digits.parse().unwrap_or(0)
    }

    /// An admin API request builder carrying `token`.
    #[must_use]
    pub fn admin(&self, method: reqwest::Method, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(&format!("/admin/api{path}")))
            .bearer_auth(token)
    }
}
