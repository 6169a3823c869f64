//! Supabase HTTP client.
//!
//! Catalog reads go out with the anon key and are cached for 5 minutes.
//! Writes use the service key when one is configured and otherwise forward
//! the admin's own access token, leaving row-level security to Supabase.

use std::sync::Arc;
use std::time::Duration;

use alcary_core::catalog::{IMAGE_BUCKET, image_object_path};
use alcary_core::{NewProduct, Product, ProductId, ProductUpdate};
use chrono::Utc;
use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::{AuthUser, SupabaseError, error_message};
use crate::config::SupabaseConfig;

const PRODUCTS_PATH: &str = "rest/v1/products";

/// Client for a Supabase project.
///
/// Cloning is cheap; all clones share one connection pool and cache.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base: Url,
    anon_key: String,
    service_key: Option<String>,
    cache: Cache<CacheKey, CacheValue>,
}

impl SupabaseClient {
    /// Create a new Supabase client.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        // Url::join drops the last segment unless the base ends in a slash
        let mut base = config.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Self {
            inner: Arc::new(SupabaseClientInner {
                client: reqwest::Client::new(),
                base,
                anon_key: config.anon_key.clone(),
                service_key: config
                    .service_key
                    .as_ref()
                    .map(|key| key.expose_secret().to_string()),
                cache,
            }),
        }
    }

    // =========================================================================
    // Catalog reads
    // =========================================================================

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rows cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Arc<Vec<Product>>, SupabaseError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let mut url = self.endpoint(PRODUCTS_PATH)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");

        let response = self
            .read_request(self.inner.client.get(url))
            .send()
            .await?;
        let body = Self::read_body(response, "list products").await?;
        let products: Arc<Vec<Product>> = Arc::new(Self::parse(&body, "list products")?);

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// A single product by ID.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::NotFound`] if no row has this ID.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, SupabaseError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self.fetch_product(id).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Product, SupabaseError> {
        let url = self.product_url(id)?;
        let response = self
            .read_request(self.inner.client.get(url))
            .send()
            .await?;
        let body = Self::read_body(response, "get product").await?;
        let rows: Vec<Product> = Self::parse(&body, "get product")?;

        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("product {id}")))
    }

    /// Drop every cached catalog read.
    pub fn invalidate(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Catalog writes
    // =========================================================================

    /// Insert a product and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns an error if Supabase rejects the insert.
    #[instrument(skip(self, product, token), fields(name = %product.name))]
    pub async fn create_product(
        &self,
        product: &NewProduct,
        token: &str,
    ) -> Result<Product, SupabaseError> {
        let url = self.endpoint(PRODUCTS_PATH)?;
        let response = self
            .write_request(self.inner.client.post(url), token)
            .header("Prefer", "return=representation")
            .json(&[product])
            .send()
            .await?;
        let body = Self::read_body(response, "create product").await?;
        let rows: Vec<Product> = Self::parse(&body, "create product")?;

        self.invalidate();

        rows.into_iter().next().ok_or_else(|| SupabaseError::Api {
            status: StatusCode::CREATED.as_u16(),
            message: "insert returned no rows".to_string(),
        })
    }

    /// Apply a partial update and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::NotFound`] if no row has this ID.
    #[instrument(skip(self, update, token), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
        token: &str,
    ) -> Result<Product, SupabaseError> {
        let mut update = update.clone();
        update.updated_at = Some(Utc::now());

        let url = self.product_url(id)?;
        let response = self
            .write_request(self.inner.client.patch(url), token)
            .header("Prefer", "return=representation")
            .json(&update)
            .send()
            .await?;
        let body = Self::read_body(response, "update product").await?;
        let rows: Vec<Product> = Self::parse(&body, "update product")?;

        self.invalidate();

        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("product {id}")))
    }

    /// Delete a product and its stored image.
    ///
    /// A failed image removal is logged and does not stop the row delete.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::NotFound`] if no row has this ID.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId, token: &str) -> Result<(), SupabaseError> {
        let product = self.fetch_product(id).await?;

        if let Some(path) = product.image().and_then(image_object_path)
            && let Err(e) = self.delete_image(&path, token).await
        {
            tracing::warn!(error = %e, path = %path, "Failed to delete product image");
        }

        let url = self.product_url(id)?;
        let response = self
            .write_request(self.inner.client.delete(url), token)
            .send()
            .await?;
        Self::read_body(response, "delete product").await?;

        self.invalidate();

        Ok(())
    }

    /// Increment a product's sales counter and return the new value.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::NotFound`] if no row has this ID.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn record_sale(&self, id: &ProductId, token: &str) -> Result<i64, SupabaseError> {
        let product = self.fetch_product(id).await?;
        let sales_count = product.sales_count.saturating_add(1);

        let url = self.product_url(id)?;
        let response = self
            .write_request(self.inner.client.patch(url), token)
            .json(&serde_json::json!({
                "sales_count": sales_count,
                "updated_at": Utc::now(),
            }))
            .send()
            .await?;
        Self::read_body(response, "record sale").await?;

        self.invalidate();

        Ok(sales_count)
    }

    // =========================================================================
    // Storage
    // =========================================================================

    /// Upload an image to the product bucket and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload is rejected, e.g. because the path
    /// already exists.
    #[instrument(skip(self, bytes, token), fields(size = bytes.len()))]
    pub async fn upload_image(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        token: &str,
    ) -> Result<String, SupabaseError> {
        let url = self.endpoint(&format!("storage/v1/object/{IMAGE_BUCKET}/{path}"))?;
        let response = self
            .write_request(self.inner.client.post(url), token)
            .header("Content-Type", content_type)
            .header("Cache-Control", "3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        Self::read_body(response, "upload image").await?;

        self.public_url(path)
    }

    /// Remove an object from the product bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if Storage rejects the request.
    #[instrument(skip(self, token))]
    pub async fn delete_image(&self, path: &str, token: &str) -> Result<(), SupabaseError> {
        let url = self.endpoint(&format!("storage/v1/object/{IMAGE_BUCKET}"))?;
        let response = self
            .write_request(self.inner.client.delete(url), token)
            .json(&serde_json::json!({ "prefixes": [path] }))
            .send()
            .await?;
        Self::read_body(response, "delete image").await?;
        Ok(())
    }

    /// Public URL of an object in the product bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not form a valid URL.
    pub fn public_url(&self, path: &str) -> Result<String, SupabaseError> {
        Ok(self
            .endpoint(&format!("storage/v1/object/public/{IMAGE_BUCKET}/{path}"))?
            .to_string())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Resolve an access token to its user.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Unauthorized`] if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn get_user(&self, token: &str) -> Result<AuthUser, SupabaseError> {
        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .inner
            .client
            .get(url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(SupabaseError::Unauthorized);
        }

        let body = Self::read_body(response, "get user").await?;
        Self::parse(&body, "get user")
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        Ok(self.inner.base.join(path)?)
    }

    fn product_url(&self, id: &ProductId) -> Result<Url, SupabaseError> {
        let mut url = self.endpoint(PRODUCTS_PATH)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }

    fn read_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(&self.inner.anon_key)
    }

    fn write_request(
        &self,
        request: reqwest::RequestBuilder,
        token: &str,
    ) -> reqwest::RequestBuilder {
        let bearer = self.inner.service_key.as_deref().unwrap_or(token);
        request
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(bearer)
    }

    async fn read_body(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<String, SupabaseError> {
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(SupabaseError::Unauthorized);
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation,
                body = %body.chars().take(500).collect::<String>(),
                "Supabase returned non-success status"
            );
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(body)
    }

    fn parse<T: DeserializeOwned>(body: &str, operation: &str) -> Result<T, SupabaseError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                operation,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Supabase response"
            );
            SupabaseError::Parse(e)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(url: &str) -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig {
            url: Url::parse(url).unwrap(),
            anon_key: "anon".to_string(),
            service_key: None,
        })
    }

    #[test]
    fn test_public_url() {
        let client = client("https://demo.supabase.co");
        assert_eq!(
            client.public_url("products/1-a.jpg").unwrap(),
            "https://demo.supabase.co/storage/v1/object/public/product-images/products/1-a.jpg"
        );
    }

    #[test]
    fn test_product_url_keeps_base_path() {
        let client = client("http://127.0.0.1:54321/proxy");
        let url = client.product_url(&ProductId::from(7)).unwrap();
        assert_eq!(url.path(), "/proxy/rest/v1/products");
        assert_eq!(url.query(), Some("select=*&id=eq.7"));
    }
}
