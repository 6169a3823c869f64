//! Admin product API.
//!
//! JSON endpoints for the back office. Every handler requires a Supabase
//! access token whose email is on the admin allowlist; writes are forwarded
//! to Supabase with the service key when configured, otherwise with that
//! token.

use alcary_core::catalog::{upload_object_path, validate_image_upload};
use alcary_core::{NewProduct, Product, ProductId, ProductUpdate};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Length of the random part of an upload's file name.
const UPLOAD_TOKEN_LEN: usize = 8;

/// Sales counter after a recorded sale.
#[derive(Debug, Serialize)]
pub struct SalesCount {
    pub id: ProductId,
    pub sales_count: i64,
}

/// An image part pulled out of a multipart form.
struct ImageUpload {
    content_type: String,
    bytes: Vec<u8>,
}

/// List every product, newest first.
#[instrument(skip(state, admin), fields(admin = %admin.email))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    let products = state.supabase().list_products().await?;
    Ok(Json(products.as_ref().clone()))
}

/// Create a product from a multipart form with an optional `image` file.
///
/// Text parts are mapped through [`NewProduct::from_fields`], so the usual
/// spellings (`name`, `price`, `harga`, ...) are all accepted. The image is
/// uploaded first; if the insert then fails the upload is removed again.
#[instrument(skip(state, admin, multipart), fields(admin = %admin.email))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (fields, image) = read_product_form(multipart).await?;

    let now = Utc::now();
    let mut product = NewProduct::from_fields(&fields, now)?;

    let uploaded_path = match image {
        Some(image) => {
            let extension = validate_image_upload(&image.content_type, image.bytes.len())?;
            let path = upload_object_path(now.timestamp_millis(), &upload_token(), extension);
            product.image_url = state
                .supabase()
                .upload_image(&path, image.bytes, &image.content_type, &admin.access_token)
                .await?;
            Some(path)
        }
        None => None,
    };

    let created = match state
        .supabase()
        .create_product(&product, &admin.access_token)
        .await
    {
        Ok(created) => created,
        Err(e) => {
            if let Some(path) = uploaded_path
                && let Err(cleanup) = state
                    .supabase()
                    .delete_image(&path, &admin.access_token)
                    .await
            {
                tracing::warn!(error = %cleanup, path = %path, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    tracing::info!(product_id = %created.id, name = %created.name, "Product created");
    add_breadcrumb("admin", "Product created", Some(&[("product_id", created.id.as_str())]));

    Ok((StatusCode::CREATED, Json(created)))
}

/// Apply a partial update.
#[instrument(skip(state, admin, update), fields(admin = %admin.email))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    if update.is_empty() {
        return Err(AppError::BadRequest("nothing to update".to_string()));
    }
    update.validate()?;

    let id = ProductId::new(id);
    let product = state
        .supabase()
        .update_product(&id, &update, &admin.access_token)
        .await?;

    tracing::info!(product_id = %id, "Product updated");
    Ok(Json(product))
}

/// Delete a product and its stored image.
#[instrument(skip(state, admin), fields(admin = %admin.email))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = ProductId::new(id);
    state
        .supabase()
        .delete_product(&id, &admin.access_token)
        .await?;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Increment a product's sales counter.
#[instrument(skip(state, admin), fields(admin = %admin.email))]
pub async fn record_sale(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<SalesCount>> {
    let id = ProductId::new(id);
    let sales_count = state
        .supabase()
        .record_sale(&id, &admin.access_token)
        .await?;

    Ok(Json(SalesCount { id, sales_count }))
}

/// Split a multipart form into text fields and the image part.
///
/// An empty file input (no file chosen) counts as no image.
async fn read_product_form(
    mut multipart: Multipart,
) -> Result<(serde_json::Map<String, serde_json::Value>, Option<ImageUpload>)> {
    let mut fields = serde_json::Map::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" || field.file_name().is_some() {
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            if !bytes.is_empty() {
                image = Some(ImageUpload {
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        fields.insert(name, serde_json::Value::String(text));
    }

    Ok((fields, image))
}

/// Random lowercase alphanumeric token for upload file names.
fn upload_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(UPLOAD_TOKEN_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
