//! Product catalog types and pure catalog logic.
//!
//! Products live in the Supabase `products` table. This module holds the row
//! type, the filters and sort orders used by the catalog page, best-seller
//! selection for the homepage, and the admin-side helpers for creating
//! products from loosely-named form fields and validating image uploads.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::types::{ProductId, Rupiah};

/// Storage bucket holding product images.
pub const IMAGE_BUCKET: &str = "product-images";

/// Folder inside [`IMAGE_BUCKET`] that uploads go to.
pub const IMAGE_FOLDER: &str = "products";

/// Largest accepted product image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Number of products shown in the homepage best-seller carousel.
pub const BEST_SELLER_LIMIT: usize = 6;

/// Products per catalog page.
pub const PRODUCTS_PER_PAGE: usize = 12;

/// Category assigned when the admin leaves it blank.
pub const DEFAULT_CATEGORY: &str = "Produk";

/// Errors from catalog input handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Expected a JSON object.
    #[error("product data must be an object")]
    NotAnObject,

    /// A required field is absent or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field has a value outside its allowed range.
    #[error("invalid value for {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    /// Image content type is not one of JPEG, PNG or WebP.
    #[error("Invalid file type. Please use JPEG, PNG, or WebP")]
    UnsupportedImageType(String),

    /// Image is larger than [`MAX_IMAGE_BYTES`].
    #[error("File size too large. Maximum 5MB allowed")]
    ImageTooLarge { size: usize },
}

// =============================================================================
// Product row
// =============================================================================

/// A row of the `products` table.
///
/// Nullable columns deserialize to their defaults and prices are parsed
/// leniently, so a half-filled row from the dashboard still renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub short_description: String,
    #[serde(default)]
    pub cost_price: Rupiah,
    #[serde(default)]
    pub selling_price: Rupiah,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_best_seller: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub review_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sales_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Short blurb for cards, falling back to the full description.
    #[must_use]
    pub fn summary(&self) -> &str {
        if self.short_description.trim().is_empty() {
            &self.description
        } else {
            &self.short_description
        }
    }

    /// Non-empty image URL, if any.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    /// Whether the product may be added to the cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Filtering
// =============================================================================

/// Catalog category shown as a filter tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
}

/// Pseudo-category that disables the category filter.
pub const ALL_CATEGORIES: &str = "all";

/// Filter tabs on the catalog page.
pub const CATEGORIES: [Category; 4] = [
    Category {
        id: ALL_CATEGORIES,
        name: "Semua Produk",
    },
    Category {
        id: "kue",
        name: "Kue",
    },
    Category {
        id: "roti",
        name: "Roti",
    },
    Category {
        id: "custom",
        name: "Custom",
    },
];

/// Each filter tab with the number of products it would show.
#[must_use]
pub fn category_counts(products: &[Product]) -> Vec<(Category, usize)> {
    CATEGORIES
        .iter()
        .map(|category| {
            let count = if category.id == ALL_CATEGORIES {
                products.len()
            } else {
                products.iter().filter(|p| p.category == category.id).count()
            };
            (*category, count)
        })
        .collect()
}

/// Sort order of the catalog listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    /// Most sold first.
    #[default]
    Popular,
    /// Cheapest first.
    PriceLow,
    /// Most expensive first.
    PriceHigh,
    /// Highest rated first.
    Rating,
    /// Most recently created first.
    Newest,
}

impl ProductSort {
    /// All sort orders in the order the dropdown lists them.
    pub const ALL: [Self; 5] = [
        Self::Popular,
        Self::PriceLow,
        Self::PriceHigh,
        Self::Newest,
        Self::Rating,
    ];

    /// Parse a query-string value; anything unknown sorts by popularity.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "price-low" => Self::PriceLow,
            "price-high" => Self::PriceHigh,
            "rating" => Self::Rating,
            "newest" => Self::Newest,
            _ => Self::Popular,
        }
    }

    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Popular => "popular",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::Rating => "rating",
            Self::Newest => "newest",
        }
    }

    /// Dropdown label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Popular => "Paling Populer",
            Self::PriceLow => "Harga Terendah",
            Self::PriceHigh => "Harga Tertinggi",
            Self::Rating => "Rating Tertinggi",
            Self::Newest => "Terbaru",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Popular => b.sales_count.cmp(&a.sales_count),
            Self::PriceLow => a.selling_price.cmp(&b.selling_price),
            Self::PriceHigh => b.selling_price.cmp(&a.selling_price),
            Self::Rating => b.rating.total_cmp(&a.rating),
            Self::Newest => b.created_at.cmp(&a.created_at),
        }
    }
}

/// Catalog listing parameters, as sent in the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductQuery {
    /// Category ID; `all` or empty means every category.
    #[serde(default)]
    pub category: Option<String>,
    /// Free-text search over name, description and category.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "lenient_sort")]
    pub sort: ProductSort,
    /// 1-based page number.
    #[serde(default)]
    pub page: Option<usize>,
}

impl ProductQuery {
    /// Active category filter, if any.
    #[must_use]
    pub fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
    }

    /// Lowercased search term, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn matches(&self, product: &Product, search: Option<&str>) -> bool {
        if let Some(category) = self.category_filter()
            && product.category != category
        {
            return false;
        }

        search.is_none_or(|needle| {
            [&product.name, &product.description, &product.category]
                .iter()
                .any(|field| field.to_lowercase().contains(needle))
        })
    }
}

fn lenient_sort<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProductSort, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(ProductSort::parse).unwrap_or_default())
}

/// Apply a catalog query: category filter, text search, then a stable sort.
#[must_use]
pub fn filter_products<'a>(products: &'a [Product], query: &ProductQuery) -> Vec<&'a Product> {
    let search = query.search_term();
    let mut filtered: Vec<&Product> = products
        .iter()
        .filter(|product| query.matches(product, search.as_deref()))
        .collect();
    filtered.sort_by(|a, b| query.sort.compare(a, b));
    filtered
}

/// Slice out one page of results.
///
/// Returns the items on `page` (1-based, clamped to the valid range) and the
/// total number of pages.
#[must_use]
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> (&[T], usize) {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(items.len());
    (items.get(start..end).unwrap_or_default(), total_pages)
}

/// Pick the homepage best sellers.
///
/// With `limit` products or fewer every product is shown in its original
/// order. Otherwise products are ranked by sales, then rating, then
/// creation date, newest first.
#[must_use]
pub fn best_sellers(products: &[Product], limit: usize) -> Vec<&Product> {
    if products.len() <= limit {
        return products.iter().collect();
    }

    let mut ranked: Vec<&Product> = products.iter().collect();
    ranked.sort_by(|a, b| {
        b.sales_count
            .cmp(&a.sales_count)
            .then_with(|| b.rating.total_cmp(&a.rating))
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    ranked.truncate(limit);
    ranked
}

// =============================================================================
// Admin input
// =============================================================================

/// A product to insert, built from admin form fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub cost_price: Rupiah,
    pub selling_price: Rupiah,
    pub category: String,
    pub image_url: String,
    pub is_best_seller: bool,
    pub stock: i64,
    pub rating: f64,
    pub review_count: i64,
    pub sales_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewProduct {
    /// Map loosely-named form fields onto a new product.
    ///
    /// Several spellings are accepted for each field (`name`, `productName`
    /// or `title`; `selling_price`, `sellingPrice`, `price`, `productPrice`,
    /// `harga` or `cost`; and so on). The first non-empty spelling wins.
    /// Category defaults to [`DEFAULT_CATEGORY`].
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MissingField`] when no name or no non-zero
    /// selling price is present.
    pub fn from_fields(
        fields: &serde_json::Map<String, serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<Self, CatalogError> {
        let name = first_text(fields, &["name", "productName", "title"])
            .ok_or(CatalogError::MissingField("name"))?;

        let selling_price = first_present(
            fields,
            &["selling_price", "sellingPrice", "price", "productPrice", "harga", "cost"],
        )
        .and_then(Rupiah::from_value)
        .filter(|price| !price.is_zero())
        .ok_or(CatalogError::MissingField("selling_price"))?;

        let cost_price = first_present(fields, &["cost_price", "costPrice", "harga_modal"])
            .and_then(Rupiah::from_value)
            .unwrap_or_default();

        Ok(Self {
            name,
            description: first_text(fields, &["description", "productDescription"])
                .unwrap_or_default(),
            short_description: first_text(fields, &["short_description", "shortDescription"])
                .unwrap_or_default(),
            cost_price,
            selling_price,
            category: first_text(fields, &["category", "productCategory", "kategori"])
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            image_url: String::new(),
            is_best_seller: first_present(fields, &["is_best_seller", "isBestSeller"])
                .is_some_and(truthy),
            stock: first_present(fields, &["stock", "stok"])
                .and_then(as_integer)
                .unwrap_or(0),
            rating: fields.get("rating").and_then(as_float).unwrap_or(0.0),
            review_count: fields.get("review_count").and_then(as_integer).unwrap_or(0),
            sales_count: fields.get("sales_count").and_then(as_integer).unwrap_or(0),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Editable fields of an existing product. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        alias = "shortDescription",
        skip_serializing_if = "Option::is_none"
    )]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "sellingPrice", skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<Rupiah>,
    #[serde(default, alias = "costPrice", skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Rupiah>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default, alias = "isBestSeller", skip_serializing_if = "Option::is_none")]
    pub is_best_seller: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProductUpdate {
    /// Check the patch before sending it.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank name, a zero selling price, a cost price
    /// above the selling price, or negative stock.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(CatalogError::MissingField("name"));
        }
        if self.selling_price.is_some_and(Rupiah::is_zero) {
            return Err(CatalogError::InvalidField {
                field: "selling_price",
                reason: "must be greater than zero",
            });
        }
        if let (Some(cost), Some(selling)) = (self.cost_price, self.selling_price)
            && cost > selling
        {
            return Err(CatalogError::InvalidField {
                field: "selling_price",
                reason: "must not be below the cost price",
            });
        }
        if self.stock.is_some_and(|s| s < 0) {
            return Err(CatalogError::InvalidField {
                field: "stock",
                reason: "must not be negative",
            });
        }
        Ok(())
    }

    /// Returns `true` if no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.short_description.is_none()
            && self.description.is_none()
            && self.selling_price.is_none()
            && self.cost_price.is_none()
            && self.category.is_none()
            && self.image_url.is_none()
            && self.stock.is_none()
            && self.is_best_seller.is_none()
    }
}

// JS-style truthiness so "", 0, false and null all count as absent.
fn truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => {
            let s = s.trim();
            !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false")
        }
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

fn first_present<'a>(
    fields: &'a serde_json::Map<String, serde_json::Value>,
    keys: &[&str],
) -> Option<&'a serde_json::Value> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| truthy(value))
}

fn first_text(fields: &serde_json::Map<String, serde_json::Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| fields.get(*key).and_then(serde_json::Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
}

fn as_integer(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_float(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// =============================================================================
// Images
// =============================================================================

/// Check an image upload and return the file extension to store it under.
///
/// # Errors
///
/// Returns an error for types other than JPEG, PNG or WebP, or for files
/// larger than [`MAX_IMAGE_BYTES`].
pub fn validate_image_upload(content_type: &str, size: usize) -> Result<&'static str, CatalogError> {
    let extension = match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        other => return Err(CatalogError::UnsupportedImageType(other.to_string())),
    };

    if size > MAX_IMAGE_BYTES {
        return Err(CatalogError::ImageTooLarge { size });
    }

    Ok(extension)
}

/// Bucket-relative path for a new upload: `products/{millis}-{token}.{ext}`.
#[must_use]
pub fn upload_object_path(timestamp_millis: i64, token: &str, extension: &str) -> String {
    format!("{IMAGE_FOLDER}/{timestamp_millis}-{token}.{extension}")
}

/// Recover the bucket-relative path from a public image URL.
///
/// Takes the last two path segments, which is where uploads are placed.
///
/// ```rust
/// use alcary_core::catalog::image_object_path;
///
/// let url = "https://x.supabase.co/storage/v1/object/public/product-images/products/1-a.jpg";
/// assert_eq!(image_object_path(url).as_deref(), Some("products/1-a.jpg"));
/// assert_eq!(image_object_path(""), None);
/// ```
#[must_use]
pub fn image_object_path(public_url: &str) -> Option<String> {
    let path = public_url.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
    let file = segments.next()?;
    let folder = segments.next()?;
    Some(format!("{folder}/{file}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn product(id: i64, sales: i64, rating: f64, day: u32) -> Product {
        serde_json::from_value(json!({
            "id": id,
            "name": format!("Roti {id}"),
            "description": "lembut",
            "selling_price": 10_000 + id * 1_000,
            "category": if id % 2 == 0 { "kue" } else { "roti" },
            "rating": rating,
            "sales_count": sales,
            "created_at": Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0).unwrap(),
        }))
        .unwrap()
    }

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn test_product_row_tolerates_nulls() {
        let product: Product = serde_json::from_value(json!({
            "id": 3,
            "name": "Bolu Tape",
            "description": null,
            "selling_price": "27000",
            "category": null,
            "image_url": null,
            "stock": null,
            "rating": null,
        }))
        .unwrap();

        assert_eq!(product.selling_price, Rupiah::new(27_000));
        assert_eq!(product.description, "");
        assert!(product.image().is_none());
        assert!(!product.in_stock());
    }

    #[test]
    fn test_filter_by_category_and_search() {
        let products: Vec<_> = (1..=6).map(|i| product(i, i, 4.0, 1)).collect();

        let query = ProductQuery {
            category: Some("kue".to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(filter_products(&products, &query).len(), 3);

        let query = ProductQuery {
            search: Some("  ROTI 5 ".to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&products, &query)), vec!["5"]);

        let query = ProductQuery {
            category: Some("all".to_string()),
            search: Some("LEMBUT".to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(filter_products(&products, &query).len(), 6);
    }

    #[test]
    fn test_sort_orders() {
        let products = vec![product(1, 5, 3.0, 3), product(2, 9, 4.5, 1), product(3, 1, 5.0, 2)];
        let sorted = |sort| {
            ids(&filter_products(
                &products,
                &ProductQuery {
                    sort,
                    ..ProductQuery::default()
                },
            ))
        };

        assert_eq!(sorted(ProductSort::Popular), vec!["2", "1", "3"]);
        assert_eq!(sorted(ProductSort::PriceLow), vec!["1", "2", "3"]);
        assert_eq!(sorted(ProductSort::PriceHigh), vec!["3", "2", "1"]);
        assert_eq!(sorted(ProductSort::Rating), vec!["3", "2", "1"]);
        assert_eq!(sorted(ProductSort::Newest), vec!["1", "3", "2"]);
    }

    #[test]
    fn test_query_string_sort_is_lenient() {
        let query: ProductQuery = serde_json::from_value(json!({"sort": "price-high"})).unwrap();
        assert_eq!(query.sort, ProductSort::PriceHigh);
        let query: ProductQuery = serde_json::from_value(json!({"sort": "bogus"})).unwrap();
        assert_eq!(query.sort, ProductSort::Popular);
    }

    #[test]
    fn test_best_sellers_small_catalog_keeps_order() {
        let products: Vec<_> = (1..=4).map(|i| product(i, 10 - i, 4.0, 1)).collect();
        assert_eq!(ids(&best_sellers(&products, BEST_SELLER_LIMIT)), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_best_sellers_ranking() {
        let products = vec![
            product(1, 3, 4.0, 1),
            product(2, 10, 4.0, 1),
            product(3, 10, 4.8, 1),
            product(4, 0, 5.0, 1),
            product(5, 3, 4.0, 9),
            product(6, 7, 1.0, 1),
            product(7, 0, 2.0, 1),
        ];
        assert_eq!(
            ids(&best_sellers(&products, BEST_SELLER_LIMIT)),
            vec!["3", "2", "6", "5", "1", "4"]
        );
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (0..25).collect();
        let (page, total) = paginate(&items, 3, PRODUCTS_PER_PAGE);
        assert_eq!(total, 3);
        assert_eq!(page, &[24]);

        let (page, _) = paginate(&items, 0, PRODUCTS_PER_PAGE);
        assert_eq!(page.len(), 12);

        let empty: Vec<u32> = Vec::new();
        assert_eq!(paginate(&empty, 5, PRODUCTS_PER_PAGE), (&[][..], 1));
    }

    #[test]
    fn test_category_counts() {
        let products: Vec<_> = (1..=5).map(|i| product(i, 0, 0.0, 1)).collect();
        let counts = category_counts(&products);
        assert_eq!(counts[0].1, 5);
        assert_eq!(counts[1], (CATEGORIES[1], 2));
        assert_eq!(counts[3].1, 0);
    }

    #[test]
    fn test_new_product_flexible_field_mapping() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 7, 30, 0).unwrap();
        let fields = json!({
            "productName": "  Donat Coklat ",
            "harga": "8500",
            "kategori": "kue",
            "stok": "12",
            "isBestSeller": "true",
            "harga_modal": 5000,
        });

        let product = NewProduct::from_fields(fields.as_object().unwrap(), now).unwrap();
        assert_eq!(product.name, "Donat Coklat");
        assert_eq!(product.selling_price, Rupiah::new(8_500));
        assert_eq!(product.cost_price, Rupiah::new(5_000));
        assert_eq!(product.category, "kue");
        assert_eq!(product.stock, 12);
        assert!(product.is_best_seller);
        assert_eq!(product.created_at, now);
    }

    #[test]
    fn test_new_product_defaults_and_precedence() {
        let fields = json!({
            "name": "Roti Sobek",
            "selling_price": "",
            "price": 15000,
            "cost": 1,
        });
        let product = NewProduct::from_fields(fields.as_object().unwrap(), Utc::now()).unwrap();
        assert_eq!(product.selling_price, Rupiah::new(15_000));
        assert_eq!(product.category, DEFAULT_CATEGORY);
        assert!(!product.is_best_seller);
    }

    #[test]
    fn test_new_product_requires_name_and_price() {
        let no_name = json!({"price": 1000});
        assert_eq!(
            NewProduct::from_fields(no_name.as_object().unwrap(), Utc::now()),
            Err(CatalogError::MissingField("name"))
        );

        let zero_price = json!({"title": "Roti", "price": 0});
        assert_eq!(
            NewProduct::from_fields(zero_price.as_object().unwrap(), Utc::now()),
            Err(CatalogError::MissingField("selling_price"))
        );
    }

    #[test]
    fn test_product_update_accepts_camel_case() {
        let update: ProductUpdate =
            serde_json::from_value(json!({"sellingPrice": 30000, "shortDescription": "Enak"}))
                .unwrap();
        assert_eq!(update.selling_price, Some(Rupiah::new(30_000)));
        assert!(update.validate().is_ok());
        assert!(!update.is_empty());

        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body, json!({"short_description": "Enak", "selling_price": 30000}));
    }

    #[test]
    fn test_product_update_validation() {
        let update = ProductUpdate {
            selling_price: Some(Rupiah::ZERO),
            ..ProductUpdate::default()
        };
        assert!(update.validate().is_err());

        let update = ProductUpdate {
            cost_price: Some(Rupiah::new(20_000)),
            selling_price: Some(Rupiah::new(15_000)),
            ..ProductUpdate::default()
        };
        assert!(update.validate().is_err());
        assert!(ProductUpdate::default().is_empty());
    }

    #[test]
    fn test_validate_image_upload() {
        assert_eq!(validate_image_upload("image/jpeg", 1024), Ok("jpg"));
        assert_eq!(validate_image_upload("IMAGE/WEBP", MAX_IMAGE_BYTES), Ok("webp"));
        assert!(matches!(
            validate_image_upload("image/gif", 10),
            Err(CatalogError::UnsupportedImageType(_))
        ));
        assert!(matches!(
            validate_image_upload("image/png", MAX_IMAGE_BYTES + 1),
            Err(CatalogError::ImageTooLarge { .. })
        ));
    }

    #[test]
    fn test_image_paths() {
        assert_eq!(upload_object_path(1_700_000, "k3x9", "png"), "products/1700000-k3x9.png");
        assert_eq!(
            image_object_path("https://h/p/product-images/products/a.png?t=1").as_deref(),
            Some("products/a.png")
        );
        assert_eq!(image_object_path("single"), None);
    }
}
