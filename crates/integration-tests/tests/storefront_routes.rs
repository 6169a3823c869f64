//! Catalog pages, cart fragments and response headers.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use alcary_integration_tests::TestContext;
use axum::http::StatusCode;

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_home_lists_products() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.get("/").await;
    assert_eq!(status, StatusCode::OK);

    // Four products fit under the best seller limit, so all are shown
    for name in ["Bolu Tape", "Roti Sobek Coklat", "Kue Ulang Tahun Custom", "Donat Gula"] {
        assert!(body.contains(name), "missing {name}");
    }
    assert!(body.contains("/products?category=kue"));
}

#[tokio::test]
async fn test_category_filter() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.get("/products?category=roti").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Roti Sobek Coklat"));
    assert!(body.contains("Donat Gula"));
    assert!(!body.contains("Bolu Tape"));
}

#[tokio::test]
async fn test_search_matches_description() {
    let ctx = TestContext::new().await;
    let (_, body) = ctx.get("/products?search=singkong").await;
    assert!(body.contains("Bolu Tape"));
    assert!(!body.contains("Donat Gula"));
}

#[tokio::test]
async fn test_unknown_sort_falls_back() {
    let ctx = TestContext::new().await;
    let (status, _) = ctx.get("/products?sort=sideways").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_product_detail() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.get("/products/1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Bolu tape singkong yang lembut dan harum"));
    assert!(body.contains("Rp 27.000"));
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let ctx = TestContext::new().await;
    let (status, _) = ctx.get("/products/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_to_zero_removes_item() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart(1, 2).await;
    ctx.add_to_cart(2, 1).await;
    assert_eq!(ctx.cart_count().await, 3);

    let (status, _) = ctx
        .post_form("/cart/update", &[("product_id", "1"), ("quantity", "0")])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.cart_count().await, 1);

    let (_, body) = ctx.get("/cart").await;
    assert!(!body.contains("Bolu Tape"));
    assert!(body.contains("Roti Sobek Coklat"));

    ctx.post_form("/cart/clear", &[]).await;
    assert_eq!(ctx.cart_count().await, 0);
}

#[tokio::test]
async fn test_htmx_add_returns_fragment_and_trigger() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .post(ctx.url("/cart/add"))
        .header("HX-Request", "true")
        .form(&[("product_id", "2"), ("quantity", "2")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response
            .headers()
            .get("HX-Trigger")
            .and_then(|v| v.to_str().ok()),
        Some("cart-updated")
    );
    let body = response.text().await.unwrap();
    assert!(body.contains("<span class=\"badge\">2</span>"));
    assert!(!body.contains("<html"), "fragment only");
}

#[tokio::test]
async fn test_unknown_zone_is_rejected() {
    let ctx = TestContext::new().await;
    let (status, _) = ctx.post_form("/cart/zone", &[("zone_id", "zone9")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zone_suggestion() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/zones/suggest?area=mall%20central").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Zona 1"));

    let (_, body) = ctx.get("/zones/suggest?area=Jl.%20Antah%20Berantah").await;
    assert!(body.contains("Zona 3"));

    let (_, body) = ctx.get("/zones/suggest?area=ab").await;
    assert!(body.contains("minimal 3 huruf"));
}

#[tokio::test]
async fn test_security_headers() {
    let ctx = TestContext::new().await;
    let response = ctx.client.get(ctx.url("/")).send().await.unwrap();
    let headers = response.headers();

    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert!(headers.get("x-request-id").is_some());

    let csp = headers
        .get("content-security-policy")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(csp.contains(&format!("img-src 'self' data: {}", ctx.supabase.url)));
}

#[tokio::test]
async fn test_static_stylesheet_is_served() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.get("/static/css/main.css").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.is_empty());
}
