//! Cart, delivery zone and WhatsApp checkout scenarios.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use alcary_integration_tests::TestContext;
use axum::http::StatusCode;

const BOLU_TAPE: i64 = 1;
const DONAT_GULA: i64 = 4;

#[tokio::test]
async fn test_two_bolu_tape_to_zone1() {
    let ctx = TestContext::new().await;

    ctx.add_to_cart(BOLU_TAPE, 2).await;
    ctx.select_zone("zone1").await;

    let (status, body) = ctx.get("/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Bolu Tape"));
    assert!(body.contains("Rp 54.000"), "subtotal");
    assert!(body.contains("Rp 8.000"), "zone 1 delivery fee");
    assert!(body.contains("Rp 62.000"), "grand total");
    assert!(body.contains("Rp 46.000"), "amount until free delivery");

    let (status, body) = ctx
        .post_form(
            "/checkout",
            &[
                ("name", "Sari"),
                ("phone", "081234567890"),
                ("address", "Jl. Melati 5, Pusat Kota"),
                ("notes", "Tolong antar sore"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains("https://wa.me/6282152673902?text="));
    assert!(body.contains("Rp 62.000"));

    assert_eq!(ctx.cart_count().await, 0, "cart is emptied after checkout");
    let (_, body) = ctx.get("/cart").await;
    assert!(body.contains("Keranjang masih kosong"));
}

#[tokio::test]
async fn test_free_delivery_over_threshold() {
    let ctx = TestContext::new().await;

    ctx.add_to_cart(BOLU_TAPE, 4).await;
    ctx.select_zone("zone3").await;

    let (_, body) = ctx.get("/cart").await;
    assert!(body.contains("Rp 108.000"));
    assert!(body.contains("GRATIS ✅"));
    assert!(body.contains("Selamat"));
}

#[tokio::test]
async fn test_missing_address_keeps_cart() {
    let ctx = TestContext::new().await;

    ctx.add_to_cart(BOLU_TAPE, 1).await;
    ctx.select_zone("zone2").await;

    let (status, body) = ctx
        .post_form(
            "/checkout",
            &[("name", "Sari"), ("phone", "081234567890"), ("address", "   ")],
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Alamat wajib diisi untuk pengiriman!"));
    assert!(body.contains("value=\"Sari\""), "form is refilled");

    assert_eq!(ctx.cart_count().await, 1);
}

#[tokio::test]
async fn test_missing_contact_is_rejected() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart(BOLU_TAPE, 1).await;

    let (status, body) = ctx
        .post_form("/checkout", &[("name", "Sari"), ("phone", "")])
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Nama dan nomor HP wajib diisi!"));
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post_form(
            "/checkout",
            &[("name", "Sari"), ("phone", "0812"), ("address", "Jl. Mawar")],
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Keranjang kosong!"));
}

#[tokio::test]
async fn test_pickup_needs_no_address() {
    let ctx = TestContext::new().await;

    ctx.add_to_cart(BOLU_TAPE, 1).await;
    ctx.select_zone("pickup").await;

    let (status, body) = ctx
        .post_form("/checkout", &[("name", "Budi"), ("phone", "0813")])
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains("wa.me/6282152673902"));
    assert!(body.contains("Rp 27.000"));
}

#[tokio::test]
async fn test_form_zone_overrides_session_zone() {
    let ctx = TestContext::new().await;

    ctx.add_to_cart(BOLU_TAPE, 1).await;
    ctx.select_zone("zone1").await;

    let (status, body) = ctx
        .post_form(
            "/checkout",
            &[("name", "Budi"), ("phone", "0813"), ("zone_id", "pickup")],
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains("Rp 27.000"), "pickup total without delivery fee");
}

#[tokio::test]
async fn test_out_of_stock_cannot_be_added() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post_form(
            "/cart/add",
            &[("product_id", &DONAT_GULA.to_string()), ("quantity", "1")],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Donat Gula sedang habis"));
    assert_eq!(ctx.cart_count().await, 0);
}

#[tokio::test]
async fn test_carts_are_per_session() {
    let first = TestContext::new().await;
    first.add_to_cart(BOLU_TAPE, 3).await;
    assert_eq!(first.cart_count().await, 3);

    let other = reqwest::Client::new();
    let body = other
        .get(first.url("/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!body.contains('3'), "a fresh client starts with an empty cart");
}

#[tokio::test]
async fn test_zero_quantity_add_is_rejected() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .post_form(
            "/cart/add",
            &[("product_id", &BOLU_TAPE.to_string()), ("quantity", "0")],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ctx.cart_count().await, 0);

    // Leaving the field out still adds one
    let (status, _) = ctx
        .post_form("/cart/add", &[("product_id", &BOLU_TAPE.to_string())])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.cart_count().await, 1);
}

#[tokio::test]
async fn test_unknown_form_zone_is_rejected() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart(BOLU_TAPE, 1).await;

    let (status, _) = ctx
        .post_form(
            "/checkout",
            &[
                ("name", "Sari"),
                ("phone", "0812"),
                ("address", "Jl. Melati 5"),
                ("zone_id", "zone9"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ctx.cart_count().await, 1, "cart is untouched");
}

#[tokio::test]
async fn test_delivery_checkout_form_asks_for_address() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart(BOLU_TAPE, 1).await;

    let (_, body) = ctx.get("/checkout").await;
    assert!(!body.contains("name=\"address\""), "pickup by default");

    ctx.select_zone("zone2").await;
    let (_, body) = ctx.get("/checkout").await;
    assert!(body.contains("name=\"address\""));
}
