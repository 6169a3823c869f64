//! Checkout route handlers.
//!
//! There is no payment or order record: checkout validates the form, formats
//! the order as a WhatsApp message and hands the customer a `wa.me` link.
//! The cart is emptied once the link exists.

use alcary_core::{CustomerInfo, OrderTotals, dispatch, find_zone};
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::{load_cart, save_cart, selected_zone};
use crate::routes::PageContext;
use crate::routes::cart::CartView;
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
    /// Overrides the zone stored in the session when present.
    #[serde(default)]
    pub zone_id: Option<String>,
}

impl From<CheckoutForm> for CustomerInfo {
    fn from(form: CheckoutForm) -> Self {
        Self {
            name: form.name,
            phone: form.phone,
            address: form.address,
            notes: form.notes,
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub form: CheckoutForm,
    pub error: Option<String>,
}

/// Confirmation page that opens WhatsApp.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub page: PageContext,
    pub link: String,
    pub message: String,
    pub totals: OrderTotals,
}

/// Display the checkout form.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let page = PageContext::load(&state, &session).await;
    let store = load_cart(&session).await?;
    let zone_id = selected_zone(&session).await?;

    Ok(CheckoutTemplate {
        page,
        cart: CartView::build(store.cart(), &zone_id),
        form: CheckoutForm::default(),
        error: None,
    })
}

/// Validate the order and hand it to WhatsApp.
///
/// A rejected order re-renders the form with the message and a 422 status,
/// leaving the cart as it was. An unknown zone in the form is a 400.
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let zone_id = match form.zone_id.as_deref().map(str::trim) {
        Some(zone) if !zone.is_empty() => find_zone(zone)
            .map(|z| z.id.to_string())
            .ok_or_else(|| AppError::BadRequest(format!("unknown zone {zone}")))?,
        _ => selected_zone(&session).await?,
    };

    let config = state.config();
    let placed_at = Utc::now().with_timezone(&config.utc_offset);

    let mut store = load_cart(&session).await?;
    match dispatch(
        &mut store,
        &config.shop,
        CustomerInfo::from(form.clone()),
        &zone_id,
        placed_at,
    ) {
        Ok(sent) => {
            save_cart(&session, store).await?;
            add_breadcrumb(
                "checkout",
                "Order handed to WhatsApp",
                Some(&[("zone", zone_id.as_str())]),
            );

            let page = PageContext::load(&state, &session).await;
            Ok(CheckoutSuccessTemplate {
                page,
                link: sent.link,
                message: sent.message,
                totals: sent.totals,
            }
            .into_response())
        }
        Err(e) => {
            tracing::info!(reason = %e, "Checkout rejected");
            let page = PageContext::load(&state, &session).await;
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutTemplate {
                    page,
                    cart: CartView::build(store.cart(), &zone_id),
                    form,
                    error: Some(e.to_string()),
                },
            )
                .into_response())
        }
    }
}
