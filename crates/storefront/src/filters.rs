//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use alcary_core::{Rupiah, format_rupiah};

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Formats an amount as rupiah, e.g. `Rp 54.000`.
///
/// Accepts anything whose display form is an integer amount, so both
/// [`Rupiah`] values and plain numbers work. Anything else renders empty.
///
/// Usage in templates: `{{ product.selling_price|rupiah }}`
#[askama::filter_fn]
pub fn rupiah(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let amount = value
        .to_string()
        .trim()
        .parse::<i64>()
        .map_or(Rupiah::ZERO, Rupiah::new);
    Ok(format_rupiah(amount))
}
