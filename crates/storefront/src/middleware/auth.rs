//! Admin authentication extractor.
//!
//! Admin requests carry a Supabase access token as a bearer token. The token
//! is resolved through Supabase Auth and the email checked against the
//! configured allowlist.

use alcary_core::Email;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;
use crate::supabase::SupabaseError;

/// An authenticated admin.
#[derive(Debug, Clone)]
pub struct AdminUser {
    /// Supabase user ID.
    pub id: String,
    /// Allowlisted email address.
    pub email: Email,
    /// The bearer token, forwarded to Supabase for writes.
    pub access_token: String,
}

/// Extractor that requires an allowlisted admin.
///
/// Rejects with 401 when the token is missing or rejected by Supabase, and
/// 403 when the user is not on the allowlist.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdmin(pub AdminUser);

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?
            .to_string();

        let user = state.supabase().get_user(&token).await.map_err(|e| match e {
            SupabaseError::Unauthorized => AppError::Unauthorized("invalid access token".into()),
            other => AppError::Supabase(other),
        })?;

        let email = user
            .email
            .as_deref()
            .and_then(|e| Email::parse(e).ok())
            .ok_or_else(|| AppError::Forbidden("account has no email".to_string()))?;

        if !state.config().is_admin(&email) {
            tracing::warn!(user_id = %user.id, email = %email, "Non-admin tried the admin API");
            return Err(AppError::Forbidden("admin access required".to_string()));
        }

        set_sentry_user(&user.id, Some(email.as_str()));

        Ok(Self(AdminUser {
            id: user.id,
            email,
            access_token: token,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/admin/api/products");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).expect("valid request").into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts(Some("bearer  abc "))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
