//! Access-control extractors. These run before any handler body, so the
//! data layer can assume the caller is already authorized.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::auth::jwt::{Claims, JwtKeys, Role};
use crate::auth::repo::{self, Account, AccountKind};
use crate::error::ApiError;
use crate::state::AppState;

/// Any syntactically valid, correctly signed, unexpired bearer token.
pub struct AuthClaims(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthClaims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized("missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized("invalid auth scheme"))?;

        // Expired, forged and malformed tokens are indistinguishable to the
        // caller; the validator logs the difference at debug level.
        let keys = JwtKeys::from_ref(state);
        let claims = keys
            .verify(token)
            .map_err(|_| ApiError::Unauthorized("invalid or expired token"))?;
        Ok(AuthClaims(claims))
    }
}

/// Admin-only endpoints.
pub struct AdminUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthClaims(claims) = AuthClaims::from_request_parts(parts, state).await?;
        if claims.role != Role::Admin {
            return Err(ApiError::Forbidden("admin access required"));
        }
        Ok(AdminUser(claims))
    }
}

/// Coach-gated endpoints: role must be coach AND the account must still be
/// active and verified. Tokens are not revocable, so the flags are
/// re-checked against the store on every request.
pub struct ActiveCoach {
    pub claims: Claims,
    pub account: Account,
}

#[async_trait]
impl FromRequestParts<AppState> for ActiveCoach {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthClaims(claims) = AuthClaims::from_request_parts(parts, state).await?;
        if claims.role != Role::Coach {
            return Err(ApiError::Forbidden("coach access required"));
        }
        let account = repo::find_by_id(state.store.as_ref(), AccountKind::Coach, claims.sub)
            .await?
            .ok_or(ApiError::Forbidden("coach account no longer exists"))?;
        if !account.is_active {
            return Err(ApiError::Forbidden("account is disabled"));
        }
        if !account.is_verified {
            return Err(ApiError::Forbidden(
                "account pending verification; wait for admin approval",
            ));
        }
        Ok(ActiveCoach { claims, account })
    }
}
