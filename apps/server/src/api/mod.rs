//! HTTP API modules.

pub mod banking;
pub mod webhooks;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use ledgerdesk_core::membership::{Membership, Role};

use crate::error::ApiError;

/// Membership of the requesting principal, resolved by the application's
/// session layer and forwarded as headers at this boundary.
pub struct Caller(pub Membership);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant_id = header_value(parts, "x-tenant-id")
            .ok_or_else(|| ApiError::Unauthorized("missing tenant context".to_string()))?;
        let role = header_value(parts, "x-user-role")
            .and_then(|v| v.parse::<Role>().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing or unknown role".to_string()))?;

        Ok(Caller(Membership::new(tenant_id, role)))
    }
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
