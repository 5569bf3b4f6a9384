//! Access control extractors
//!
//! Two steps, in order:
//! 1. [`CallerIdentity`] verifies the bearer token and yields the external
//!    identity id (401 on a missing or invalid token).
//! 2. [`Authorized<C>`] loads the account for that identity (404 with
//!    `needsOnboarding` when there is none) and checks its role against
//!    capability `C` (403).
//!
//! Both run before the handler body, so business logic never sees an
//! unauthenticated or unauthorised call.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use fairprice_common::{Role, User};
use std::marker::PhantomData;
use tracing::debug;

use crate::db::users::find_user;
use crate::error::ApiError;
use crate::AppState;

/// Verified external identity of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub String);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("No authentication token provided".to_string()))?;

        let identity = state.identity.verify(token).map_err(|e| {
            debug!("Token rejected: {}", e);
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        Ok(CallerIdentity(identity))
    }
}

/// A role check
pub trait Capability: Send + Sync + 'static {
    fn permits(role: Role) -> bool;
}

/// Any onboarded account
pub struct IsUser;
/// Verifiers and admins
pub struct IsVerifier;
/// Admins only; reserved for admin-only routes, none of which exist yet
pub struct IsAdmin;

impl Capability for IsUser {
    fn permits(role: Role) -> bool {
        matches!(role, Role::User | Role::Verifier | Role::Admin)
    }
}

impl Capability for IsVerifier {
    fn permits(role: Role) -> bool {
        matches!(role, Role::Verifier | Role::Admin)
    }
}

impl Capability for IsAdmin {
    fn permits(role: Role) -> bool {
        matches!(role, Role::Admin)
    }
}

/// Caller whose account holds capability `C`
pub struct Authorized<C> {
    pub user: User,
    _capability: PhantomData<C>,
}

impl<C> Authorized<C> {
    pub fn identity_id(&self) -> &str {
        &self.user.identity_id
    }
}

#[async_trait]
impl<C: Capability> FromRequestParts<AppState> for Authorized<C> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CallerIdentity(identity) = CallerIdentity::from_request_parts(parts, state).await?;

        let user = find_user(&state.db, &identity)
            .await?
            .ok_or(ApiError::NeedsOnboarding)?;

        if !C::permits(user.role) {
            debug!(identity = %identity, role = user.role.as_str(), "Role check failed");
            return Err(ApiError::Forbidden(
                "Access denied. Insufficient permissions.".to_string(),
            ));
        }

        Ok(Authorized {
            user,
            _capability: PhantomData,
        })
    }
}
