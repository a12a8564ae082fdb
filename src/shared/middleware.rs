//! Request-context extractors for the gateway.
//!
//! Every authenticated route resolves the bearer token to an Account, and
//! tenant-scoped routes additionally resolve the caller's Profile in exactly
//! one organization. The organization id is threaded from here as an explicit
//! parameter into every store call; nothing below the gateway carries
//! implicit "current organization" state.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;

use crate::directory::profiles::ROLE_ADMIN;
use crate::directory::Profile;
use crate::identity::tokens::extract_bearer_token;
use crate::identity::Account;
use crate::shared::errors::ApiError;
use crate::shared::state::AppState;

/// Selects among the caller's organizations when the account belongs to
/// more than one.
pub const ORGANIZATION_HEADER: &str = "x-organization-id";

#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account: Account,
}

/// An authenticated caller resolved to a single tenant.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub account: Account,
    pub profile: Profile,
    pub organization_id: String,
}

impl TenantContext {
    pub fn is_admin(&self) -> bool {
        self.profile.role == ROLE_ADMIN
    }

    pub fn profile_id(&self) -> &str {
        &self.profile.id
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("administrator role required"))
        }
    }
}

fn resolve_account(parts: &Parts, state: &Arc<AppState>) -> Result<Account, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    let token = extract_bearer_token(header).ok_or(ApiError::Unauthorized)?;
    state.identity.verify_token(token).ok_or(ApiError::Unauthorized)
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedAccount {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let account = resolve_account(parts, state)?;
        Ok(AuthenticatedAccount { account })
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for TenantContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let account = resolve_account(parts, state)?;

        let mut memberships: Vec<Profile> = state
            .directory
            .list_profiles_for_account(&account.id)?
            .into_iter()
            .filter(|p| p.organization_id.is_some())
            .collect();

        let requested_org = parts
            .headers
            .get(ORGANIZATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let profile = match requested_org {
            Some(org_id) => memberships
                .into_iter()
                .find(|p| p.organization_id.as_deref() == Some(org_id.as_str()))
                .ok_or_else(|| {
                    ApiError::forbidden("caller has no profile in the requested organization")
                })?,
            None => {
                if memberships.is_empty() {
                    return Err(ApiError::forbidden(
                        "caller is not attached to an organization",
                    ));
                }
                // Deterministic default: the oldest membership.
                memberships.sort_by(|a, b| a.created_at.cmp(&b.created_at));
                memberships.remove(0)
            }
        };

        let organization_id = profile
            .organization_id
            .clone()
            .ok_or_else(|| ApiError::forbidden("caller is not attached to an organization"))?;

        Ok(TenantContext {
            account,
            profile,
            organization_id,
        })
    }
}
