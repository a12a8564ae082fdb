//! Identity store: account credentials and session tokens.
//!
//! Registration optionally bootstraps an organization; the account itself is
//! tenant-free and never deleted, only deactivated.

pub mod password;
pub mod tokens;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::directory::organizations::insert_organization;
use crate::directory::profiles::{insert_profile, ROLE_ADMIN, ROLE_AGENT};
use crate::directory::Profile;
use crate::shared::errors::{ApiError, ApiResult};
use crate::shared::middleware::AuthenticatedAccount;
use crate::shared::schema::accounts;
use crate::shared::state::AppState;
use crate::shared::utils::{DbConn, DbPool};
use tokens::TokenManager;

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = accounts)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub is_confirmed: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub is_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            is_confirmed: account.is_confirmed,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub organization_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub account: AccountResponse,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub account: AccountResponse,
    pub profiles: Vec<Profile>,
}

pub struct IdentityService {
    conn: DbPool,
    tokens: TokenManager,
}

impl IdentityService {
    pub fn new(conn: DbPool, tokens: TokenManager) -> Self {
        Self { conn, tokens }
    }

    fn db(&self) -> ApiResult<DbConn> {
        self.conn
            .get()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("connection pool: {e}")))
    }

    /// Create an account and issue a session token. With an organization
    /// name the caller becomes that organization's admin; without one a bare
    /// agent profile is created and the caller joins an organization later.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        organization_name: Option<&str>,
    ) -> ApiResult<(Account, String)> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::validation("a valid email address is required"));
        }
        if password.len() < 8 {
            return Err(ApiError::validation(
                "password must be at least 8 characters",
            ));
        }

        // Slow by design; keep it outside the write transaction.
        let password_hash = password::hash_password(password)?;
        let display_name = email
            .split('@')
            .next()
            .unwrap_or(email.as_str())
            .to_string();

        let mut conn = self.db()?;
        let account = conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let existing: Option<String> = accounts::table
                .filter(accounts::email.eq(&email))
                .select(accounts::id)
                .first(conn)
                .optional()?;
            if existing.is_some() {
                return Err(ApiError::Conflict(
                    "an account with this email already exists".to_string(),
                ));
            }

            let account = Account {
                id: Uuid::new_v4().to_string(),
                email: email.clone(),
                password_hash: password_hash.clone(),
                is_confirmed: false,
                is_active: true,
                created_at: Utc::now(),
            };
            diesel::insert_into(accounts::table)
                .values(&account)
                .execute(conn)?;

            match organization_name {
                Some(org_name) => {
                    let organization = insert_organization(conn, org_name)?;
                    insert_profile(
                        conn,
                        &account.id,
                        Some(&organization.id),
                        ROLE_ADMIN,
                        &display_name,
                    )?;
                }
                None => {
                    insert_profile(conn, &account.id, None, ROLE_AGENT, &display_name)?;
                }
            }

            Ok(account)
        })?;

        let token = self.tokens.issue(&account.id, &account.email)?;
        Ok((account, token))
    }

    /// Unknown email and wrong password produce the same generic error so
    /// the endpoint cannot be used to enumerate accounts.
    pub fn login(&self, email: &str, password: &str) -> ApiResult<(Account, String)> {
        let email = email.trim().to_lowercase();
        let mut conn = self.db()?;

        let account: Option<Account> = accounts::table
            .filter(accounts::email.eq(&email))
            .first(&mut conn)
            .optional()?;

        let account = account.ok_or(ApiError::Unauthorized)?;
        if !account.is_active {
            return Err(ApiError::Unauthorized);
        }
        if !password::verify_password(password, &account.password_hash)? {
            return Err(ApiError::Unauthorized);
        }

        let token = self.tokens.issue(&account.id, &account.email)?;
        Ok((account, token))
    }

    /// None on any validation failure; callers treat None as
    /// "unauthenticated", never as a crash.
    pub fn verify_token(&self, token: &str) -> Option<Account> {
        let claims = self.tokens.verify(token)?;
        let mut conn = self.db().ok()?;

        let account: Account = accounts::table
            .filter(accounts::id.eq(&claims.sub))
            .first(&mut conn)
            .optional()
            .ok()??;

        if !account.is_active {
            return None;
        }
        Some(account)
    }

    pub fn get_account(&self, account_id: &str) -> ApiResult<Option<Account>> {
        let mut conn = self.db()?;
        let account = accounts::table
            .filter(accounts::id.eq(account_id))
            .first(&mut conn)
            .optional()?;
        Ok(account)
    }

    /// Deactivation is the only way out; accounts are never deleted because
    /// tickets and comments keep referencing their profiles.
    pub fn deactivate_account(&self, account_id: &str) -> ApiResult<()> {
        let mut conn = self.db()?;
        let updated = diesel::update(accounts::table.filter(accounts::id.eq(account_id)))
            .set(accounts::is_active.eq(false))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(ApiError::not_found("account"));
        }
        Ok(())
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (account, token) =
        state
            .identity
            .register(&req.email, &req.password, req.organization_name.as_deref())?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            account: account.into(),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (account, token) = state.identity.login(&req.email, &req.password)?;
    Ok(Json(AuthResponse {
        account: account.into(),
        token,
    }))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedAccount,
) -> Result<Json<MeResponse>, ApiError> {
    let profiles = state
        .directory
        .list_profiles_for_account(&auth.account.id)?;
    Ok(Json(MeResponse {
        account: auth.account.into(),
        profiles,
    }))
}

pub async fn deactivate(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedAccount,
) -> Result<StatusCode, ApiError> {
    state.identity.deactivate_account(&auth.account.id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_identity_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/deactivate", post(deactivate))
}
