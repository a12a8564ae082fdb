use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::errors::{ApiError, ApiResult};
use crate::shared::middleware::{AuthenticatedAccount, TenantContext};
use crate::shared::schema::{organizations, profiles};
use crate::shared::state::AppState;

use super::profiles::{Profile, ROLE_ADMIN};
use super::DirectoryStore;

pub const SUBSCRIPTION_STATUSES: [&str; 3] = ["active", "suspended", "cancelled"];

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = organizations)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub subscription_status: String,
    pub max_seats: i32,
    pub max_tickets: i32,
    pub settings: String,
    pub assignment_policy: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Parse the settings blob; unknown or missing keys fall back to
    /// defaults so old rows keep reading cleanly.
    pub fn parsed_settings(&self) -> OrganizationSettings {
        serde_json::from_str(&self.settings).unwrap_or_default()
    }

    pub fn parsed_assignment_policy(&self) -> AssignmentPolicy {
        serde_json::from_str(&self.assignment_policy).unwrap_or_default()
    }
}

/// Recognized organization-level settings. A closed set on purpose: the
/// hosted variant of this schema stored a free-form blob here, which made
/// every consumer guess at keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationSettings {
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub support_email: Option<String>,
    #[serde(default = "default_priority")]
    pub default_ticket_priority: String,
}

fn default_priority() -> String {
    "medium".to_string()
}

impl Default for OrganizationSettings {
    fn default() -> Self {
        Self {
            time_zone: None,
            support_email: None,
            default_ticket_priority: default_priority(),
        }
    }
}

/// How tickets get assigned in this organization.
///
/// `method` is either "least-loaded" (the engine picks an agent) or
/// "manual" (auto-assign is disabled and always reports no candidate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentPolicy {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_agent_cap")]
    pub default_max_tickets_per_agent: i32,
    #[serde(default = "default_availability_control")]
    pub allow_agent_availability_control: bool,
}

fn default_method() -> String {
    "least-loaded".to_string()
}

fn default_agent_cap() -> i32 {
    10
}

fn default_availability_control() -> bool {
    true
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        Self {
            method: default_method(),
            default_max_tickets_per_agent: default_agent_cap(),
            allow_agent_availability_control: default_availability_control(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub id: String,
    pub name: String,
    pub subscription_status: String,
    pub max_seats: i32,
    pub max_tickets: i32,
    pub settings: OrganizationSettings,
    pub assignment_policy: AssignmentPolicy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Organization> for OrganizationResponse {
    fn from(org: Organization) -> Self {
        let settings = org.parsed_settings();
        let assignment_policy = org.parsed_assignment_policy();
        Self {
            id: org.id,
            name: org.name,
            subscription_status: org.subscription_status,
            max_seats: org.max_seats,
            max_tickets: org.max_tickets,
            settings,
            assignment_policy,
            created_at: org.created_at,
            updated_at: org.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: Option<String>,
    pub subscription_status: Option<String>,
    pub max_seats: Option<i32>,
    pub max_tickets: Option<i32>,
    pub settings: Option<OrganizationSettings>,
    pub assignment_policy: Option<AssignmentPolicy>,
}

fn blob(value: &impl Serialize) -> ApiResult<String> {
    serde_json::to_string(value)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to serialize settings: {e}")))
}

pub(crate) fn insert_organization(
    conn: &mut SqliteConnection,
    name: &str,
) -> ApiResult<Organization> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("organization name is required"));
    }
    let now = Utc::now();
    let organization = Organization {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        subscription_status: "active".to_string(),
        max_seats: 25,
        max_tickets: 10000,
        settings: blob(&OrganizationSettings::default())?,
        assignment_policy: blob(&AssignmentPolicy::default())?,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(organizations::table)
        .values(&organization)
        .execute(conn)?;
    Ok(organization)
}

impl DirectoryStore {
    /// Create an organization for an existing account. A bare profile, if the
    /// account has one, becomes the organization's admin profile; otherwise a
    /// fresh admin profile is created.
    pub fn create_organization(
        &self,
        account_id: &str,
        name: &str,
    ) -> ApiResult<(Organization, Profile)> {
        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let organization = insert_organization(conn, name)?;

            let bare: Option<Profile> = profiles::table
                .filter(profiles::account_id.eq(account_id))
                .filter(profiles::organization_id.is_null())
                .first(conn)
                .optional()?;

            let profile = match bare {
                Some(profile) => {
                    diesel::update(profiles::table.filter(profiles::id.eq(&profile.id)))
                        .set((
                            profiles::organization_id.eq(&organization.id),
                            profiles::role.eq(ROLE_ADMIN),
                            profiles::updated_at.eq(Utc::now()),
                        ))
                        .execute(conn)?;
                    profiles::table
                        .filter(profiles::id.eq(&profile.id))
                        .first(conn)?
                }
                None => {
                    let display_name: String = {
                        use crate::shared::schema::accounts;
                        let email: String = accounts::table
                            .filter(accounts::id.eq(account_id))
                            .select(accounts::email)
                            .first(conn)
                            .optional()?
                            .ok_or_else(|| ApiError::not_found("account"))?;
                        email.split('@').next().unwrap_or("admin").to_string()
                    };
                    super::profiles::insert_profile(
                        conn,
                        account_id,
                        Some(&organization.id),
                        ROLE_ADMIN,
                        &display_name,
                    )?
                }
            };

            Ok((organization, profile))
        })
    }

    pub fn get_organization(&self, organization_id: &str) -> ApiResult<Option<Organization>> {
        let mut conn = self.db()?;
        let organization = organizations::table
            .filter(organizations::id.eq(organization_id))
            .first(&mut conn)
            .optional()?;
        Ok(organization)
    }

    pub fn list_organizations_for_account(
        &self,
        account_id: &str,
    ) -> ApiResult<Vec<Organization>> {
        let mut conn = self.db()?;
        let org_ids: Vec<Option<String>> = profiles::table
            .filter(profiles::account_id.eq(account_id))
            .select(profiles::organization_id)
            .load(&mut conn)?;
        let org_ids: Vec<String> = org_ids.into_iter().flatten().collect();

        let organizations = organizations::table
            .filter(organizations::id.eq_any(&org_ids))
            .order(organizations::created_at.asc())
            .load(&mut conn)?;
        Ok(organizations)
    }

    pub fn update_organization(
        &self,
        organization_id: &str,
        req: &UpdateOrganizationRequest,
    ) -> ApiResult<Organization> {
        if let Some(status) = &req.subscription_status {
            if !SUBSCRIPTION_STATUSES.contains(&status.as_str()) {
                return Err(ApiError::validation("unknown subscription status"));
            }
        }
        if let Some(name) = &req.name {
            if name.trim().is_empty() {
                return Err(ApiError::validation("organization name is required"));
            }
        }

        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let current: Organization = organizations::table
                .filter(organizations::id.eq(organization_id))
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("organization"))?;

            let settings = match &req.settings {
                Some(s) => blob(s)?,
                None => current.settings.clone(),
            };
            let assignment_policy = match &req.assignment_policy {
                Some(p) => blob(p)?,
                None => current.assignment_policy.clone(),
            };

            diesel::update(organizations::table.filter(organizations::id.eq(organization_id)))
                .set((
                    organizations::name.eq(req.name.clone().unwrap_or(current.name)),
                    organizations::subscription_status.eq(req
                        .subscription_status
                        .clone()
                        .unwrap_or(current.subscription_status)),
                    organizations::max_seats.eq(req.max_seats.unwrap_or(current.max_seats)),
                    organizations::max_tickets.eq(req.max_tickets.unwrap_or(current.max_tickets)),
                    organizations::settings.eq(settings),
                    organizations::assignment_policy.eq(assignment_policy),
                    organizations::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            let updated = organizations::table
                .filter(organizations::id.eq(organization_id))
                .first(conn)?;
            Ok(updated)
        })
    }

}

pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedAccount,
    Json(req): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<OrganizationResponse>), ApiError> {
    let (organization, _profile) = state
        .directory
        .create_organization(&auth.account.id, &req.name)?;
    Ok((StatusCode::CREATED, Json(organization.into())))
}

pub async fn list_organizations(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedAccount,
) -> Result<Json<Vec<OrganizationResponse>>, ApiError> {
    let organizations = state
        .directory
        .list_organizations_for_account(&auth.account.id)?;
    Ok(Json(organizations.into_iter().map(Into::into).collect()))
}

pub async fn get_organization(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedAccount,
    Path(id): Path<String>,
) -> Result<Json<OrganizationResponse>, ApiError> {
    // Membership check first: an organization the caller does not belong to
    // is indistinguishable from one that does not exist.
    let member = state
        .directory
        .list_profiles_for_account(&auth.account.id)?
        .into_iter()
        .any(|p| p.organization_id.as_deref() == Some(id.as_str()));
    if !member {
        return Err(ApiError::not_found("organization"));
    }

    let organization = state
        .directory
        .get_organization(&id)?
        .ok_or_else(|| ApiError::not_found("organization"))?;
    Ok(Json(organization.into()))
}

pub async fn update_organization(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrganizationRequest>,
) -> Result<Json<OrganizationResponse>, ApiError> {
    ctx.require_admin()?;
    if ctx.organization_id != id {
        return Err(ApiError::not_found("organization"));
    }
    let organization = state.directory.update_organization(&id, &req)?;
    Ok(Json(organization.into()))
}
