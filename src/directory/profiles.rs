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
use crate::shared::middleware::TenantContext;
use crate::shared::schema::{accounts, agent_availability, departments, profiles};
use crate::shared::state::AppState;

use super::DirectoryStore;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_AGENT: &str = "agent";
pub const ROLE_VIEWER: &str = "viewer";

pub const ROLES: [&str; 3] = [ROLE_ADMIN, ROLE_AGENT, ROLE_VIEWER];

/// Roles that can hold ticket assignments.
pub const AGENT_CAPABLE_ROLES: [&str; 2] = [ROLE_ADMIN, ROLE_AGENT];

fn validate_role(role: &str) -> ApiResult<()> {
    if ROLES.contains(&role) {
        Ok(())
    } else {
        Err(ApiError::validation("role must be admin, agent or viewer"))
    }
}

/// Membership of one account in one organization. An account holds at most
/// one profile per organization; a profile with no organization is the
/// holding state between registration and joining a tenant.
#[derive(Debug, Clone, Serialize, Queryable, Insertable)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: String,
    pub account_id: String,
    pub organization_id: Option<String>,
    pub department_id: Option<String>,
    pub role: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = agent_availability)]
pub struct AgentAvailability {
    pub profile_id: String,
    pub organization_id: String,
    pub is_available: bool,
    pub max_tickets: i32,
    pub updated_at: DateTime<Utc>,
}

/// Effective availability for a profile. Profiles without a stored row
/// report the organization defaults.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub profile_id: String,
    pub is_available: bool,
    pub max_tickets: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub account_id: String,
    pub role: String,
    pub display_name: String,
    pub department_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub role: Option<String>,
    /// Absent means leave unchanged, explicit null clears the department.
    #[serde(default, deserialize_with = "crate::shared::utils::double_option")]
    pub department_id: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct SetAvailabilityRequest {
    pub is_available: bool,
    pub max_tickets: Option<i32>,
}

pub(crate) fn insert_profile(
    conn: &mut SqliteConnection,
    account_id: &str,
    organization_id: Option<&str>,
    role: &str,
    display_name: &str,
) -> ApiResult<Profile> {
    let now = Utc::now();
    let profile = Profile {
        id: Uuid::new_v4().to_string(),
        account_id: account_id.to_string(),
        organization_id: organization_id.map(str::to_string),
        department_id: None,
        role: role.to_string(),
        display_name: display_name.to_string(),
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(profiles::table)
        .values(&profile)
        .execute(conn)?;
    Ok(profile)
}

fn department_in_org(
    conn: &mut SqliteConnection,
    organization_id: &str,
    department_id: &str,
) -> ApiResult<()> {
    let exists: Option<String> = departments::table
        .filter(departments::id.eq(department_id))
        .filter(departments::organization_id.eq(organization_id))
        .select(departments::id)
        .first(conn)
        .optional()?;
    if exists.is_none() {
        return Err(ApiError::not_found("department"));
    }
    Ok(())
}

impl DirectoryStore {
    /// Add an account to an organization. An unattached profile left over
    /// from registration is adopted in place, so the account does not end up
    /// with both a bare and an attached row.
    pub fn create_profile(
        &self,
        organization_id: &str,
        req: &CreateProfileRequest,
    ) -> ApiResult<Profile> {
        validate_role(&req.role)?;
        let display_name = req.display_name.trim();
        if display_name.is_empty() {
            return Err(ApiError::validation("display name is required"));
        }

        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let account_exists: Option<String> = accounts::table
                .filter(accounts::id.eq(&req.account_id))
                .select(accounts::id)
                .first(conn)
                .optional()?;
            if account_exists.is_none() {
                return Err(ApiError::not_found("account"));
            }

            let duplicate: Option<String> = profiles::table
                .filter(profiles::account_id.eq(&req.account_id))
                .filter(profiles::organization_id.eq(organization_id))
                .select(profiles::id)
                .first(conn)
                .optional()?;
            if duplicate.is_some() {
                return Err(ApiError::Conflict(
                    "account already has a profile in this organization".to_string(),
                ));
            }

            if let Some(department_id) = &req.department_id {
                department_in_org(conn, organization_id, department_id)?;
            }

            let bare: Option<Profile> = profiles::table
                .filter(profiles::account_id.eq(&req.account_id))
                .filter(profiles::organization_id.is_null())
                .first(conn)
                .optional()?;

            let profile_id = match bare {
                Some(profile) => {
                    diesel::update(profiles::table.filter(profiles::id.eq(&profile.id)))
                        .set((
                            profiles::organization_id.eq(organization_id),
                            profiles::role.eq(&req.role),
                            profiles::display_name.eq(display_name),
                            profiles::department_id.eq(&req.department_id),
                            profiles::updated_at.eq(Utc::now()),
                        ))
                        .execute(conn)?;
                    profile.id
                }
                None => {
                    let profile = insert_profile(
                        conn,
                        &req.account_id,
                        Some(organization_id),
                        &req.role,
                        display_name,
                    )?;
                    if let Some(department_id) = &req.department_id {
                        diesel::update(profiles::table.filter(profiles::id.eq(&profile.id)))
                            .set(profiles::department_id.eq(department_id))
                            .execute(conn)?;
                    }
                    profile.id
                }
            };

            let profile = profiles::table
                .filter(profiles::id.eq(&profile_id))
                .first(conn)?;
            Ok(profile)
        })
    }

    pub fn get_profile(
        &self,
        organization_id: &str,
        profile_id: &str,
    ) -> ApiResult<Option<Profile>> {
        let mut conn = self.db()?;
        let profile = profiles::table
            .filter(profiles::id.eq(profile_id))
            .filter(profiles::organization_id.eq(organization_id))
            .first(&mut conn)
            .optional()?;
        Ok(profile)
    }

    pub fn list_profiles(&self, organization_id: &str) -> ApiResult<Vec<Profile>> {
        let mut conn = self.db()?;
        let rows = profiles::table
            .filter(profiles::organization_id.eq(organization_id))
            .order(profiles::created_at.asc())
            .load(&mut conn)?;
        Ok(rows)
    }

    pub fn list_profiles_for_account(&self, account_id: &str) -> ApiResult<Vec<Profile>> {
        let mut conn = self.db()?;
        let rows = profiles::table
            .filter(profiles::account_id.eq(account_id))
            .order(profiles::created_at.asc())
            .load(&mut conn)?;
        Ok(rows)
    }

    pub fn update_profile(
        &self,
        organization_id: &str,
        profile_id: &str,
        req: &UpdateProfileRequest,
    ) -> ApiResult<Profile> {
        if let Some(role) = &req.role {
            validate_role(role)?;
        }
        if let Some(display_name) = &req.display_name {
            if display_name.trim().is_empty() {
                return Err(ApiError::validation("display name is required"));
            }
        }

        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let current: Profile = profiles::table
                .filter(profiles::id.eq(profile_id))
                .filter(profiles::organization_id.eq(organization_id))
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("profile"))?;

            let department_id = match &req.department_id {
                Some(Some(department_id)) => {
                    department_in_org(conn, organization_id, department_id)?;
                    Some(department_id.clone())
                }
                Some(None) => None,
                None => current.department_id.clone(),
            };

            diesel::update(profiles::table.filter(profiles::id.eq(profile_id)))
                .set((
                    profiles::display_name.eq(req
                        .display_name
                        .as_deref()
                        .map(str::trim)
                        .unwrap_or(&current.display_name)),
                    profiles::role.eq(req.role.as_deref().unwrap_or(&current.role)),
                    profiles::department_id.eq(department_id),
                    profiles::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            let updated = profiles::table
                .filter(profiles::id.eq(profile_id))
                .first(conn)?;
            Ok(updated)
        })
    }

    pub fn get_availability(
        &self,
        organization_id: &str,
        profile_id: &str,
    ) -> ApiResult<AvailabilityResponse> {
        let mut conn = self.db()?;

        let member: Option<String> = profiles::table
            .filter(profiles::id.eq(profile_id))
            .filter(profiles::organization_id.eq(organization_id))
            .select(profiles::id)
            .first(&mut conn)
            .optional()?;
        if member.is_none() {
            return Err(ApiError::not_found("profile"));
        }

        let stored: Option<AgentAvailability> = agent_availability::table
            .filter(agent_availability::profile_id.eq(profile_id))
            .first(&mut conn)
            .optional()?;

        match stored {
            Some(row) => Ok(AvailabilityResponse {
                profile_id: row.profile_id,
                is_available: row.is_available,
                max_tickets: row.max_tickets,
            }),
            None => {
                let organization = self
                    .get_organization(organization_id)?
                    .ok_or_else(|| ApiError::not_found("organization"))?;
                let policy = organization.parsed_assignment_policy();
                Ok(AvailabilityResponse {
                    profile_id: profile_id.to_string(),
                    is_available: true,
                    max_tickets: policy.default_max_tickets_per_agent,
                })
            }
        }
    }

    /// Store an explicit availability record. Non-admin callers may only set
    /// their own, and only while the organization policy allows it.
    pub fn set_availability(
        &self,
        organization_id: &str,
        caller_profile_id: &str,
        caller_is_admin: bool,
        target_profile_id: &str,
        req: &SetAvailabilityRequest,
    ) -> ApiResult<AvailabilityResponse> {
        if let Some(max_tickets) = req.max_tickets {
            if max_tickets < 0 {
                return Err(ApiError::validation("max_tickets must be zero or more"));
            }
        }

        let mut conn = self.db()?;
        let row = conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let member: Option<String> = profiles::table
                .filter(profiles::id.eq(target_profile_id))
                .filter(profiles::organization_id.eq(organization_id))
                .select(profiles::id)
                .first(conn)
                .optional()?;
            if member.is_none() {
                return Err(ApiError::not_found("profile"));
            }

            let organization: super::Organization = {
                use crate::shared::schema::organizations;
                organizations::table
                    .filter(organizations::id.eq(organization_id))
                    .first(conn)
                    .optional()?
                    .ok_or_else(|| ApiError::not_found("organization"))?
            };
            let policy = organization.parsed_assignment_policy();

            if !caller_is_admin {
                if caller_profile_id != target_profile_id {
                    return Err(ApiError::forbidden(
                        "agents may only change their own availability",
                    ));
                }
                if !policy.allow_agent_availability_control {
                    return Err(ApiError::forbidden(
                        "availability is managed by administrators in this organization",
                    ));
                }
            }

            let existing: Option<AgentAvailability> = agent_availability::table
                .filter(agent_availability::profile_id.eq(target_profile_id))
                .first(conn)
                .optional()?;
            let max_tickets = req
                .max_tickets
                .or(existing.map(|row| row.max_tickets))
                .unwrap_or(policy.default_max_tickets_per_agent);

            let record = AgentAvailability {
                profile_id: target_profile_id.to_string(),
                organization_id: organization_id.to_string(),
                is_available: req.is_available,
                max_tickets,
                updated_at: Utc::now(),
            };
            diesel::insert_into(agent_availability::table)
                .values(&record)
                .on_conflict(agent_availability::profile_id)
                .do_update()
                .set((
                    agent_availability::is_available.eq(record.is_available),
                    agent_availability::max_tickets.eq(record.max_tickets),
                    agent_availability::updated_at.eq(record.updated_at),
                ))
                .execute(conn)?;
            Ok(record)
        })?;

        Ok(AvailabilityResponse {
            profile_id: row.profile_id,
            is_available: row.is_available,
            max_tickets: row.max_tickets,
        })
    }
}

pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Json(req): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    ctx.require_admin()?;
    let profile = state.directory.create_profile(&ctx.organization_id, &req)?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let profiles = state.directory.list_profiles(&ctx.organization_id)?;
    Ok(Json(profiles))
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state
        .directory
        .get_profile(&ctx.organization_id, &id)?
        .ok_or_else(|| ApiError::not_found("profile"))?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    ctx.require_admin()?;
    let profile = state
        .directory
        .update_profile(&ctx.organization_id, &id, &req)?;
    Ok(Json(profile))
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let availability = state.directory.get_availability(&ctx.organization_id, &id)?;
    Ok(Json(availability))
}

pub async fn set_availability(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Json(req): Json<SetAvailabilityRequest>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let availability = state.directory.set_availability(
        &ctx.organization_id,
        ctx.profile_id(),
        ctx.is_admin(),
        &id,
        &req,
    )?;
    Ok(Json(availability))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_role() {
        assert!(validate_role("admin").is_ok());
        assert!(validate_role("agent").is_ok());
        assert!(validate_role("viewer").is_ok());
        assert!(validate_role("owner").is_err());
    }

    #[test]
    fn department_patch_distinguishes_absent_from_null() {
        let absent: UpdateProfileRequest = serde_json::from_str(r#"{"role":"agent"}"#).unwrap();
        assert!(absent.department_id.is_none());

        let cleared: UpdateProfileRequest =
            serde_json::from_str(r#"{"department_id":null}"#).unwrap();
        assert_eq!(cleared.department_id, Some(None));

        let set: UpdateProfileRequest =
            serde_json::from_str(r#"{"department_id":"dep-1"}"#).unwrap();
        assert_eq!(set.department_id, Some(Some("dep-1".to_string())));
    }
}
