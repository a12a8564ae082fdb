use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::errors::{ApiError, ApiResult};
use crate::shared::middleware::TenantContext;
use crate::shared::schema::{group_members, groups, profiles};
use crate::shared::state::AppState;

use super::profiles::Profile;
use super::DirectoryStore;

#[derive(Debug, Clone, Serialize, Queryable, Insertable)]
#[diesel(table_name = groups)]
pub struct Group {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = group_members)]
pub struct GroupMember {
    pub id: String,
    pub group_id: String,
    pub profile_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddGroupMemberRequest {
    pub profile_id: String,
}

fn group_in_org(
    conn: &mut SqliteConnection,
    organization_id: &str,
    group_id: &str,
) -> ApiResult<Group> {
    groups::table
        .filter(groups::id.eq(group_id))
        .filter(groups::organization_id.eq(organization_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("group"))
}

impl DirectoryStore {
    pub fn create_group(&self, organization_id: &str, req: &CreateGroupRequest) -> ApiResult<Group> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("group name is required"));
        }

        let group = Group {
            id: Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            name: name.to_string(),
            description: req.description.clone(),
            created_at: Utc::now(),
        };
        let mut conn = self.db()?;
        diesel::insert_into(groups::table)
            .values(&group)
            .execute(&mut conn)?;
        Ok(group)
    }

    pub fn list_groups(&self, organization_id: &str) -> ApiResult<Vec<(Group, i64)>> {
        let mut conn = self.db()?;
        let rows: Vec<Group> = groups::table
            .filter(groups::organization_id.eq(organization_id))
            .order(groups::name.asc())
            .load(&mut conn)?;

        let group_ids: Vec<&str> = rows.iter().map(|g| g.id.as_str()).collect();
        let memberships: Vec<String> = group_members::table
            .filter(group_members::group_id.eq_any(&group_ids))
            .select(group_members::group_id)
            .load(&mut conn)?;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for group_id in memberships {
            *counts.entry(group_id).or_insert(0) += 1;
        }

        Ok(rows
            .into_iter()
            .map(|group| {
                let count = counts.get(&group.id).copied().unwrap_or(0);
                (group, count)
            })
            .collect())
    }

    /// Remove a group together with its membership rows. Tickets are not
    /// touched: assignment history lives on the ticket itself.
    pub fn delete_group(&self, organization_id: &str, group_id: &str) -> ApiResult<bool> {
        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let exists: Option<String> = groups::table
                .filter(groups::id.eq(group_id))
                .filter(groups::organization_id.eq(organization_id))
                .select(groups::id)
                .first(conn)
                .optional()?;
            if exists.is_none() {
                return Ok(false);
            }

            diesel::delete(group_members::table.filter(group_members::group_id.eq(group_id)))
                .execute(conn)?;
            diesel::delete(groups::table.filter(groups::id.eq(group_id))).execute(conn)?;
            Ok(true)
        })
    }

    pub fn add_group_member(
        &self,
        organization_id: &str,
        group_id: &str,
        profile_id: &str,
    ) -> ApiResult<GroupMember> {
        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            group_in_org(conn, organization_id, group_id)?;

            let member: Option<String> = profiles::table
                .filter(profiles::id.eq(profile_id))
                .filter(profiles::organization_id.eq(organization_id))
                .select(profiles::id)
                .first(conn)
                .optional()?;
            if member.is_none() {
                return Err(ApiError::not_found("profile"));
            }

            let duplicate: Option<String> = group_members::table
                .filter(group_members::group_id.eq(group_id))
                .filter(group_members::profile_id.eq(profile_id))
                .select(group_members::id)
                .first(conn)
                .optional()?;
            if duplicate.is_some() {
                return Err(ApiError::Conflict(
                    "profile is already a member of this group".to_string(),
                ));
            }

            let membership = GroupMember {
                id: Uuid::new_v4().to_string(),
                group_id: group_id.to_string(),
                profile_id: profile_id.to_string(),
                created_at: Utc::now(),
            };
            diesel::insert_into(group_members::table)
                .values(&membership)
                .execute(conn)?;
            Ok(membership)
        })
    }

    pub fn remove_group_member(
        &self,
        organization_id: &str,
        group_id: &str,
        profile_id: &str,
    ) -> ApiResult<bool> {
        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            group_in_org(conn, organization_id, group_id)?;
            let removed = diesel::delete(
                group_members::table
                    .filter(group_members::group_id.eq(group_id))
                    .filter(group_members::profile_id.eq(profile_id)),
            )
            .execute(conn)?;
            Ok(removed > 0)
        })
    }

    pub fn list_group_members(
        &self,
        organization_id: &str,
        group_id: &str,
    ) -> ApiResult<Vec<Profile>> {
        let mut conn = self.db()?;
        group_in_org(&mut conn, organization_id, group_id)?;

        let member_ids: Vec<String> = group_members::table
            .filter(group_members::group_id.eq(group_id))
            .select(group_members::profile_id)
            .load(&mut conn)?;
        let members = profiles::table
            .filter(profiles::id.eq_any(&member_ids))
            .order(profiles::display_name.asc())
            .load(&mut conn)?;
        Ok(members)
    }
}

pub async fn create_group(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    ctx.require_admin()?;
    info!("creating group '{}' in {}", req.name, ctx.organization_id);
    let group = state.directory.create_group(&ctx.organization_id, &req)?;
    let response = GroupResponse {
        id: group.id,
        name: group.name,
        description: group.description,
        member_count: 0,
        created_at: group.created_at,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_groups(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
) -> Result<Json<Vec<GroupResponse>>, ApiError> {
    let groups = state.directory.list_groups(&ctx.organization_id)?;
    let response = groups
        .into_iter()
        .map(|(group, member_count)| GroupResponse {
            id: group.id,
            name: group.name,
            description: group.description,
            member_count,
            created_at: group.created_at,
        })
        .collect();
    Ok(Json(response))
}

pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.require_admin()?;
    if state.directory.delete_group(&ctx.organization_id, &id)? {
        info!("deleted group {} from {}", id, ctx.organization_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("group"))
    }
}

pub async fn add_group_member(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Json(req): Json<AddGroupMemberRequest>,
) -> Result<StatusCode, ApiError> {
    ctx.require_admin()?;
    state
        .directory
        .add_group_member(&ctx.organization_id, &id, &req.profile_id)?;
    Ok(StatusCode::CREATED)
}

pub async fn remove_group_member(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path((id, profile_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    ctx.require_admin()?;
    if state
        .directory
        .remove_group_member(&ctx.organization_id, &id, &profile_id)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("group member"))
    }
}

pub async fn list_group_members(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let members = state
        .directory
        .list_group_members(&ctx.organization_id, &id)?;
    Ok(Json(members))
}
