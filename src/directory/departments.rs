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
use crate::shared::schema::{departments, profiles, tickets};
use crate::shared::state::AppState;

use super::DirectoryStore;

#[derive(Debug, Clone, Serialize, Queryable, Insertable)]
#[diesel(table_name = departments)]
pub struct Department {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub manager_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub manager_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDepartmentRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::shared::utils::double_option")]
    pub manager_id: Option<Option<String>>,
}

fn manager_in_org(
    conn: &mut SqliteConnection,
    organization_id: &str,
    manager_id: &str,
) -> ApiResult<()> {
    let exists: Option<String> = profiles::table
        .filter(profiles::id.eq(manager_id))
        .filter(profiles::organization_id.eq(organization_id))
        .select(profiles::id)
        .first(conn)
        .optional()?;
    if exists.is_none() {
        return Err(ApiError::not_found("profile"));
    }
    Ok(())
}

impl DirectoryStore {
    pub fn create_department(
        &self,
        organization_id: &str,
        req: &CreateDepartmentRequest,
    ) -> ApiResult<Department> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("department name is required"));
        }

        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            if let Some(manager_id) = &req.manager_id {
                manager_in_org(conn, organization_id, manager_id)?;
            }

            let now = Utc::now();
            let department = Department {
                id: Uuid::new_v4().to_string(),
                organization_id: organization_id.to_string(),
                name: name.to_string(),
                manager_id: req.manager_id.clone(),
                created_at: now,
                updated_at: now,
            };
            diesel::insert_into(departments::table)
                .values(&department)
                .execute(conn)?;
            Ok(department)
        })
    }

    pub fn get_department(
        &self,
        organization_id: &str,
        department_id: &str,
    ) -> ApiResult<Option<Department>> {
        let mut conn = self.db()?;
        let department = departments::table
            .filter(departments::id.eq(department_id))
            .filter(departments::organization_id.eq(organization_id))
            .first(&mut conn)
            .optional()?;
        Ok(department)
    }

    pub fn list_departments(&self, organization_id: &str) -> ApiResult<Vec<Department>> {
        let mut conn = self.db()?;
        let rows = departments::table
            .filter(departments::organization_id.eq(organization_id))
            .order(departments::name.asc())
            .load(&mut conn)?;
        Ok(rows)
    }

    pub fn update_department(
        &self,
        organization_id: &str,
        department_id: &str,
        req: &UpdateDepartmentRequest,
    ) -> ApiResult<Department> {
        if let Some(name) = &req.name {
            if name.trim().is_empty() {
                return Err(ApiError::validation("department name is required"));
            }
        }

        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let current: Department = departments::table
                .filter(departments::id.eq(department_id))
                .filter(departments::organization_id.eq(organization_id))
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("department"))?;

            let manager_id = match &req.manager_id {
                Some(Some(manager_id)) => {
                    manager_in_org(conn, organization_id, manager_id)?;
                    Some(manager_id.clone())
                }
                Some(None) => None,
                None => current.manager_id.clone(),
            };

            diesel::update(departments::table.filter(departments::id.eq(department_id)))
                .set((
                    departments::name.eq(req
                        .name
                        .as_deref()
                        .map(str::trim)
                        .unwrap_or(&current.name)),
                    departments::manager_id.eq(manager_id),
                    departments::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            let updated = departments::table
                .filter(departments::id.eq(department_id))
                .first(conn)?;
            Ok(updated)
        })
    }

    /// Remove a department. Tickets and profiles pointing at it are detached
    /// in the same transaction, never deleted with it.
    pub fn delete_department(
        &self,
        organization_id: &str,
        department_id: &str,
    ) -> ApiResult<bool> {
        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let exists: Option<String> = departments::table
                .filter(departments::id.eq(department_id))
                .filter(departments::organization_id.eq(organization_id))
                .select(departments::id)
                .first(conn)
                .optional()?;
            if exists.is_none() {
                return Ok(false);
            }

            diesel::update(tickets::table.filter(tickets::department_id.eq(department_id)))
                .set(tickets::department_id.eq(None::<String>))
                .execute(conn)?;
            diesel::update(profiles::table.filter(profiles::department_id.eq(department_id)))
                .set(profiles::department_id.eq(None::<String>))
                .execute(conn)?;
            diesel::delete(departments::table.filter(departments::id.eq(department_id)))
                .execute(conn)?;
            Ok(true)
        })
    }
}

pub async fn create_department(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Json(req): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<Department>), ApiError> {
    ctx.require_admin()?;
    let department = state
        .directory
        .create_department(&ctx.organization_id, &req)?;
    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn list_departments(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
) -> Result<Json<Vec<Department>>, ApiError> {
    let departments = state.directory.list_departments(&ctx.organization_id)?;
    Ok(Json(departments))
}

pub async fn get_department(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<Department>, ApiError> {
    let department = state
        .directory
        .get_department(&ctx.organization_id, &id)?
        .ok_or_else(|| ApiError::not_found("department"))?;
    Ok(Json(department))
}

pub async fn update_department(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateDepartmentRequest>,
) -> Result<Json<Department>, ApiError> {
    ctx.require_admin()?;
    let department = state
        .directory
        .update_department(&ctx.organization_id, &id, &req)?;
    Ok(Json(department))
}

pub async fn delete_department(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.require_admin()?;
    if state
        .directory
        .delete_department(&ctx.organization_id, &id)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("department"))
    }
}
