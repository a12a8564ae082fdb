use axum::{
    extract::{Path, Query, State},
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
use crate::shared::schema::{companies, contacts, tickets};
use crate::shared::state::AppState;

use super::DirectoryStore;

pub const CONTACT_STATUSES: [&str; 3] = ["active", "inactive", "archived"];

#[derive(Debug, Clone, Serialize, Queryable, Insertable)]
#[diesel(table_name = companies)]
pub struct Company {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub domain: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Queryable, Insertable)]
#[diesel(table_name = contacts)]
pub struct Contact {
    pub id: String,
    pub organization_id: String,
    pub company_id: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub domain: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub company_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "crate::shared::utils::double_option")]
    pub company_id: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactQuery {
    pub search: Option<String>,
    pub company_id: Option<String>,
    pub status: Option<String>,
}

fn validate_contact_status(status: &str) -> ApiResult<()> {
    if CONTACT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(ApiError::validation(
            "status must be active, inactive or archived",
        ))
    }
}

fn company_in_org(
    conn: &mut SqliteConnection,
    organization_id: &str,
    company_id: &str,
) -> ApiResult<()> {
    let exists: Option<String> = companies::table
        .filter(companies::id.eq(company_id))
        .filter(companies::organization_id.eq(organization_id))
        .select(companies::id)
        .first(conn)
        .optional()?;
    if exists.is_none() {
        return Err(ApiError::not_found("company"));
    }
    Ok(())
}

impl DirectoryStore {
    pub fn create_company(
        &self,
        organization_id: &str,
        req: &CreateCompanyRequest,
    ) -> ApiResult<Company> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("company name is required"));
        }

        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            name: name.to_string(),
            domain: req.domain.clone(),
            phone: req.phone.clone(),
            address: req.address.clone(),
            created_at: now,
            updated_at: now,
        };
        let mut conn = self.db()?;
        diesel::insert_into(companies::table)
            .values(&company)
            .execute(&mut conn)?;
        Ok(company)
    }

    pub fn get_company(
        &self,
        organization_id: &str,
        company_id: &str,
    ) -> ApiResult<Option<Company>> {
        let mut conn = self.db()?;
        let company = companies::table
            .filter(companies::id.eq(company_id))
            .filter(companies::organization_id.eq(organization_id))
            .first(&mut conn)
            .optional()?;
        Ok(company)
    }

    pub fn list_companies(&self, organization_id: &str) -> ApiResult<Vec<Company>> {
        let mut conn = self.db()?;
        let rows = companies::table
            .filter(companies::organization_id.eq(organization_id))
            .order(companies::name.asc())
            .load(&mut conn)?;
        Ok(rows)
    }

    pub fn update_company(
        &self,
        organization_id: &str,
        company_id: &str,
        req: &UpdateCompanyRequest,
    ) -> ApiResult<Company> {
        if let Some(name) = &req.name {
            if name.trim().is_empty() {
                return Err(ApiError::validation("company name is required"));
            }
        }

        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let current: Company = companies::table
                .filter(companies::id.eq(company_id))
                .filter(companies::organization_id.eq(organization_id))
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("company"))?;

            diesel::update(companies::table.filter(companies::id.eq(company_id)))
                .set((
                    companies::name.eq(req
                        .name
                        .as_deref()
                        .map(str::trim)
                        .unwrap_or(&current.name)),
                    companies::domain.eq(req.domain.clone().or(current.domain)),
                    companies::phone.eq(req.phone.clone().or(current.phone)),
                    companies::address.eq(req.address.clone().or(current.address)),
                    companies::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            let updated = companies::table
                .filter(companies::id.eq(company_id))
                .first(conn)?;
            Ok(updated)
        })
    }

    /// Remove a company. Its contacts stay, detached.
    pub fn delete_company(&self, organization_id: &str, company_id: &str) -> ApiResult<bool> {
        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let exists: Option<String> = companies::table
                .filter(companies::id.eq(company_id))
                .filter(companies::organization_id.eq(organization_id))
                .select(companies::id)
                .first(conn)
                .optional()?;
            if exists.is_none() {
                return Ok(false);
            }

            diesel::update(contacts::table.filter(contacts::company_id.eq(company_id)))
                .set(contacts::company_id.eq(None::<String>))
                .execute(conn)?;
            diesel::delete(companies::table.filter(companies::id.eq(company_id)))
                .execute(conn)?;
            Ok(true)
        })
    }

    pub fn create_contact(
        &self,
        organization_id: &str,
        req: &CreateContactRequest,
    ) -> ApiResult<Contact> {
        let first_name = req.first_name.trim();
        if first_name.is_empty() {
            return Err(ApiError::validation("contact first name is required"));
        }
        if let Some(email) = &req.email {
            if !email.contains('@') {
                return Err(ApiError::validation("contact email is not valid"));
            }
        }

        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            if let Some(company_id) = &req.company_id {
                company_in_org(conn, organization_id, company_id)?;
            }

            let now = Utc::now();
            let contact = Contact {
                id: Uuid::new_v4().to_string(),
                organization_id: organization_id.to_string(),
                company_id: req.company_id.clone(),
                first_name: first_name.to_string(),
                last_name: req.last_name.clone(),
                email: req.email.clone(),
                phone: req.phone.clone(),
                address: req.address.clone(),
                city: req.city.clone(),
                country: req.country.clone(),
                status: "active".to_string(),
                created_at: now,
                updated_at: now,
            };
            diesel::insert_into(contacts::table)
                .values(&contact)
                .execute(conn)?;
            Ok(contact)
        })
    }

    pub fn get_contact(
        &self,
        organization_id: &str,
        contact_id: &str,
    ) -> ApiResult<Option<Contact>> {
        let mut conn = self.db()?;
        let contact = contacts::table
            .filter(contacts::id.eq(contact_id))
            .filter(contacts::organization_id.eq(organization_id))
            .first(&mut conn)
            .optional()?;
        Ok(contact)
    }

    pub fn list_contacts(
        &self,
        organization_id: &str,
        query: &ContactQuery,
    ) -> ApiResult<Vec<Contact>> {
        let mut conn = self.db()?;
        let mut stmt = contacts::table
            .filter(contacts::organization_id.eq(organization_id))
            .into_boxed();

        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            stmt = stmt.filter(
                contacts::first_name
                    .like(pattern.clone())
                    .nullable()
                    .or(contacts::last_name.like(pattern.clone()))
                    .or(contacts::email.like(pattern)),
            );
        }
        if let Some(company_id) = &query.company_id {
            stmt = stmt.filter(contacts::company_id.eq(company_id));
        }
        if let Some(status) = &query.status {
            stmt = stmt.filter(contacts::status.eq(status));
        }

        let rows = stmt.order(contacts::created_at.desc()).load(&mut conn)?;
        Ok(rows)
    }

    pub fn update_contact(
        &self,
        organization_id: &str,
        contact_id: &str,
        req: &UpdateContactRequest,
    ) -> ApiResult<Contact> {
        if let Some(first_name) = &req.first_name {
            if first_name.trim().is_empty() {
                return Err(ApiError::validation("contact first name is required"));
            }
        }
        if let Some(status) = &req.status {
            validate_contact_status(status)?;
        }
        if let Some(email) = &req.email {
            if !email.contains('@') {
                return Err(ApiError::validation("contact email is not valid"));
            }
        }

        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let current: Contact = contacts::table
                .filter(contacts::id.eq(contact_id))
                .filter(contacts::organization_id.eq(organization_id))
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("contact"))?;

            let company_id = match &req.company_id {
                Some(Some(company_id)) => {
                    company_in_org(conn, organization_id, company_id)?;
                    Some(company_id.clone())
                }
                Some(None) => None,
                None => current.company_id.clone(),
            };

            diesel::update(contacts::table.filter(contacts::id.eq(contact_id)))
                .set((
                    contacts::first_name.eq(req
                        .first_name
                        .as_deref()
                        .map(str::trim)
                        .unwrap_or(&current.first_name)),
                    contacts::last_name.eq(req.last_name.clone().or(current.last_name)),
                    contacts::email.eq(req.email.clone().or(current.email)),
                    contacts::phone.eq(req.phone.clone().or(current.phone)),
                    contacts::address.eq(req.address.clone().or(current.address)),
                    contacts::city.eq(req.city.clone().or(current.city)),
                    contacts::country.eq(req.country.clone().or(current.country)),
                    contacts::status.eq(req.status.clone().unwrap_or(current.status)),
                    contacts::company_id.eq(company_id),
                    contacts::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            let updated = contacts::table
                .filter(contacts::id.eq(contact_id))
                .first(conn)?;
            Ok(updated)
        })
    }

    /// Remove a contact. Tickets raised by the contact stay, detached.
    pub fn delete_contact(&self, organization_id: &str, contact_id: &str) -> ApiResult<bool> {
        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let exists: Option<String> = contacts::table
                .filter(contacts::id.eq(contact_id))
                .filter(contacts::organization_id.eq(organization_id))
                .select(contacts::id)
                .first(conn)
                .optional()?;
            if exists.is_none() {
                return Ok(false);
            }

            diesel::update(tickets::table.filter(tickets::contact_id.eq(contact_id)))
                .set(tickets::contact_id.eq(None::<String>))
                .execute(conn)?;
            diesel::delete(contacts::table.filter(contacts::id.eq(contact_id)))
                .execute(conn)?;
            Ok(true)
        })
    }
}

pub async fn create_company(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Company>), ApiError> {
    let company = state.directory.create_company(&ctx.organization_id, &req)?;
    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn list_companies(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
) -> Result<Json<Vec<Company>>, ApiError> {
    let companies = state.directory.list_companies(&ctx.organization_id)?;
    Ok(Json(companies))
}

pub async fn get_company(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<Company>, ApiError> {
    let company = state
        .directory
        .get_company(&ctx.organization_id, &id)?
        .ok_or_else(|| ApiError::not_found("company"))?;
    Ok(Json(company))
}

pub async fn update_company(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateCompanyRequest>,
) -> Result<Json<Company>, ApiError> {
    let company = state
        .directory
        .update_company(&ctx.organization_id, &id, &req)?;
    Ok(Json(company))
}

pub async fn delete_company(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.require_admin()?;
    if state.directory.delete_company(&ctx.organization_id, &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("company"))
    }
}

pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Json(req): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    let contact = state.directory.create_contact(&ctx.organization_id, &req)?;
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Query(query): Query<ContactQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = state.directory.list_contacts(&ctx.organization_id, &query)?;
    Ok(Json(contacts))
}

pub async fn get_contact(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<Contact>, ApiError> {
    let contact = state
        .directory
        .get_contact(&ctx.organization_id, &id)?
        .ok_or_else(|| ApiError::not_found("contact"))?;
    Ok(Json(contact))
}

pub async fn update_contact(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateContactRequest>,
) -> Result<Json<Contact>, ApiError> {
    let contact = state
        .directory
        .update_contact(&ctx.organization_id, &id, &req)?;
    Ok(Json(contact))
}

pub async fn delete_contact(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.require_admin()?;
    if state.directory.delete_contact(&ctx.organization_id, &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("contact"))
    }
}
