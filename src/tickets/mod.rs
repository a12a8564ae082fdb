//! Ticket store: lifecycle, comments and per-organization numbering.

pub mod assignment;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::errors::{ApiError, ApiResult};
use crate::shared::middleware::TenantContext;
use crate::shared::schema::{contacts, departments, organizations, profiles, ticket_comments, tickets};
use crate::shared::state::AppState;
use crate::shared::utils::{DbConn, DbPool};

pub const TICKET_STATUSES: [&str; 5] = ["open", "in-progress", "pending", "resolved", "closed"];
pub const TICKET_PRIORITIES: [&str; 4] = ["low", "medium", "high", "urgent"];

/// Statuses that count against an agent's workload cap.
pub const ACTIVE_STATUSES: [&str; 3] = ["open", "in-progress", "pending"];

fn validate_status(status: &str) -> ApiResult<()> {
    if TICKET_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(ApiError::validation(
            "status must be open, in-progress, pending, resolved or closed",
        ))
    }
}

fn validate_priority(priority: &str) -> ApiResult<()> {
    if TICKET_PRIORITIES.contains(&priority) {
        Ok(())
    } else {
        Err(ApiError::validation(
            "priority must be low, medium, high or urgent",
        ))
    }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = tickets)]
pub struct Ticket {
    pub id: String,
    pub organization_id: String,
    pub ticket_number: String,
    pub subject: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub assigned_to: Option<String>,
    pub department_id: Option<String>,
    pub contact_id: Option<String>,
    pub tags: String,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Queryable, Insertable)]
#[diesel(table_name = ticket_comments)]
pub struct TicketComment {
    pub id: String,
    pub ticket_id: String,
    pub author_id: Option<String>,
    pub content: String,
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
}

/// Wire shape of a ticket. Tags are stored as a JSON blob and exposed as a
/// proper array.
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: String,
    pub organization_id: String,
    pub ticket_number: String,
    pub subject: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub assigned_to: Option<String>,
    pub department_id: Option<String>,
    pub contact_id: Option<String>,
    pub tags: Vec<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        let tags = serde_json::from_str(&ticket.tags).unwrap_or_default();
        Self {
            id: ticket.id,
            organization_id: ticket.organization_id,
            ticket_number: ticket.ticket_number,
            subject: ticket.subject,
            description: ticket.description,
            status: ticket.status,
            priority: ticket.priority,
            assigned_to: ticket.assigned_to,
            department_id: ticket.department_id,
            contact_id: ticket.contact_id,
            tags,
            resolved_at: ticket.resolved_at,
            closed_at: ticket.closed_at,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketDetailResponse {
    #[serde(flatten)]
    pub ticket: TicketResponse,
    pub assignee_name: Option<String>,
    pub contact_name: Option<String>,
    pub comments: Vec<TicketComment>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub department_id: Option<String>,
    pub contact_id: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTicketRequest {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "crate::shared::utils::double_option")]
    pub department_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::shared::utils::double_option")]
    pub contact_id: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    pub is_internal: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TicketQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    pub department_id: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CommentQuery {
    pub include_internal: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct TicketStats {
    pub total_tickets: i64,
    pub open_tickets: i64,
    pub in_progress_tickets: i64,
    pub pending_tickets: i64,
    pub resolved_tickets: i64,
    pub closed_tickets: i64,
    pub unassigned_tickets: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteTicketResponse {
    pub deleted: bool,
}

pub(crate) fn insert_comment(
    conn: &mut SqliteConnection,
    ticket_id: &str,
    author_id: Option<&str>,
    content: &str,
    is_internal: bool,
) -> ApiResult<TicketComment> {
    let comment = TicketComment {
        id: Uuid::new_v4().to_string(),
        ticket_id: ticket_id.to_string(),
        author_id: author_id.map(str::to_string),
        content: content.to_string(),
        is_internal,
        created_at: Utc::now(),
    };
    diesel::insert_into(ticket_comments::table)
        .values(&comment)
        .execute(conn)?;
    Ok(comment)
}

/// Next ticket number for the tenant: one past the highest number currently
/// on file. Zero-padding keeps the lexicographic MAX equal to the numeric
/// max, so this stays collision-free even after deletes punch holes in the
/// sequence (a row count would not).
fn next_ticket_number(conn: &mut SqliteConnection, organization_id: &str) -> ApiResult<String> {
    let latest: Option<String> = tickets::table
        .filter(tickets::organization_id.eq(organization_id))
        .select(diesel::dsl::max(tickets::ticket_number))
        .first(conn)?;
    let next = latest
        .as_deref()
        .and_then(|number| number.strip_prefix("TKT-"))
        .and_then(|digits| digits.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    Ok(format!("TKT-{next:06}"))
}

pub struct TicketStore {
    conn: DbPool,
}

impl TicketStore {
    pub fn new(conn: DbPool) -> Self {
        Self { conn }
    }

    pub(crate) fn db(&self) -> ApiResult<DbConn> {
        self.conn
            .get()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("connection pool: {e}")))
    }

    /// Create a ticket. The number is derived from the tenant's highest
    /// existing number inside the same write transaction, so two concurrent
    /// creates cannot observe the same high-water mark.
    pub fn create_ticket(
        &self,
        organization_id: &str,
        req: &CreateTicketRequest,
    ) -> ApiResult<Ticket> {
        let subject = req.subject.trim();
        if subject.is_empty() {
            return Err(ApiError::validation("ticket subject is required"));
        }
        if let Some(priority) = &req.priority {
            validate_priority(priority)?;
        }

        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let organization: crate::directory::Organization = organizations::table
                .filter(organizations::id.eq(organization_id))
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("organization"))?;

            if let Some(department_id) = &req.department_id {
                let exists: Option<String> = departments::table
                    .filter(departments::id.eq(department_id))
                    .filter(departments::organization_id.eq(organization_id))
                    .select(departments::id)
                    .first(conn)
                    .optional()?;
                if exists.is_none() {
                    return Err(ApiError::not_found("department"));
                }
            }
            if let Some(contact_id) = &req.contact_id {
                let exists: Option<String> = contacts::table
                    .filter(contacts::id.eq(contact_id))
                    .filter(contacts::organization_id.eq(organization_id))
                    .select(contacts::id)
                    .first(conn)
                    .optional()?;
                if exists.is_none() {
                    return Err(ApiError::not_found("contact"));
                }
            }

            let priority = match &req.priority {
                Some(priority) => priority.clone(),
                None => organization.parsed_settings().default_ticket_priority,
            };
            let tags = serde_json::to_string(req.tags.as_deref().unwrap_or_default())
                .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to serialize tags: {e}")))?;

            let now = Utc::now();
            let ticket = Ticket {
                id: Uuid::new_v4().to_string(),
                organization_id: organization_id.to_string(),
                ticket_number: next_ticket_number(conn, organization_id)?,
                subject: subject.to_string(),
                description: req.description.clone(),
                status: "open".to_string(),
                priority,
                assigned_to: None,
                department_id: req.department_id.clone(),
                contact_id: req.contact_id.clone(),
                tags,
                resolved_at: None,
                closed_at: None,
                created_at: now,
                updated_at: now,
            };
            diesel::insert_into(tickets::table)
                .values(&ticket)
                .execute(conn)?;
            Ok(ticket)
        })
    }

    pub fn get_ticket(&self, organization_id: &str, ticket_id: &str) -> ApiResult<Option<Ticket>> {
        let mut conn = self.db()?;
        let ticket = tickets::table
            .filter(tickets::id.eq(ticket_id))
            .filter(tickets::organization_id.eq(organization_id))
            .first(&mut conn)
            .optional()?;
        Ok(ticket)
    }

    pub fn get_ticket_detail(
        &self,
        organization_id: &str,
        ticket_id: &str,
    ) -> ApiResult<Option<TicketDetailResponse>> {
        let mut conn = self.db()?;
        let ticket: Option<Ticket> = tickets::table
            .filter(tickets::id.eq(ticket_id))
            .filter(tickets::organization_id.eq(organization_id))
            .first(&mut conn)
            .optional()?;
        let Some(ticket) = ticket else {
            return Ok(None);
        };

        let assignee_name: Option<String> = match &ticket.assigned_to {
            Some(profile_id) => profiles::table
                .filter(profiles::id.eq(profile_id))
                .select(profiles::display_name)
                .first(&mut conn)
                .optional()?,
            None => None,
        };
        let contact_name: Option<String> = match &ticket.contact_id {
            Some(contact_id) => {
                let row: Option<(String, Option<String>)> = contacts::table
                    .filter(contacts::id.eq(contact_id))
                    .select((contacts::first_name, contacts::last_name))
                    .first(&mut conn)
                    .optional()?;
                row.map(|(first, last)| match last {
                    Some(last) => format!("{first} {last}"),
                    None => first,
                })
            }
            None => None,
        };

        let comments = ticket_comments::table
            .filter(ticket_comments::ticket_id.eq(&ticket.id))
            .order(ticket_comments::created_at.asc())
            .load(&mut conn)?;

        Ok(Some(TicketDetailResponse {
            ticket: ticket.into(),
            assignee_name,
            contact_name,
            comments,
        }))
    }

    pub fn list_tickets(
        &self,
        organization_id: &str,
        query: &TicketQuery,
    ) -> ApiResult<Vec<Ticket>> {
        let mut conn = self.db()?;
        let mut stmt = tickets::table
            .filter(tickets::organization_id.eq(organization_id))
            .into_boxed();

        if let Some(status) = &query.status {
            stmt = stmt.filter(tickets::status.eq(status));
        }
        if let Some(priority) = &query.priority {
            stmt = stmt.filter(tickets::priority.eq(priority));
        }
        if let Some(assigned_to) = &query.assigned_to {
            stmt = stmt.filter(tickets::assigned_to.eq(assigned_to));
        }
        if let Some(department_id) = &query.department_id {
            stmt = stmt.filter(tickets::department_id.eq(department_id));
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            stmt = stmt.filter(
                tickets::subject
                    .like(pattern.clone())
                    .nullable()
                    .or(tickets::description.like(pattern.clone()))
                    .or(tickets::ticket_number.like(pattern).nullable()),
            );
        }

        let rows = stmt
            .order(tickets::created_at.desc())
            .limit(query.limit.unwrap_or(50))
            .offset(query.offset.unwrap_or(0))
            .load(&mut conn)?;
        Ok(rows)
    }

    /// Apply a partial update. Identity and numbering fields are not part of
    /// the request type, so they cannot change here. Status transitions keep
    /// the resolution timestamps consistent: entering resolved stamps
    /// resolved_at once, entering closed stamps closed_at, and reopening
    /// clears both.
    pub fn update_ticket(
        &self,
        organization_id: &str,
        ticket_id: &str,
        req: &UpdateTicketRequest,
    ) -> ApiResult<Ticket> {
        if let Some(subject) = &req.subject {
            if subject.trim().is_empty() {
                return Err(ApiError::validation("ticket subject is required"));
            }
        }
        if let Some(status) = &req.status {
            validate_status(status)?;
        }
        if let Some(priority) = &req.priority {
            validate_priority(priority)?;
        }

        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let current: Ticket = tickets::table
                .filter(tickets::id.eq(ticket_id))
                .filter(tickets::organization_id.eq(organization_id))
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("ticket"))?;

            let department_id = match &req.department_id {
                Some(Some(department_id)) => {
                    let exists: Option<String> = departments::table
                        .filter(departments::id.eq(department_id))
                        .filter(departments::organization_id.eq(organization_id))
                        .select(departments::id)
                        .first(conn)
                        .optional()?;
                    if exists.is_none() {
                        return Err(ApiError::not_found("department"));
                    }
                    Some(department_id.clone())
                }
                Some(None) => None,
                None => current.department_id.clone(),
            };
            let contact_id = match &req.contact_id {
                Some(Some(contact_id)) => {
                    let exists: Option<String> = contacts::table
                        .filter(contacts::id.eq(contact_id))
                        .filter(contacts::organization_id.eq(organization_id))
                        .select(contacts::id)
                        .first(conn)
                        .optional()?;
                    if exists.is_none() {
                        return Err(ApiError::not_found("contact"));
                    }
                    Some(contact_id.clone())
                }
                Some(None) => None,
                None => current.contact_id.clone(),
            };

            let now = Utc::now();
            let status = req.status.clone().unwrap_or_else(|| current.status.clone());
            // A resolved ticket is no longer closed, so moving back from
            // closed drops the close timestamp.
            let (resolved_at, closed_at) = match req.status.as_deref() {
                Some("resolved") => (current.resolved_at.or(Some(now)), None),
                Some("closed") => (current.resolved_at, Some(now)),
                Some(_) => (None, None),
                None => (current.resolved_at, current.closed_at),
            };

            let tags = match &req.tags {
                Some(tags) => serde_json::to_string(tags).map_err(|e| {
                    ApiError::Internal(anyhow::anyhow!("failed to serialize tags: {e}"))
                })?,
                None => current.tags.clone(),
            };

            diesel::update(tickets::table.filter(tickets::id.eq(ticket_id)))
                .set((
                    tickets::subject.eq(req
                        .subject
                        .as_deref()
                        .map(str::trim)
                        .unwrap_or(&current.subject)),
                    tickets::description.eq(req.description.clone().or(current.description)),
                    tickets::status.eq(status),
                    tickets::priority.eq(req.priority.as_deref().unwrap_or(&current.priority)),
                    tickets::department_id.eq(department_id),
                    tickets::contact_id.eq(contact_id),
                    tickets::tags.eq(tags),
                    tickets::resolved_at.eq(resolved_at),
                    tickets::closed_at.eq(closed_at),
                    tickets::updated_at.eq(now),
                ))
                .execute(conn)?;

            let updated = tickets::table.filter(tickets::id.eq(ticket_id)).first(conn)?;
            Ok(updated)
        })
    }

    /// Delete a ticket and its comments. Reports whether anything was
    /// removed; deleting an already-deleted ticket is not an error.
    pub fn delete_ticket(&self, organization_id: &str, ticket_id: &str) -> ApiResult<bool> {
        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let exists: Option<String> = tickets::table
                .filter(tickets::id.eq(ticket_id))
                .filter(tickets::organization_id.eq(organization_id))
                .select(tickets::id)
                .first(conn)
                .optional()?;
            if exists.is_none() {
                return Ok(false);
            }

            diesel::delete(ticket_comments::table.filter(ticket_comments::ticket_id.eq(ticket_id)))
                .execute(conn)?;
            diesel::delete(tickets::table.filter(tickets::id.eq(ticket_id))).execute(conn)?;
            Ok(true)
        })
    }

    pub fn add_comment(
        &self,
        organization_id: &str,
        ticket_id: &str,
        author_id: Option<&str>,
        req: &CreateCommentRequest,
    ) -> ApiResult<TicketComment> {
        if req.content.trim().is_empty() {
            return Err(ApiError::validation("comment content is required"));
        }

        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            let exists: Option<String> = tickets::table
                .filter(tickets::id.eq(ticket_id))
                .filter(tickets::organization_id.eq(organization_id))
                .select(tickets::id)
                .first(conn)
                .optional()?;
            if exists.is_none() {
                return Err(ApiError::not_found("ticket"));
            }

            let comment = insert_comment(
                conn,
                ticket_id,
                author_id,
                req.content.trim(),
                req.is_internal.unwrap_or(false),
            )?;
            diesel::update(tickets::table.filter(tickets::id.eq(ticket_id)))
                .set(tickets::updated_at.eq(Utc::now()))
                .execute(conn)?;
            Ok(comment)
        })
    }

    pub fn list_comments(
        &self,
        organization_id: &str,
        ticket_id: &str,
        include_internal: bool,
    ) -> ApiResult<Vec<TicketComment>> {
        let mut conn = self.db()?;
        let exists: Option<String> = tickets::table
            .filter(tickets::id.eq(ticket_id))
            .filter(tickets::organization_id.eq(organization_id))
            .select(tickets::id)
            .first(&mut conn)
            .optional()?;
        if exists.is_none() {
            return Err(ApiError::not_found("ticket"));
        }

        let mut stmt = ticket_comments::table
            .filter(ticket_comments::ticket_id.eq(ticket_id))
            .into_boxed();
        if !include_internal {
            stmt = stmt.filter(ticket_comments::is_internal.eq(false));
        }
        let comments = stmt
            .order(ticket_comments::created_at.asc())
            .load(&mut conn)?;
        Ok(comments)
    }

    pub fn stats(&self, organization_id: &str) -> ApiResult<TicketStats> {
        let mut conn = self.db()?;

        let count_status = |conn: &mut DbConn, status: &str| -> QueryResult<i64> {
            tickets::table
                .filter(tickets::organization_id.eq(organization_id))
                .filter(tickets::status.eq(status))
                .count()
                .get_result(conn)
        };

        let total_tickets: i64 = tickets::table
            .filter(tickets::organization_id.eq(organization_id))
            .count()
            .get_result(&mut conn)?;
        let open_tickets = count_status(&mut conn, "open")?;
        let in_progress_tickets = count_status(&mut conn, "in-progress")?;
        let pending_tickets = count_status(&mut conn, "pending")?;
        let resolved_tickets = count_status(&mut conn, "resolved")?;
        let closed_tickets = count_status(&mut conn, "closed")?;
        let unassigned_tickets: i64 = tickets::table
            .filter(tickets::organization_id.eq(organization_id))
            .filter(tickets::assigned_to.is_null())
            .filter(tickets::status.eq_any(ACTIVE_STATUSES))
            .count()
            .get_result(&mut conn)?;

        Ok(TicketStats {
            total_tickets,
            open_tickets,
            in_progress_tickets,
            pending_tickets,
            resolved_tickets,
            closed_tickets,
            unassigned_tickets,
        })
    }
}

pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<TicketResponse>), ApiError> {
    let ticket = state.tickets.create_ticket(&ctx.organization_id, &req)?;
    Ok((StatusCode::CREATED, Json(ticket.into())))
}

pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Query(query): Query<TicketQuery>,
) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    let tickets = state.tickets.list_tickets(&ctx.organization_id, &query)?;
    Ok(Json(tickets.into_iter().map(Into::into).collect()))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state
        .tickets
        .get_ticket(&ctx.organization_id, &id)?
        .ok_or_else(|| ApiError::not_found("ticket"))?;
    Ok(Json(ticket.into()))
}

pub async fn get_ticket_detail(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<TicketDetailResponse>, ApiError> {
    let detail = state
        .tickets
        .get_ticket_detail(&ctx.organization_id, &id)?
        .ok_or_else(|| ApiError::not_found("ticket"))?;
    Ok(Json(detail))
}

pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state
        .tickets
        .update_ticket(&ctx.organization_id, &id, &req)?;
    Ok(Json(ticket.into()))
}

pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<DeleteTicketResponse>, ApiError> {
    let deleted = state.tickets.delete_ticket(&ctx.organization_id, &id)?;
    Ok(Json(DeleteTicketResponse { deleted }))
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<TicketComment>), ApiError> {
    let comment =
        state
            .tickets
            .add_comment(&ctx.organization_id, &id, Some(ctx.profile_id()), &req)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Query(query): Query<CommentQuery>,
) -> Result<Json<Vec<TicketComment>>, ApiError> {
    let comments = state.tickets.list_comments(
        &ctx.organization_id,
        &id,
        query.include_internal.unwrap_or(true),
    )?;
    Ok(Json(comments))
}

pub async fn get_ticket_stats(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
) -> Result<Json<TicketStats>, ApiError> {
    let stats = state.tickets.stats(&ctx.organization_id)?;
    Ok(Json(stats))
}

pub fn configure_tickets_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tickets", get(list_tickets).post(create_ticket))
        .route("/api/tickets/stats", get(get_ticket_stats))
        .route(
            "/api/tickets/:id",
            get(get_ticket).put(update_ticket).delete(delete_ticket),
        )
        .route("/api/tickets/:id/full", get(get_ticket_detail))
        .route(
            "/api/tickets/:id/comments",
            get(list_comments).post(add_comment),
        )
}
