//! Assignment engine: automatic least-loaded assignment plus the manual
//! ownership operations (claim, transfer, unassign).
//!
//! Auto-assignment is the only path that enforces workload caps. It holds a
//! per-organization lock for the duration of the decision and re-counts
//! workloads inside the write transaction, so concurrent requests against
//! the same tenant see each other's assignments. Manual operations are
//! deliberate human actions and bypass availability and caps entirely.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use diesel::prelude::*;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::directory::profiles::AGENT_CAPABLE_ROLES;
use crate::notify::NotificationDispatch;
use crate::shared::errors::{ApiError, ApiResult};
use crate::shared::middleware::TenantContext;
use crate::shared::schema::{accounts, agent_availability, departments, groups, profiles, tickets};
use crate::shared::state::AppState;
use crate::shared::utils::{DbConn, DbPool};

use super::{insert_comment, Ticket, TicketResponse, ACTIVE_STATUSES};

/// Everything needed to tell the new assignee after commit.
struct AssignmentNotice {
    assignee_name: String,
    recipient_email: Option<String>,
    ticket_number: String,
    subject: String,
}

pub struct AssignmentEngine {
    conn: DbPool,
    notifier: Arc<dyn NotificationDispatch>,
    org_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AssignmentEngine {
    pub fn new(conn: DbPool, notifier: Arc<dyn NotificationDispatch>) -> Self {
        Self {
            conn,
            notifier,
            org_locks: Mutex::new(HashMap::new()),
        }
    }

    fn db(&self) -> ApiResult<DbConn> {
        self.conn
            .get()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("connection pool: {e}")))
    }

    async fn org_lock(&self, organization_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.org_locks.lock().await;
        locks
            .entry(organization_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn dispatch(&self, notice: &AssignmentNotice, actor_name: &str, message: &str) {
        let Some(email) = &notice.recipient_email else {
            return;
        };
        if let Err(e) = self
            .notifier
            .ticket_assigned(&notice.ticket_number, &notice.subject, email, actor_name, message)
            .await
        {
            warn!(
                "notification dispatch failed for {}: {e:#}",
                notice.ticket_number
            );
        }
    }

    /// Pick the least-loaded eligible agent and assign the ticket to them.
    ///
    /// Eligible means: an admin or agent profile of the organization, marked
    /// available, with fewer active tickets than its cap. Ties go to the
    /// profile with the smaller id so repeated runs are deterministic.
    /// Returns the assignee's display name, or None when no agent qualifies
    /// or the organization assigns manually; the ticket is untouched in the
    /// None case.
    pub async fn auto_assign(
        &self,
        organization_id: &str,
        ticket_id: &str,
    ) -> ApiResult<Option<String>> {
        let lock = self.org_lock(organization_id).await;
        let guard = lock.lock().await;

        let outcome = {
            let mut conn = self.db()?;
            conn.immediate_transaction::<_, ApiError, _>(|conn| {
                let ticket: Ticket = tickets::table
                    .filter(tickets::id.eq(ticket_id))
                    .filter(tickets::organization_id.eq(organization_id))
                    .first(conn)
                    .optional()?
                    .ok_or_else(|| ApiError::not_found("ticket"))?;

                let organization: crate::directory::Organization = {
                    use crate::shared::schema::organizations;
                    organizations::table
                        .filter(organizations::id.eq(organization_id))
                        .first(conn)
                        .optional()?
                        .ok_or_else(|| ApiError::not_found("organization"))?
                };
                let policy = organization.parsed_assignment_policy();
                if policy.method == "manual" {
                    return Ok(None);
                }

                let candidates: Vec<(String, String, String)> = profiles::table
                    .filter(profiles::organization_id.eq(organization_id))
                    .filter(profiles::role.eq_any(AGENT_CAPABLE_ROLES))
                    .select((profiles::id, profiles::account_id, profiles::display_name))
                    .order(profiles::id.asc())
                    .load(conn)?;

                let candidate_ids: Vec<&str> =
                    candidates.iter().map(|(id, _, _)| id.as_str()).collect();
                let stored: Vec<(String, bool, i32)> = agent_availability::table
                    .filter(agent_availability::profile_id.eq_any(&candidate_ids))
                    .select((
                        agent_availability::profile_id,
                        agent_availability::is_available,
                        agent_availability::max_tickets,
                    ))
                    .load(conn)?;
                let availability: HashMap<String, (bool, i32)> = stored
                    .into_iter()
                    .map(|(id, available, cap)| (id, (available, cap)))
                    .collect();

                let mut best: Option<(i64, &str, &str, &str)> = None;
                for (profile_id, account_id, display_name) in &candidates {
                    let (is_available, cap) = availability
                        .get(profile_id)
                        .copied()
                        .unwrap_or((true, policy.default_max_tickets_per_agent));
                    if !is_available {
                        continue;
                    }

                    let workload: i64 = tickets::table
                        .filter(tickets::organization_id.eq(organization_id))
                        .filter(tickets::assigned_to.eq(profile_id))
                        .filter(tickets::status.eq_any(ACTIVE_STATUSES))
                        .count()
                        .get_result(conn)?;
                    if workload >= i64::from(cap) {
                        continue;
                    }

                    // Candidates arrive ordered by id, so strictly-less keeps
                    // the earliest id on a tie.
                    if best.map_or(true, |(count, _, _, _)| workload < count) {
                        best = Some((workload, profile_id, account_id, display_name));
                    }
                }

                let Some((_, profile_id, account_id, display_name)) = best else {
                    return Ok(None);
                };

                diesel::update(tickets::table.filter(tickets::id.eq(ticket_id)))
                    .set((
                        tickets::assigned_to.eq(profile_id),
                        tickets::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;

                let recipient_email: Option<String> = accounts::table
                    .filter(accounts::id.eq(account_id))
                    .select(accounts::email)
                    .first(conn)
                    .optional()?;

                Ok(Some(AssignmentNotice {
                    assignee_name: display_name.to_string(),
                    recipient_email,
                    ticket_number: ticket.ticket_number,
                    subject: ticket.subject,
                }))
            })?
        };
        drop(guard);

        match outcome {
            Some(notice) => {
                self.dispatch(&notice, "auto-assignment", "A ticket was assigned to you")
                    .await;
                Ok(Some(notice.assignee_name))
            }
            None => Ok(None),
        }
    }

    /// The caller takes the ticket, whatever their current workload.
    pub async fn take_ownership(
        &self,
        organization_id: &str,
        ticket_id: &str,
        profile_id: &str,
    ) -> ApiResult<Ticket> {
        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            require_ticket(conn, organization_id, ticket_id)?;
            require_profile(conn, organization_id, profile_id)?;

            diesel::update(tickets::table.filter(tickets::id.eq(ticket_id)))
                .set((
                    tickets::assigned_to.eq(profile_id),
                    tickets::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            reload_ticket(conn, ticket_id)
        })
    }

    /// Hand the ticket to a specific profile of the same organization.
    /// Availability and caps are not consulted.
    pub async fn transfer_to_agent(
        &self,
        organization_id: &str,
        ticket_id: &str,
        target_profile_id: &str,
        actor_name: &str,
    ) -> ApiResult<Ticket> {
        let (ticket, notice) = {
            let mut conn = self.db()?;
            conn.immediate_transaction::<_, ApiError, _>(|conn| {
                require_ticket(conn, organization_id, ticket_id)?;
                let (account_id, display_name) =
                    require_profile(conn, organization_id, target_profile_id)?;

                diesel::update(tickets::table.filter(tickets::id.eq(ticket_id)))
                    .set((
                        tickets::assigned_to.eq(target_profile_id),
                        tickets::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
                let ticket = reload_ticket(conn, ticket_id)?;

                let recipient_email: Option<String> = accounts::table
                    .filter(accounts::id.eq(&account_id))
                    .select(accounts::email)
                    .first(conn)
                    .optional()?;
                let notice = AssignmentNotice {
                    assignee_name: display_name,
                    recipient_email,
                    ticket_number: ticket.ticket_number.clone(),
                    subject: ticket.subject.clone(),
                };
                Ok((ticket, notice))
            })?
        };

        self.dispatch(&notice, actor_name, "A ticket was transferred to you")
            .await;
        Ok(ticket)
    }

    /// Route the ticket to a department queue. Any personal assignment is
    /// dropped so the ticket shows up as unowned work for that department.
    pub async fn transfer_to_department(
        &self,
        organization_id: &str,
        ticket_id: &str,
        department_id: &str,
    ) -> ApiResult<Ticket> {
        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            require_ticket(conn, organization_id, ticket_id)?;

            let exists: Option<String> = departments::table
                .filter(departments::id.eq(department_id))
                .filter(departments::organization_id.eq(organization_id))
                .select(departments::id)
                .first(conn)
                .optional()?;
            if exists.is_none() {
                return Err(ApiError::not_found("department"));
            }

            diesel::update(tickets::table.filter(tickets::id.eq(ticket_id)))
                .set((
                    tickets::department_id.eq(department_id),
                    tickets::assigned_to.eq(None::<String>),
                    tickets::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            reload_ticket(conn, ticket_id)
        })
    }

    /// Park the ticket with a group. Groups have no queue column on the
    /// ticket, so the handover is recorded as an internal comment.
    pub async fn transfer_to_group(
        &self,
        organization_id: &str,
        ticket_id: &str,
        group_id: &str,
        actor_profile_id: Option<&str>,
    ) -> ApiResult<Ticket> {
        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            require_ticket(conn, organization_id, ticket_id)?;

            let group_name: Option<String> = groups::table
                .filter(groups::id.eq(group_id))
                .filter(groups::organization_id.eq(organization_id))
                .select(groups::name)
                .first(conn)
                .optional()?;
            let Some(group_name) = group_name else {
                return Err(ApiError::not_found("group"));
            };

            diesel::update(tickets::table.filter(tickets::id.eq(ticket_id)))
                .set((
                    tickets::assigned_to.eq(None::<String>),
                    tickets::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            insert_comment(
                conn,
                ticket_id,
                actor_profile_id,
                &format!("Transferred to group {group_name}"),
                true,
            )?;
            reload_ticket(conn, ticket_id)
        })
    }

    pub async fn unassign(&self, organization_id: &str, ticket_id: &str) -> ApiResult<Ticket> {
        let mut conn = self.db()?;
        conn.immediate_transaction::<_, ApiError, _>(|conn| {
            require_ticket(conn, organization_id, ticket_id)?;

            diesel::update(tickets::table.filter(tickets::id.eq(ticket_id)))
                .set((
                    tickets::assigned_to.eq(None::<String>),
                    tickets::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            reload_ticket(conn, ticket_id)
        })
    }
}

fn require_ticket(
    conn: &mut SqliteConnection,
    organization_id: &str,
    ticket_id: &str,
) -> ApiResult<()> {
    let exists: Option<String> = tickets::table
        .filter(tickets::id.eq(ticket_id))
        .filter(tickets::organization_id.eq(organization_id))
        .select(tickets::id)
        .first(conn)
        .optional()?;
    if exists.is_none() {
        return Err(ApiError::not_found("ticket"));
    }
    Ok(())
}

fn require_profile(
    conn: &mut SqliteConnection,
    organization_id: &str,
    profile_id: &str,
) -> ApiResult<(String, String)> {
    profiles::table
        .filter(profiles::id.eq(profile_id))
        .filter(profiles::organization_id.eq(organization_id))
        .select((profiles::account_id, profiles::display_name))
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("profile"))
}

fn reload_ticket(conn: &mut SqliteConnection, ticket_id: &str) -> ApiResult<Ticket> {
    let ticket = tickets::table.filter(tickets::id.eq(ticket_id)).first(conn)?;
    Ok(ticket)
}

#[derive(Debug, Serialize)]
pub struct AutoAssignResponse {
    pub assigned: bool,
    pub assignee: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransferAgentRequest {
    pub profile_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferDepartmentRequest {
    pub department_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferGroupRequest {
    pub group_id: String,
}

pub async fn assign_ticket(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<AutoAssignResponse>, ApiError> {
    let assignee = state.assignment.auto_assign(&ctx.organization_id, &id).await?;
    Ok(Json(AutoAssignResponse {
        assigned: assignee.is_some(),
        assignee,
    }))
}

pub async fn claim_ticket(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state
        .assignment
        .take_ownership(&ctx.organization_id, &id, ctx.profile_id())
        .await?;
    Ok(Json(ticket.into()))
}

pub async fn transfer_ticket_to_agent(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Json(req): Json<TransferAgentRequest>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state
        .assignment
        .transfer_to_agent(
            &ctx.organization_id,
            &id,
            &req.profile_id,
            &ctx.profile.display_name,
        )
        .await?;
    Ok(Json(ticket.into()))
}

pub async fn transfer_ticket_to_department(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Json(req): Json<TransferDepartmentRequest>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state
        .assignment
        .transfer_to_department(&ctx.organization_id, &id, &req.department_id)
        .await?;
    Ok(Json(ticket.into()))
}

pub async fn transfer_ticket_to_group(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    Json(req): Json<TransferGroupRequest>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state
        .assignment
        .transfer_to_group(
            &ctx.organization_id,
            &id,
            &req.group_id,
            Some(ctx.profile_id()),
        )
        .await?;
    Ok(Json(ticket.into()))
}

pub async fn unassign_ticket(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state
        .assignment
        .unassign(&ctx.organization_id, &id)
        .await?;
    Ok(Json(ticket.into()))
}

pub fn configure_assignment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tickets/:id/assign", post(assign_ticket))
        .route("/api/tickets/:id/claim", post(claim_ticket))
        .route("/api/tickets/:id/transfer/agent", post(transfer_ticket_to_agent))
        .route(
            "/api/tickets/:id/transfer/department",
            post(transfer_ticket_to_department),
        )
        .route("/api/tickets/:id/transfer/group", post(transfer_ticket_to_group))
        .route("/api/tickets/:id/unassign", post(unassign_ticket))
}
