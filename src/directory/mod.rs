//! Tenant & directory store: organizations, profiles, departments, groups,
//! contacts/companies and agent availability.
//!
//! Every operation takes the caller's resolved organization id and applies
//! it as a filter inside the query itself; cross-tenant rows are invisible,
//! not merely rejected after the fact.

use crate::shared::errors::{ApiError, ApiResult};
use crate::shared::utils::{DbConn, DbPool};

pub mod contacts;
pub mod departments;
pub mod groups;
pub mod organizations;
pub mod profiles;
pub mod router;

pub use organizations::{AssignmentPolicy, Organization, OrganizationSettings};
pub use profiles::Profile;

pub struct DirectoryStore {
    conn: DbPool,
}

impl DirectoryStore {
    pub fn new(conn: DbPool) -> Self {
        Self { conn }
    }

    pub(crate) fn db(&self) -> ApiResult<DbConn> {
        self.conn
            .get()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("connection pool: {e}")))
    }
}
