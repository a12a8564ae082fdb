use std::sync::Arc;

use crate::config::AppConfig;
use crate::directory::DirectoryStore;
use crate::identity::tokens::TokenManager;
use crate::identity::IdentityService;
use crate::notify::{LogNotifier, NotificationDispatch};
use crate::shared::errors::ApiResult;
use crate::shared::utils::DbPool;
use crate::tickets::assignment::AssignmentEngine;
use crate::tickets::TicketStore;

/// Shared application state. Every component receives the pool explicitly at
/// construction time; there is no global storage handle anywhere.
pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub identity: Arc<IdentityService>,
    pub directory: Arc<DirectoryStore>,
    pub tickets: Arc<TicketStore>,
    pub assignment: Arc<AssignmentEngine>,
}

impl AppState {
    pub fn build(conn: DbPool, config: AppConfig) -> ApiResult<Arc<AppState>> {
        Self::build_with_notifier(conn, config, Arc::new(LogNotifier))
    }

    pub fn build_with_notifier(
        conn: DbPool,
        config: AppConfig,
        notifier: Arc<dyn NotificationDispatch>,
    ) -> ApiResult<Arc<AppState>> {
        let tokens = TokenManager::from_config(config.auth.clone())?;
        let identity = Arc::new(IdentityService::new(conn.clone(), tokens));
        let directory = Arc::new(DirectoryStore::new(conn.clone()));
        let tickets = Arc::new(TicketStore::new(conn.clone()));
        let assignment = Arc::new(AssignmentEngine::new(conn.clone(), notifier));

        Ok(Arc::new(AppState {
            conn,
            config,
            identity,
            directory,
            tickets,
            assignment,
        }))
    }
}
