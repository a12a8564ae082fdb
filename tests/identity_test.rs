#[cfg(test)]
mod identity_integration_tests {
    use deskserver::config::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig};
    use deskserver::shared::errors::ApiError;
    use deskserver::shared::state::AppState;
    use deskserver::shared::utils::{create_conn, run_migrations};
    use std::sync::Arc;

    fn test_state() -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("desk.db");
        let url = db_path.to_str().expect("utf8 path").to_string();
        let pool = create_conn(&url, 4).expect("pool");
        run_migrations(&pool).expect("migrations");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig { url, pool_size: 4 },
            auth: AuthConfig {
                jwt_secret: "integration-test-secret-key-0123456789abcdef".to_string(),
                ..AuthConfig::default()
            },
        };
        let state = AppState::build(pool, config).expect("state");
        (dir, state)
    }

    #[tokio::test]
    async fn test_register_login_verify_round_trip() {
        let (_dir, state) = test_state();

        let (account, token) = state
            .identity
            .register("Founder@Acme.COM", "correct horse battery", Some("Acme"))
            .expect("register");
        assert_eq!(account.email, "founder@acme.com");
        assert!(account.is_active);

        let verified = state.identity.verify_token(&token).expect("token is valid");
        assert_eq!(verified.id, account.id);

        let (logged_in, login_token) = state
            .identity
            .login("founder@acme.com", "correct horse battery")
            .expect("login");
        assert_eq!(logged_in.id, account.id);
        assert!(state.identity.verify_token(&login_token).is_some());

        let err = state
            .identity
            .login("founder@acme.com", "wrong password")
            .expect_err("wrong password must fail");
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
        let (_dir, state) = test_state();
        state
            .identity
            .register("agent@acme.com", "password-123", None)
            .expect("register");

        let unknown = state
            .identity
            .login("nobody@acme.com", "password-123")
            .expect_err("unknown email");
        let wrong = state
            .identity
            .login("agent@acme.com", "not-the-password")
            .expect_err("wrong password");
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_case_insensitively() {
        let (_dir, state) = test_state();
        state
            .identity
            .register("ops@acme.com", "password-123", None)
            .expect("first register");

        let err = state
            .identity
            .register("OPS@Acme.com", "password-456", None)
            .expect_err("duplicate email");
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_with_organization_creates_admin_profile() {
        let (_dir, state) = test_state();
        let (account, _) = state
            .identity
            .register("boss@acme.com", "password-123", Some("Acme Support"))
            .expect("register");

        let profiles = state
            .directory
            .list_profiles_for_account(&account.id)
            .expect("profiles");
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].role, "admin");
        assert!(profiles[0].organization_id.is_some());
        assert_eq!(profiles[0].display_name, "boss");

        let organizations = state
            .directory
            .list_organizations_for_account(&account.id)
            .expect("organizations");
        assert_eq!(organizations.len(), 1);
        assert_eq!(organizations[0].name, "Acme Support");
        assert_eq!(organizations[0].subscription_status, "active");
    }

    #[tokio::test]
    async fn test_register_without_organization_creates_bare_agent_profile() {
        let (_dir, state) = test_state();
        let (account, _) = state
            .identity
            .register("solo@acme.com", "password-123", None)
            .expect("register");

        let profiles = state
            .directory
            .list_profiles_for_account(&account.id)
            .expect("profiles");
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].role, "agent");
        assert!(profiles[0].organization_id.is_none());
    }

    #[tokio::test]
    async fn test_deactivated_account_cannot_login_or_verify() {
        let (_dir, state) = test_state();
        let (account, token) = state
            .identity
            .register("leaver@acme.com", "password-123", None)
            .expect("register");

        state
            .identity
            .deactivate_account(&account.id)
            .expect("deactivate");

        let err = state
            .identity
            .login("leaver@acme.com", "password-123")
            .expect_err("deactivated login");
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(state.identity.verify_token(&token).is_none());

        let stored = state
            .identity
            .get_account(&account.id)
            .expect("lookup")
            .expect("still present");
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn test_validation_rules_on_register() {
        let (_dir, state) = test_state();

        let err = state
            .identity
            .register("not-an-email", "password-123", None)
            .expect_err("bad email");
        assert!(matches!(err, ApiError::Validation(_)));

        let err = state
            .identity
            .register("ok@acme.com", "short", None)
            .expect_err("short password");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let (_dir, state) = test_state();
        assert!(state.identity.verify_token("not-a-jwt").is_none());
        assert!(state.identity.verify_token("").is_none());
    }
}
