#[cfg(test)]
mod directory_integration_tests {
    use deskserver::config::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig};
    use deskserver::directory::contacts::{ContactQuery, CreateCompanyRequest, CreateContactRequest};
    use deskserver::directory::departments::CreateDepartmentRequest;
    use deskserver::directory::groups::CreateGroupRequest;
    use deskserver::directory::organizations::UpdateOrganizationRequest;
    use deskserver::directory::profiles::{CreateProfileRequest, SetAvailabilityRequest};
    use deskserver::directory::AssignmentPolicy;
    use deskserver::shared::errors::ApiError;
    use deskserver::shared::state::AppState;
    use deskserver::shared::utils::{create_conn, run_migrations};
    use deskserver::tickets::CreateTicketRequest;
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

    /// Register an organization and return (org id, admin profile id).
    fn seed_org(state: &AppState, email: &str, org_name: &str) -> (String, String) {
        let (account, _) = state
            .identity
            .register(email, "password-123", Some(org_name))
            .expect("register");
        let profile = state
            .directory
            .list_profiles_for_account(&account.id)
            .expect("profiles")
            .remove(0);
        (profile.organization_id.clone().expect("org id"), profile.id)
    }

    /// Register a bare account and attach it to the organization as an agent.
    fn seed_agent(state: &AppState, organization_id: &str, email: &str) -> String {
        let (account, _) = state
            .identity
            .register(email, "password-123", None)
            .expect("register");
        let profile = state
            .directory
            .create_profile(
                organization_id,
                &CreateProfileRequest {
                    account_id: account.id,
                    role: "agent".to_string(),
                    display_name: email.split('@').next().unwrap().to_string(),
                    department_id: None,
                },
            )
            .expect("create profile");
        profile.id
    }

    #[tokio::test]
    async fn test_cross_tenant_rows_are_invisible() {
        let (_dir, state) = test_state();
        let (org_a, _) = seed_org(&state, "a@one.com", "Org One");
        let (org_b, _) = seed_org(&state, "b@two.com", "Org Two");

        let contact = state
            .directory
            .create_contact(
                &org_a,
                &CreateContactRequest {
                    first_name: "Ada".to_string(),
                    last_name: None,
                    email: Some("ada@customer.com".to_string()),
                    phone: None,
                    address: None,
                    city: None,
                    country: None,
                    company_id: None,
                },
            )
            .expect("contact");
        let department = state
            .directory
            .create_department(
                &org_a,
                &CreateDepartmentRequest {
                    name: "Billing".to_string(),
                    manager_id: None,
                },
            )
            .expect("department");

        // Lookups through the wrong tenant find nothing.
        assert!(state
            .directory
            .get_contact(&org_b, &contact.id)
            .expect("query")
            .is_none());
        assert!(state
            .directory
            .get_department(&org_b, &department.id)
            .expect("query")
            .is_none());
        assert!(state
            .directory
            .list_contacts(&org_b, &ContactQuery::default())
            .expect("list")
            .is_empty());

        // Cross-tenant deletes touch nothing.
        assert!(!state
            .directory
            .delete_contact(&org_b, &contact.id)
            .expect("delete"));
        assert!(state
            .directory
            .get_contact(&org_a, &contact.id)
            .expect("query")
            .is_some());
    }

    #[tokio::test]
    async fn test_duplicate_profile_per_organization_conflicts() {
        let (_dir, state) = test_state();
        let (org, _) = seed_org(&state, "admin@acme.com", "Acme");
        let (account, _) = state
            .identity
            .register("agent@acme.com", "password-123", None)
            .expect("register");

        let request = CreateProfileRequest {
            account_id: account.id.clone(),
            role: "agent".to_string(),
            display_name: "Agent".to_string(),
            department_id: None,
        };
        state
            .directory
            .create_profile(&org, &request)
            .expect("first profile");
        let err = state
            .directory
            .create_profile(&org, &request)
            .expect_err("second profile in same org");
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_bare_profile_is_adopted_on_join() {
        let (_dir, state) = test_state();
        let (org, _) = seed_org(&state, "admin@acme.com", "Acme");
        let (account, _) = state
            .identity
            .register("joiner@acme.com", "password-123", None)
            .expect("register");

        state
            .directory
            .create_profile(
                &org,
                &CreateProfileRequest {
                    account_id: account.id.clone(),
                    role: "agent".to_string(),
                    display_name: "Joiner".to_string(),
                    department_id: None,
                },
            )
            .expect("join");

        // The bare registration profile was attached, not duplicated.
        let profiles = state
            .directory
            .list_profiles_for_account(&account.id)
            .expect("profiles");
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].organization_id.as_deref(), Some(org.as_str()));
    }

    #[tokio::test]
    async fn test_department_delete_detaches_tickets() {
        let (_dir, state) = test_state();
        let (org, _) = seed_org(&state, "admin@acme.com", "Acme");
        let department = state
            .directory
            .create_department(
                &org,
                &CreateDepartmentRequest {
                    name: "Support".to_string(),
                    manager_id: None,
                },
            )
            .expect("department");

        let ticket = state
            .tickets
            .create_ticket(
                &org,
                &CreateTicketRequest {
                    subject: "printer on fire".to_string(),
                    description: None,
                    priority: None,
                    department_id: Some(department.id.clone()),
                    contact_id: None,
                    tags: None,
                },
            )
            .expect("ticket");
        assert_eq!(ticket.department_id.as_deref(), Some(department.id.as_str()));

        assert!(state
            .directory
            .delete_department(&org, &department.id)
            .expect("delete"));

        let reloaded = state
            .tickets
            .get_ticket(&org, &ticket.id)
            .expect("query")
            .expect("ticket survives");
        assert!(reloaded.department_id.is_none());
    }

    #[tokio::test]
    async fn test_group_membership_lifecycle() {
        let (_dir, state) = test_state();
        let (org, admin_profile) = seed_org(&state, "admin@acme.com", "Acme");
        let group = state
            .directory
            .create_group(
                &org,
                &CreateGroupRequest {
                    name: "Escalations".to_string(),
                    description: None,
                },
            )
            .expect("group");

        state
            .directory
            .add_group_member(&org, &group.id, &admin_profile)
            .expect("add member");
        let err = state
            .directory
            .add_group_member(&org, &group.id, &admin_profile)
            .expect_err("duplicate member");
        assert!(matches!(err, ApiError::Conflict(_)));

        let members = state
            .directory
            .list_group_members(&org, &group.id)
            .expect("members");
        assert_eq!(members.len(), 1);

        assert!(state.directory.delete_group(&org, &group.id).expect("delete"));
        let err = state
            .directory
            .list_group_members(&org, &group.id)
            .expect_err("group is gone");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_availability_defaults_when_no_row_exists() {
        let (_dir, state) = test_state();
        let (org, _) = seed_org(&state, "admin@acme.com", "Acme");
        let agent = seed_agent(&state, &org, "agent@acme.com");

        let availability = state
            .directory
            .get_availability(&org, &agent)
            .expect("availability");
        assert!(availability.is_available);
        assert_eq!(availability.max_tickets, 10);
    }

    #[tokio::test]
    async fn test_availability_self_service_gate() {
        let (_dir, state) = test_state();
        let (org, admin_profile) = seed_org(&state, "admin@acme.com", "Acme");
        let agent = seed_agent(&state, &org, "agent@acme.com");
        let other = seed_agent(&state, &org, "other@acme.com");

        // Agents may toggle their own availability under the default policy.
        let availability = state
            .directory
            .set_availability(
                &org,
                &agent,
                false,
                &agent,
                &SetAvailabilityRequest {
                    is_available: false,
                    max_tickets: Some(5),
                },
            )
            .expect("self update");
        assert!(!availability.is_available);
        assert_eq!(availability.max_tickets, 5);

        // Never someone else's.
        let err = state
            .directory
            .set_availability(
                &org,
                &agent,
                false,
                &other,
                &SetAvailabilityRequest {
                    is_available: false,
                    max_tickets: None,
                },
            )
            .expect_err("agent touching another agent");
        assert!(matches!(err, ApiError::Forbidden(_)));

        // Turning the policy off closes the self-service path too.
        state
            .directory
            .update_organization(
                &org,
                &UpdateOrganizationRequest {
                    name: None,
                    subscription_status: None,
                    max_seats: None,
                    max_tickets: None,
                    settings: None,
                    assignment_policy: Some(AssignmentPolicy {
                        allow_agent_availability_control: false,
                        ..AssignmentPolicy::default()
                    }),
                },
            )
            .expect("policy update");
        let err = state
            .directory
            .set_availability(
                &org,
                &agent,
                false,
                &agent,
                &SetAvailabilityRequest {
                    is_available: true,
                    max_tickets: None,
                },
            )
            .expect_err("policy forbids self-service");
        assert!(matches!(err, ApiError::Forbidden(_)));

        // Admins are never gated.
        let availability = state
            .directory
            .set_availability(
                &org,
                &admin_profile,
                true,
                &agent,
                &SetAvailabilityRequest {
                    is_available: true,
                    max_tickets: None,
                },
            )
            .expect("admin update");
        assert!(availability.is_available);
        assert_eq!(availability.max_tickets, 5);
    }

    #[tokio::test]
    async fn test_company_delete_detaches_contacts() {
        let (_dir, state) = test_state();
        let (org, _) = seed_org(&state, "admin@acme.com", "Acme");
        let company = state
            .directory
            .create_company(
                &org,
                &CreateCompanyRequest {
                    name: "Customer Corp".to_string(),
                    domain: None,
                    phone: None,
                    address: None,
                },
            )
            .expect("company");
        let contact = state
            .directory
            .create_contact(
                &org,
                &CreateContactRequest {
                    first_name: "Bea".to_string(),
                    last_name: Some("Ops".to_string()),
                    email: Some("bea@customer.com".to_string()),
                    phone: None,
                    address: None,
                    city: None,
                    country: None,
                    company_id: Some(company.id.clone()),
                },
            )
            .expect("contact");

        assert!(state
            .directory
            .delete_company(&org, &company.id)
            .expect("delete"));
        let reloaded = state
            .directory
            .get_contact(&org, &contact.id)
            .expect("query")
            .expect("contact survives");
        assert!(reloaded.company_id.is_none());
    }

    #[tokio::test]
    async fn test_organization_settings_round_trip() {
        let (_dir, state) = test_state();
        let (org, _) = seed_org(&state, "admin@acme.com", "Acme");

        let updated = state
            .directory
            .update_organization(
                &org,
                &UpdateOrganizationRequest {
                    name: Some("Acme Support".to_string()),
                    subscription_status: Some("suspended".to_string()),
                    max_seats: Some(50),
                    max_tickets: None,
                    settings: None,
                    assignment_policy: Some(AssignmentPolicy {
                        method: "manual".to_string(),
                        default_max_tickets_per_agent: 7,
                        allow_agent_availability_control: false,
                    }),
                },
            )
            .expect("update");
        assert_eq!(updated.name, "Acme Support");
        assert_eq!(updated.subscription_status, "suspended");
        assert_eq!(updated.max_seats, 50);

        let policy = updated.parsed_assignment_policy();
        assert_eq!(policy.method, "manual");
        assert_eq!(policy.default_max_tickets_per_agent, 7);

        let err = state
            .directory
            .update_organization(
                &org,
                &UpdateOrganizationRequest {
                    name: None,
                    subscription_status: Some("deleted".to_string()),
                    max_seats: None,
                    max_tickets: None,
                    settings: None,
                    assignment_policy: None,
                },
            )
            .expect_err("unknown status");
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
