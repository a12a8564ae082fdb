#[cfg(test)]
mod ticket_integration_tests {
    use deskserver::config::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig};
    use deskserver::shared::errors::ApiError;
    use deskserver::shared::state::AppState;
    use deskserver::shared::utils::{create_conn, run_migrations};
    use deskserver::tickets::{
        CreateCommentRequest, CreateTicketRequest, TicketQuery, UpdateTicketRequest,
    };
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

    fn new_ticket(subject: &str) -> CreateTicketRequest {
        CreateTicketRequest {
            subject: subject.to_string(),
            description: None,
            priority: None,
            department_id: None,
            contact_id: None,
            tags: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip_with_defaults() {
        let (_dir, state) = test_state();
        let (org, _) = seed_org(&state, "admin@acme.com", "Acme");

        let created = state
            .tickets
            .create_ticket(
                &org,
                &CreateTicketRequest {
                    subject: "  VPN drops every hour  ".to_string(),
                    description: Some("since Tuesday".to_string()),
                    priority: None,
                    department_id: None,
                    contact_id: None,
                    tags: Some(vec!["network".to_string()]),
                },
            )
            .expect("create");

        assert_eq!(created.organization_id, org);
        assert_eq!(created.subject, "VPN drops every hour");
        assert_eq!(created.status, "open");
        assert_eq!(created.priority, "medium");
        assert!(created.assigned_to.is_none());
        assert!(created.resolved_at.is_none());

        let fetched = state
            .tickets
            .get_ticket(&org, &created.id)
            .expect("query")
            .expect("found");
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.ticket_number, created.ticket_number);
        assert_eq!(fetched.subject, created.subject);
        assert_eq!(fetched.description.as_deref(), Some("since Tuesday"));
        assert_eq!(fetched.tags, r#"["network"]"#);
    }

    #[tokio::test]
    async fn test_ticket_numbers_are_sequential_per_tenant() {
        let (_dir, state) = test_state();
        let (org_a, _) = seed_org(&state, "a@one.com", "Org One");
        let (org_b, _) = seed_org(&state, "b@two.com", "Org Two");

        let first = state.tickets.create_ticket(&org_a, &new_ticket("one")).expect("create");
        let second = state.tickets.create_ticket(&org_a, &new_ticket("two")).expect("create");
        assert_eq!(first.ticket_number, "TKT-000001");
        assert_eq!(second.ticket_number, "TKT-000002");

        // Numbering is scoped to the tenant, so another organization starts
        // over at one.
        let other = state.tickets.create_ticket(&org_b, &new_ticket("theirs")).expect("create");
        assert_eq!(other.ticket_number, "TKT-000001");
    }

    #[tokio::test]
    async fn test_numbering_survives_deletes_in_the_middle() {
        let (_dir, state) = test_state();
        let (org, _) = seed_org(&state, "admin@acme.com", "Acme");

        let first = state.tickets.create_ticket(&org, &new_ticket("one")).expect("create");
        let second = state.tickets.create_ticket(&org, &new_ticket("two")).expect("create");
        assert!(state.tickets.delete_ticket(&org, &first.id).expect("delete"));

        // The hole left by the delete must not make the next number collide
        // with a number still on file.
        let third = state
            .tickets
            .create_ticket(&org, &new_ticket("three"))
            .expect("create after delete");
        assert_eq!(third.ticket_number, "TKT-000003");
        assert_ne!(third.ticket_number, second.ticket_number);

        let fourth = state
            .tickets
            .create_ticket(&org, &new_ticket("four"))
            .expect("create");
        assert_eq!(fourth.ticket_number, "TKT-000004");
    }

    #[tokio::test]
    async fn test_update_cannot_touch_identity_fields() {
        let (_dir, state) = test_state();
        let (org, _) = seed_org(&state, "admin@acme.com", "Acme");
        let created = state.tickets.create_ticket(&org, &new_ticket("subject")).expect("create");

        let updated = state
            .tickets
            .update_ticket(
                &org,
                &created.id,
                &UpdateTicketRequest {
                    subject: Some("new subject".to_string()),
                    description: None,
                    status: None,
                    priority: Some("urgent".to_string()),
                    tags: None,
                    department_id: None,
                    contact_id: None,
                },
            )
            .expect("update");

        assert_eq!(updated.subject, "new subject");
        assert_eq!(updated.priority, "urgent");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.ticket_number, created.ticket_number);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_resolved_at_follows_status() {
        let (_dir, state) = test_state();
        let (org, _) = seed_org(&state, "admin@acme.com", "Acme");
        let ticket = state.tickets.create_ticket(&org, &new_ticket("flaky wifi")).expect("create");

        let set_status = |status: &str| UpdateTicketRequest {
            subject: None,
            description: None,
            status: Some(status.to_string()),
            priority: None,
            tags: None,
            department_id: None,
            contact_id: None,
        };

        let resolved = state
            .tickets
            .update_ticket(&org, &ticket.id, &set_status("resolved"))
            .expect("resolve");
        assert!(resolved.resolved_at.is_some());
        assert!(resolved.closed_at.is_none());

        // Closing after resolution keeps the resolution timestamp.
        let closed = state
            .tickets
            .update_ticket(&org, &ticket.id, &set_status("closed"))
            .expect("close");
        assert_eq!(closed.resolved_at, resolved.resolved_at);
        assert!(closed.closed_at.is_some());

        let reopened = state
            .tickets
            .update_ticket(&org, &ticket.id, &set_status("open"))
            .expect("reopen");
        assert!(reopened.resolved_at.is_none());
        assert!(reopened.closed_at.is_none());

        // Walking back from closed to resolved drops the close timestamp;
        // a resolved ticket never carries one.
        state
            .tickets
            .update_ticket(&org, &ticket.id, &set_status("closed"))
            .expect("close again");
        let resolved_again = state
            .tickets
            .update_ticket(&org, &ticket.id, &set_status("resolved"))
            .expect("back to resolved");
        assert!(resolved_again.resolved_at.is_some());
        assert!(resolved_again.closed_at.is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_comments_and_is_idempotent() {
        let (_dir, state) = test_state();
        let (org, profile) = seed_org(&state, "admin@acme.com", "Acme");
        let ticket = state.tickets.create_ticket(&org, &new_ticket("to delete")).expect("create");

        state
            .tickets
            .add_comment(
                &org,
                &ticket.id,
                Some(&profile),
                &CreateCommentRequest {
                    content: "looking into it".to_string(),
                    is_internal: Some(false),
                },
            )
            .expect("comment");
        state
            .tickets
            .add_comment(
                &org,
                &ticket.id,
                None,
                &CreateCommentRequest {
                    content: "internal note".to_string(),
                    is_internal: Some(true),
                },
            )
            .expect("comment");

        assert!(state.tickets.delete_ticket(&org, &ticket.id).expect("delete"));
        assert!(!state.tickets.delete_ticket(&org, &ticket.id).expect("repeat delete"));

        // No orphan comments remain queryable.
        let err = state
            .tickets
            .list_comments(&org, &ticket.id, true)
            .expect_err("ticket is gone");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cross_tenant_access_is_not_found() {
        let (_dir, state) = test_state();
        let (org_a, _) = seed_org(&state, "a@one.com", "Org One");
        let (org_b, _) = seed_org(&state, "b@two.com", "Org Two");
        let ticket = state.tickets.create_ticket(&org_a, &new_ticket("private")).expect("create");

        assert!(state
            .tickets
            .get_ticket(&org_b, &ticket.id)
            .expect("query")
            .is_none());

        let err = state
            .tickets
            .update_ticket(
                &org_b,
                &ticket.id,
                &UpdateTicketRequest {
                    subject: Some("hijacked".to_string()),
                    description: None,
                    status: None,
                    priority: None,
                    tags: None,
                    department_id: None,
                    contact_id: None,
                },
            )
            .expect_err("cross-tenant update");
        assert!(matches!(err, ApiError::NotFound(_)));

        assert!(!state
            .tickets
            .delete_ticket(&org_b, &ticket.id)
            .expect("cross-tenant delete"));
        let untouched = state
            .tickets
            .get_ticket(&org_a, &ticket.id)
            .expect("query")
            .expect("still there");
        assert_eq!(untouched.subject, "private");
    }

    #[tokio::test]
    async fn test_comments_touch_ticket_and_filter_internal() {
        let (_dir, state) = test_state();
        let (org, profile) = seed_org(&state, "admin@acme.com", "Acme");
        let ticket = state.tickets.create_ticket(&org, &new_ticket("slow intranet")).expect("create");

        state
            .tickets
            .add_comment(
                &org,
                &ticket.id,
                Some(&profile),
                &CreateCommentRequest {
                    content: "customer reply".to_string(),
                    is_internal: Some(false),
                },
            )
            .expect("comment");
        state
            .tickets
            .add_comment(
                &org,
                &ticket.id,
                Some(&profile),
                &CreateCommentRequest {
                    content: "staff only".to_string(),
                    is_internal: Some(true),
                },
            )
            .expect("comment");

        let touched = state
            .tickets
            .get_ticket(&org, &ticket.id)
            .expect("query")
            .expect("found");
        assert!(touched.updated_at >= ticket.updated_at);

        let all = state
            .tickets
            .list_comments(&org, &ticket.id, true)
            .expect("all comments");
        assert_eq!(all.len(), 2);
        let public = state
            .tickets
            .list_comments(&org, &ticket.id, false)
            .expect("public comments");
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].content, "customer reply");
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let (_dir, state) = test_state();
        let (org, _) = seed_org(&state, "admin@acme.com", "Acme");

        let err = state
            .tickets
            .create_ticket(&org, &new_ticket("   "))
            .expect_err("blank subject");
        assert!(matches!(err, ApiError::Validation(_)));

        let err = state
            .tickets
            .create_ticket(
                &org,
                &CreateTicketRequest {
                    subject: "ok".to_string(),
                    description: None,
                    priority: Some("critical".to_string()),
                    department_id: None,
                    contact_id: None,
                    tags: None,
                },
            )
            .expect_err("unknown priority");
        assert!(matches!(err, ApiError::Validation(_)));

        let ticket = state.tickets.create_ticket(&org, &new_ticket("ok")).expect("create");
        let err = state
            .tickets
            .update_ticket(
                &org,
                &ticket.id,
                &UpdateTicketRequest {
                    subject: None,
                    description: None,
                    status: Some("archived".to_string()),
                    priority: None,
                    tags: None,
                    department_id: None,
                    contact_id: None,
                },
            )
            .expect_err("unknown status");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_filters_and_stats() {
        let (_dir, state) = test_state();
        let (org, profile) = seed_org(&state, "admin@acme.com", "Acme");

        for i in 0..3 {
            state
                .tickets
                .create_ticket(&org, &new_ticket(&format!("ticket {i}")))
                .expect("create");
        }
        let resolved = state.tickets.create_ticket(&org, &new_ticket("done")).expect("create");
        state
            .tickets
            .update_ticket(
                &org,
                &resolved.id,
                &UpdateTicketRequest {
                    subject: None,
                    description: None,
                    status: Some("resolved".to_string()),
                    priority: None,
                    tags: None,
                    department_id: None,
                    contact_id: None,
                },
            )
            .expect("resolve");
        let claimed = state.tickets.create_ticket(&org, &new_ticket("mine")).expect("create");
        state
            .assignment
            .take_ownership(&org, &claimed.id, &profile)
            .await
            .expect("claim");

        let open = state
            .tickets
            .list_tickets(
                &org,
                &TicketQuery {
                    status: Some("open".to_string()),
                    ..TicketQuery::default()
                },
            )
            .expect("list open");
        assert_eq!(open.len(), 4);

        let mine = state
            .tickets
            .list_tickets(
                &org,
                &TicketQuery {
                    assigned_to: Some(profile.clone()),
                    ..TicketQuery::default()
                },
            )
            .expect("list mine");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, claimed.id);

        let stats = state.tickets.stats(&org).expect("stats");
        assert_eq!(stats.total_tickets, 5);
        assert_eq!(stats.open_tickets, 4);
        assert_eq!(stats.resolved_tickets, 1);
        assert_eq!(stats.unassigned_tickets, 3);
    }

    #[tokio::test]
    async fn test_detail_view_joins_names_within_tenant() {
        let (_dir, state) = test_state();
        let (org, profile) = seed_org(&state, "admin@acme.com", "Acme");
        let contact = state
            .directory
            .create_contact(
                &org,
                &deskserver::directory::contacts::CreateContactRequest {
                    first_name: "Grace".to_string(),
                    last_name: Some("Hopper".to_string()),
                    email: None,
                    phone: None,
                    address: None,
                    city: None,
                    country: None,
                    company_id: None,
                },
            )
            .expect("contact");

        let ticket = state
            .tickets
            .create_ticket(
                &org,
                &CreateTicketRequest {
                    subject: "compiler question".to_string(),
                    description: None,
                    priority: None,
                    department_id: None,
                    contact_id: Some(contact.id),
                    tags: None,
                },
            )
            .expect("create");
        state
            .assignment
            .take_ownership(&org, &ticket.id, &profile)
            .await
            .expect("claim");

        let detail = state
            .tickets
            .get_ticket_detail(&org, &ticket.id)
            .expect("query")
            .expect("found");
        assert_eq!(detail.contact_name.as_deref(), Some("Grace Hopper"));
        assert_eq!(detail.assignee_name.as_deref(), Some("admin"));
    }
}
