use axum::{
    routing::{delete, get},
    Router,
};
use std::sync::Arc;

use crate::shared::state::AppState;

use super::contacts;
use super::departments;
use super::groups;
use super::organizations;
use super::profiles;

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/organizations",
            get(organizations::list_organizations).post(organizations::create_organization),
        )
        .route(
            "/api/organizations/:id",
            get(organizations::get_organization).put(organizations::update_organization),
        )
        .route(
            "/api/profiles",
            get(profiles::list_profiles).post(profiles::create_profile),
        )
        .route(
            "/api/profiles/:id",
            get(profiles::get_profile).put(profiles::update_profile),
        )
        .route(
            "/api/profiles/:id/availability",
            get(profiles::get_availability).put(profiles::set_availability),
        )
        .route(
            "/api/departments",
            get(departments::list_departments).post(departments::create_department),
        )
        .route(
            "/api/departments/:id",
            get(departments::get_department)
                .put(departments::update_department)
                .delete(departments::delete_department),
        )
        .route(
            "/api/groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route("/api/groups/:id", delete(groups::delete_group))
        .route(
            "/api/groups/:id/members",
            get(groups::list_group_members).post(groups::add_group_member),
        )
        .route(
            "/api/groups/:id/members/:profile_id",
            delete(groups::remove_group_member),
        )
        .route(
            "/api/companies",
            get(contacts::list_companies).post(contacts::create_company),
        )
        .route(
            "/api/companies/:id",
            get(contacts::get_company)
                .put(contacts::update_company)
                .delete(contacts::delete_company),
        )
        .route(
            "/api/contacts",
            get(contacts::list_contacts).post(contacts::create_contact),
        )
        .route(
            "/api/contacts/:id",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
}
