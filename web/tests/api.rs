//! End-to-end tests of the HTTP shell against the in-memory providers.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use clubhouse_portal::mocks::{fixtures, MockBackend};
use clubhouse_portal::{Access, MembershipTier, PortalSettings, Role};
use clubhouse_testing::test_clock;
use clubhouse_web::handlers::auth::SignedIn;
use clubhouse_web::{build_router, AppState, CORRELATION_ID_HEADER};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const PASSWORD: &str = "secret1";

fn server(backend: &MockBackend) -> TestServer {
    let settings = PortalSettings {
        banner_ttl: None,
        request_timeout: Duration::from_secs(2),
        ..PortalSettings::default()
    };
    let metrics = PrometheusBuilder::new().build_recorder().handle();
    let state = AppState::new(backend.clone(), Arc::new(test_clock()), settings, metrics)
        .with_shutdown_timeout(Duration::from_secs(1));
    TestServer::new(build_router(state, Duration::from_secs(5))).unwrap()
}

/// Seed an account with a profile and return the backend.
fn seeded(uid: &str, role: Option<Role>, tier: MembershipTier) -> MockBackend {
    let backend = MockBackend::new();
    backend
        .gateway
        .seed_account(uid, &format!("{uid}@club.test"), PASSWORD);
    let mut member = fixtures::member(uid, role);
    member.membership_type = tier;
    backend.profiles.insert_member(member);
    backend
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

async fn login(server: &TestServer, uid: &str) -> SignedIn {
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": format!("{uid}@club.test"), "password": PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<SignedIn>()
}

fn location(response: &axum_test::TestResponse) -> String {
    response
        .header(header::LOCATION)
        .to_str()
        .unwrap()
        .to_string()
}

// ═══════════════════════════════════════════════════════════════════════
// Health
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn health_reports_open_sessions() {
    let backend = seeded("uid-1", None, MembershipTier::Full);
    let server = server(&backend);

    let body: Value = server.get("/health").await.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["openSessions"], 0);

    login(&server, "uid-1").await;
    let body: Value = server.get("/health").await.json();
    assert_eq!(body["openSessions"], 1);
}

#[tokio::test]
async fn responses_carry_a_correlation_id() {
    let server = server(&MockBackend::new());
    let response = server.get("/health").await;
    let id = response.header(CORRELATION_ID_HEADER);
    assert!(uuid::Uuid::parse_str(id.to_str().unwrap()).is_ok());
}

// ═══════════════════════════════════════════════════════════════════════
// Navigation
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn guests_are_sent_to_login() {
    let server = server(&MockBackend::new());

    for path in ["/app", "/app/dashboard", "/app/sessions", "/app/profile", "/app/admin"] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/app/login", "{path}");
    }
}

#[tokio::test]
async fn guests_see_the_login_page() {
    let server = server(&MockBackend::new());

    let response = server.get("/app/login").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let page: Value = response.json();
    assert_eq!(page["view"], "login");
    assert_eq!(page["nav"]["avatar"], Value::Null);
}

#[tokio::test]
async fn unknown_views_are_not_found() {
    let server = server(&MockBackend::new());
    let response = server.get("/app/ballroom").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn members_cannot_open_the_admin_panel() {
    let backend = seeded("uid-1", Some(Role::Member), MembershipTier::Full);
    let server = server(&backend);
    let signed_in = login(&server, "uid-1").await;
    let (name, value) = bearer(&signed_in.token);

    let response = server.get("/app/admin").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/app/dashboard");
}

#[tokio::test]
async fn admins_see_the_roster() {
    let backend = seeded("uid-1", Some(Role::Admin), MembershipTier::Full);
    backend
        .profiles
        .insert_member(fixtures::member("uid-2", None));
    let server = server(&backend);
    let signed_in = login(&server, "uid-1").await;
    assert_eq!(signed_in.access, Access::Admin);
    let (name, value) = bearer(&signed_in.token);

    let response = server.get("/app/admin").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let page: Value = response.json();
    assert_eq!(page["page"]["members"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn signed_in_members_skip_the_login_page() {
    let backend = seeded("uid-1", None, MembershipTier::Full);
    let server = server(&backend);
    let signed_in = login(&server, "uid-1").await;
    let (name, value) = bearer(&signed_in.token);

    let response = server.get("/app/login").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/app/dashboard");
}

#[tokio::test]
async fn dashboard_shows_tier_and_upcoming_count() {
    let backend = seeded("uid-1", None, MembershipTier::Student);
    backend
        .profiles
        .insert_session(fixtures::session("past", (2024, 12, 20), 19));
    for (id, day) in [("s1", 4), ("s2", 11), ("s3", 18)] {
        backend
            .profiles
            .insert_session(fixtures::session(id, (2025, 1, day), 19));
    }
    let server = server(&backend);
    let signed_in = login(&server, "uid-1").await;
    let (name, value) = bearer(&signed_in.token);

    let page: Value = server.get("/app/dashboard").add_header(name, value).await.json();
    assert_eq!(page["page"]["greeting"], "Welcome back, Jordan!");
    assert_eq!(page["page"]["membershipChip"], "STUDENT");
    assert_eq!(page["page"]["sessionCount"], 3);
    assert_eq!(page["page"]["memberSince"], "2023");
    assert_eq!(page["nav"]["avatar"], "J");
}

#[tokio::test]
async fn session_fetch_failure_shows_an_error_banner() {
    let backend = seeded("uid-1", None, MembershipTier::Full);
    backend
        .profiles
        .insert_session(fixtures::session("s1", (2025, 1, 4), 19));
    backend.profiles.fail_sessions(true);
    let server = server(&backend);
    let signed_in = login(&server, "uid-1").await;
    let (name, value) = bearer(&signed_in.token);

    let page: Value = server.get("/app/sessions").add_header(name, value).await.json();
    assert_eq!(page["page"]["banner"]["text"], "Failed to load sessions");
    assert!(page["page"]["cards"].as_array().unwrap().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Account
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn register_rejects_mismatched_passwords_before_calling_providers() {
    let backend = MockBackend::new();
    let server = server(&backend);

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": "sam@club.test",
            "password": "secret1",
            "confirmPassword": "secret2",
            "firstName": "Sam",
            "lastName": "Lee",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["message"], "Passwords do not match");
    assert_eq!(backend.gateway.calls().register, 0);
}

#[tokio::test]
async fn register_signs_the_new_member_in() {
    let backend = MockBackend::new();
    let server = server(&backend);

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": "sam@club.test",
            "password": "secret1",
            "confirmPassword": "secret1",
            "firstName": "Sam",
            "lastName": "Lee",
            "membershipType": "student",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let signed_in: SignedIn = response.json();
    assert_eq!(signed_in.access, Access::Member);
    assert_eq!(signed_in.redirect, "/app/dashboard");

    let stored = backend.profiles.member(&signed_in.member_id).unwrap();
    assert_eq!(stored.membership_type, MembershipTier::Student);
    assert_eq!(stored.role, Some(Role::Member));

    let (name, value) = bearer(&signed_in.token);
    let page: Value = server.get("/app/profile").add_header(name, value).await.json();
    assert_eq!(page["page"]["name"], "Sam Lee");
}

#[tokio::test]
async fn register_conflicts_on_a_taken_email() {
    let backend = seeded("uid-1", None, MembershipTier::Full);
    let server = server(&backend);

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": "uid-1@club.test",
            "password": "secret1",
            "confirmPassword": "secret1",
            "firstName": "Sam",
            "lastName": "Lee",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_rejects_a_wrong_password() {
    let backend = seeded("uid-1", None, MembershipTier::Full);
    let server = server(&backend);

    let correlation_id = uuid::Uuid::new_v4().to_string();
    let response = server
        .post("/api/auth/login")
        .add_header(
            HeaderName::from_static("x-correlation-id"),
            HeaderValue::from_str(&correlation_id).unwrap(),
        )
        .json(&json!({ "email": "uid-1@club.test", "password": "wrong-password" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.header(CORRELATION_ID_HEADER), correlation_id.as_str());
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid email or password");
    assert_eq!(body["correlationId"], correlation_id.as_str());
    assert_eq!(server.get("/health").await.json::<Value>()["openSessions"], 0);
}

#[tokio::test]
async fn logout_closes_the_session() {
    let backend = seeded("uid-1", None, MembershipTier::Full);
    let server = server(&backend);
    let signed_in = login(&server, "uid-1").await;

    let (name, value) = bearer(&signed_in.token);
    let response = server
        .post("/api/auth/logout")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let (name, value) = bearer(&signed_in.token);
    let response = server
        .put("/api/profile")
        .add_header(name, value)
        .json(&json!({ "phone": "07700 900999" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let (name, value) = bearer(&signed_in.token);
    let response = server.get("/app/dashboard").add_header(name, value).await;
    assert_eq!(location(&response), "/app/login");
}

#[tokio::test]
async fn api_requires_a_bearer_token() {
    let server = server(&MockBackend::new());

    let response = server.delete("/api/banner").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Not signed in");

    let (name, value) = bearer(&uuid::Uuid::new_v4().to_string());
    let response = server.delete("/api/banner").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_reset_is_accepted() {
    let backend = seeded("uid-1", None, MembershipTier::Full);
    let server = server(&backend);

    let response = server
        .post("/api/auth/password-reset")
        .json(&json!({ "email": "uid-1@club.test" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    assert_eq!(backend.gateway.reset_requests(), vec!["uid-1@club.test"]);
}

#[tokio::test]
async fn profile_update_returns_the_new_profile() {
    let backend = seeded("uid-1", None, MembershipTier::Full);
    let server = server(&backend);
    let signed_in = login(&server, "uid-1").await;
    let (name, value) = bearer(&signed_in.token);

    let response = server
        .put("/api/profile")
        .add_header(name, value)
        .json(&json!({ "firstName": "Jo", "membershipType": "student" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["name"], "Jo Price");
    assert_eq!(body["membershipType"], "student");
    assert_eq!(
        backend.profiles.member(&signed_in.member_id).unwrap().first_name,
        "Jo"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Booking
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn booking_stores_a_registration() {
    let backend = seeded("uid-1", None, MembershipTier::Full);
    backend
        .profiles
        .insert_session(fixtures::session("s1", (2025, 1, 4), 19));
    let server = server(&backend);
    let signed_in = login(&server, "uid-1").await;
    let (name, value) = bearer(&signed_in.token);

    let response = server
        .post("/api/sessions/s1/registrations")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let page: Value = response.json();
    assert_eq!(page["banner"]["text"], "Successfully registered for session!");
    assert_eq!(page["dialog"], Value::Null);

    let registrations = backend.profiles.registrations();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].session_id.as_str(), "s1");
    assert_eq!(registrations[0].member_id, signed_in.member_id);
}

#[tokio::test]
async fn failed_booking_keeps_the_dialog_open() {
    let backend = seeded("uid-1", None, MembershipTier::Full);
    backend
        .profiles
        .insert_session(fixtures::session("s1", (2025, 1, 4), 19));
    backend.profiles.fail_registrations(true);
    let server = server(&backend);
    let signed_in = login(&server, "uid-1").await;

    let (name, value) = bearer(&signed_in.token);
    let response = server
        .post("/api/sessions/s1/registrations")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let page: Value = response.json();
    assert_eq!(page["banner"]["text"], "Failed to register for session");
    assert_eq!(page["dialog"]["confirmEnabled"], true);
    assert!(backend.profiles.registrations().is_empty());

    let (name, value) = bearer(&signed_in.token);
    let page: Value = server.delete("/api/dialog").add_header(name, value).await.json();
    assert_eq!(page["dialog"], Value::Null);

    let (name, value) = bearer(&signed_in.token);
    let page: Value = server.delete("/api/banner").add_header(name, value).await.json();
    assert_eq!(page["banner"], Value::Null);
}

#[tokio::test]
async fn booking_an_unknown_session_is_not_found() {
    let backend = seeded("uid-1", None, MembershipTier::Full);
    let server = server(&backend);
    let signed_in = login(&server, "uid-1").await;
    let (name, value) = bearer(&signed_in.token);

    let response = server
        .post("/api/sessions/nope/registrations")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
