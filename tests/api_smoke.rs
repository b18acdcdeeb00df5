//! End-to-end smoke over the HTTP surface: the real routing tree, auth
//! middleware, and handlers wired to the in-process store. Windows are
//! opened wide through the config so the suite is not wall-clock bound.

use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{test, App};
use chrono::NaiveTime;
use sams::auth::jwt::generate_access_token;
use sams::config::Config;
use sams::engine::{AnnouncementService, AttendanceEngine};
use sams::model::role::Role;
use sams::routes;
use sams::store::MemoryStore;
use serde_json::Value;
use std::sync::Arc;

const SECRET: &str = "test-secret";

fn wide_open_config() -> Config {
    let t = |h, m, s| NaiveTime::from_hms_opt(h, m, s).unwrap();
    Config {
        database_url: String::new(),
        jwt_secret: SECRET.to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        check_in_open: t(0, 0, 0),
        check_in_close: t(23, 59, 59),
        check_out_open: t(0, 0, 0),
        check_out_close: t(23, 59, 59),
        late_after: t(23, 59, 59),
        page_size: 5,
        show_all_cap: 100,
        rate_action_per_min: 60,
        rate_protected_per_min: 1000,
        api_prefix: "/api".to_string(),
    }
}

macro_rules! test_app {
    ($config:expr, $store:expr) => {{
        let engine = AttendanceEngine::new(Arc::clone(&$store), $config.attendance_policy());
        let announcements = AnnouncementService::new(Arc::clone(&$store), $config.page_size);
        let config_data = $config.clone();
        test::init_service(
            App::new()
                .app_data(Data::from(Arc::clone(&$store)))
                .app_data(Data::new(engine))
                .app_data(Data::new(announcements))
                .app_data(Data::new($config.clone()))
                .configure(move |cfg| routes::configure::<MemoryStore>(cfg, config_data.clone())),
        )
        .await
    }};
}

fn bearer(user_id: u64, name: &str, role: Role) -> (&'static str, String) {
    (
        "Authorization",
        format!(
            "Bearer {}",
            generate_access_token(user_id, name.to_string(), role, SECRET, 900)
        ),
    )
}

fn peer() -> std::net::SocketAddr {
    "127.0.0.1:9999".parse().unwrap()
}

#[actix_web::test]
async fn check_in_succeeds_then_rejects_the_duplicate() {
    let config = wide_open_config();
    let store = Arc::new(MemoryStore::new());
    let app = test_app!(config, store);

    let req = test::TestRequest::post()
        .uri("/api/attendance")
        .insert_header(bearer(7001, "Nadia", Role::Teacher))
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Checked in successfully");
    assert_eq!(body["record"]["teacher_id"], 7001);

    let req = test::TestRequest::post()
        .uri("/api/attendance")
        .insert_header(bearer(7001, "Nadia", Role::Teacher))
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "you have already checked in today");
}

#[actix_web::test]
async fn check_out_follows_check_in_and_records_are_listed() {
    let config = wide_open_config();
    let store = Arc::new(MemoryStore::new());
    let app = test_app!(config, store);

    // Checking out before checking in is rejected.
    let req = test::TestRequest::put()
        .uri("/api/attendance")
        .insert_header(bearer(7002, "Rafid", Role::Teacher))
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/attendance")
        .insert_header(bearer(7002, "Rafid", Role::Teacher))
        .peer_addr(peer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::put()
        .uri("/api/attendance")
        .insert_header(bearer(7002, "Rafid", Role::Teacher))
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["record"]["check_out_time"].is_string());

    let req = test::TestRequest::get()
        .uri("/api/attendance/records")
        .insert_header(bearer(7002, "Rafid", Role::Teacher))
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["records"].as_array().unwrap().len(), 1);
    assert_eq!(body["total"], 1);
    assert_eq!(body["from_cache"], false);
}

#[actix_web::test]
async fn missing_or_garbage_tokens_are_unauthorized() {
    let config = wide_open_config();
    let store = Arc::new(MemoryStore::new());
    let app = test_app!(config, store);

    let req = test::TestRequest::get()
        .uri("/api/attendance/records")
        .peer_addr(peer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/api/attendance/records")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .peer_addr(peer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn role_gates_hold_for_teacher_tokens() {
    let config = wide_open_config();
    let store = Arc::new(MemoryStore::new());
    let app = test_app!(config, store);

    for (method, uri) in [
        (test::TestRequest::get(), "/api/users"),
        (test::TestRequest::get(), "/api/attendance/summary"),
        (test::TestRequest::get(), "/api/attendance/report"),
        (test::TestRequest::post(), "/api/announcements"),
    ] {
        let mut req = method
            .uri(uri)
            .insert_header(bearer(7003, "Mahir", Role::Teacher))
            .peer_addr(peer());
        if uri == "/api/announcements" {
            req = req.set_json(serde_json::json!({ "text": "hi" }));
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[actix_web::test]
async fn announcement_lifecycle_respects_authorship() {
    let config = wide_open_config();
    let store = Arc::new(MemoryStore::new());
    let app = test_app!(config, store);
    let author = || bearer(8001, "Head A", Role::HeadTeacher);
    let other = || bearer(8002, "Head B", Role::HeadTeacher);

    let req = test::TestRequest::post()
        .uri("/api/announcements")
        .insert_header(author())
        .peer_addr(peer())
        .set_json(serde_json::json!({ "text": "term starts Monday" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let posted: Value = test::read_body_json(resp).await;
    let id = posted["id"].as_u64().unwrap();
    assert_eq!(posted["pinned"], false);

    // Another head teacher is still not the author.
    let req = test::TestRequest::put()
        .uri(&format!("/api/announcements/{id}"))
        .insert_header(other())
        .peer_addr(peer())
        .set_json(serde_json::json!({ "text": "defaced" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::put()
        .uri(&format!("/api/announcements/{id}/pin"))
        .insert_header(author())
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["pinned"], true);

    let req = test::TestRequest::get()
        .uri("/api/announcements")
        .insert_header(other())
        .peer_addr(peer())
        .to_request();
    let board: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(board["pinned"].as_array().unwrap().len(), 1);
    assert_eq!(board["unpinned"].as_array().unwrap().len(), 0);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/announcements/{id}"))
        .insert_header(author())
        .peer_addr(peer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/announcements/{id}"))
        .insert_header(author())
        .peer_addr(peer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn profile_is_created_on_first_touch_and_roles_are_managed() {
    let config = wide_open_config();
    let store = Arc::new(MemoryStore::new());
    let app = test_app!(config, store);

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(7004, "Tania", Role::Teacher))
        .peer_addr(peer())
        .to_request();
    let profile: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(profile["id"], 7004);
    assert_eq!(profile["role"], "teacher");

    let req = test::TestRequest::put()
        .uri("/api/users/7004/role")
        .insert_header(bearer(8001, "Head A", Role::HeadTeacher))
        .peer_addr(peer())
        .set_json(serde_json::json!({ "role": "headTeacher" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(bearer(8001, "Head A", Role::HeadTeacher))
        .peer_addr(peer())
        .to_request();
    let users: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let data = users["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["role"], "headTeacher");

    // Unknown profile id is reported, not silently ignored.
    let req = test::TestRequest::put()
        .uri("/api/users/9999/role")
        .insert_header(bearer(8001, "Head A", Role::HeadTeacher))
        .peer_addr(peer())
        .set_json(serde_json::json!({ "role": "teacher" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}
