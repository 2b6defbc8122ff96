use std::path::Path;
use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use serde_json::json;
use tempfile::TempDir;

use shortstash::config::Config;
use shortstash::services::{HomeService, RedirectService, ShortenService};
use shortstash::session::{CREATION_LIMIT_PER_WINDOW, SESSION_COOKIE_NAME, SessionManager};
use shortstash::storages::{
    LINK_TTL_SECS, Storage, StoredUrl, SweepTrigger, TempFileStorage,
};

const BASE_URL: &str = "http://localhost:8080/";

struct TestState {
    sessions: web::Data<SessionManager>,
    storage: web::Data<Arc<dyn Storage>>,
    sweep: web::Data<SweepTrigger>,
    config: web::Data<Config>,
}

fn test_state(dir: &Path, sweep_denominator: u32) -> TestState {
    let storage: Arc<dyn Storage> = Arc::new(TempFileStorage::new(dir.to_path_buf()).unwrap());
    TestState {
        sessions: web::Data::new(SessionManager::new()),
        storage: web::Data::new(storage),
        sweep: web::Data::new(SweepTrigger::new(sweep_denominator)),
        config: web::Data::new(Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            base_url: BASE_URL.to_string(),
            storage_dir: dir.to_path_buf(),
            cookie_secure: false,
            log_level: "info".to_string(),
            log_file: None,
        }),
    }
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.sessions.clone())
                .app_data($state.storage.clone())
                .app_data($state.sweep.clone())
                .app_data($state.config.clone())
                .route("/", web::get().to(HomeService::handle_index))
                .route("/", web::post().to(ShortenService::handle_create))
                .route("/{code}", web::get().to(RedirectService::handle_redirect)),
        )
        .await
    };
}

/// GET / to establish a session; returns (session cookie value, csrf token).
macro_rules! obtain_session {
    ($app:expr) => {{
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&$app, req).await;
        assert!(resp.status().is_success());
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE_NAME)
            .expect("session cookie missing")
            .value()
            .to_string();
        let body: serde_json::Value = test::read_body_json(resp).await;
        let token = body["csrf_token"].as_str().unwrap().to_string();
        (cookie, token)
    }};
}

macro_rules! post_create {
    ($cookie:expr, $url:expr, $token:expr) => {
        test::TestRequest::post()
            .uri("/")
            .cookie(Cookie::new(SESSION_COOKIE_NAME, $cookie.to_string()))
            .set_json(json!({ "url": $url, "csrf_token": $token }))
            .to_request()
    };
}

#[actix_rt::test]
async fn test_create_and_redirect() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(tmp.path(), 100);
    let app = init_app!(state);
    let (cookie, token) = obtain_session!(app);

    let url = "https://example.com/a/very/long/path";
    let resp = test::call_service(&app, post_create!(&cookie, url, &token)).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["original_url"], url);
    assert_eq!(body["total_in_session"], 1);

    let short_url = body["short_url"].as_str().unwrap();
    let code = short_url.strip_prefix(BASE_URL).unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(
        body["saved"].as_i64().unwrap(),
        url.len() as i64 - short_url.len() as i64
    );

    // 302 back to the stored URL
    let req = test::TestRequest::get()
        .uri(&format!("/{}", code))
        .cookie(Cookie::new(SESSION_COOKIE_NAME, cookie.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        resp.headers().get("Location").unwrap().to_str().unwrap(),
        url
    );
}

#[actix_rt::test]
async fn test_redirect_without_session_uses_shared_store() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(tmp.path(), 100);
    let app = init_app!(state);
    let (cookie, token) = obtain_session!(app);

    let url = "https://example.com/cross-browser";
    let resp = test::call_service(&app, post_create!(&cookie, url, &token)).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let code = body["short_url"]
        .as_str()
        .unwrap()
        .strip_prefix(BASE_URL)
        .unwrap()
        .to_string();

    // no cookie at all: a different browser resolving the same code
    let req = test::TestRequest::get()
        .uri(&format!("/{}", code))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        resp.headers().get("Location").unwrap().to_str().unwrap(),
        url
    );
}

#[actix_rt::test]
async fn test_redirect_unknown_code_is_404_page() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(tmp.path(), 100);
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/abc123").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    assert!(
        resp.headers()
            .get("Content-Type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
    let body = test::read_body(resp).await;
    let body = std::str::from_utf8(&body).unwrap();
    assert!(body.contains("not found or expired"));
}

#[actix_rt::test]
async fn test_redirect_expired_code_is_404() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(tmp.path(), 100);

    let created = Utc::now() - Duration::seconds(2 * LINK_TTL_SECS);
    state
        .storage
        .set(StoredUrl {
            code: "oldone".to_string(),
            url: "https://example.com/old".to_string(),
            created_at: created,
            expires_at: created + Duration::seconds(LINK_TTL_SECS),
        })
        .await
        .unwrap();

    let app = init_app!(state);
    let req = test::TestRequest::get().uri("/oldone").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    // lazy expiry removed the record on that access
    assert!(!tmp.path().join("oldone.json").exists());
}

#[actix_rt::test]
async fn test_create_rejects_invalid_json() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(tmp.path(), 100);
    let app = init_app!(state);
    let (cookie, _token) = obtain_session!(app);

    let req = test::TestRequest::post()
        .uri("/")
        .cookie(Cookie::new(SESSION_COOKIE_NAME, cookie))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("this is not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid JSON data");
}

#[actix_rt::test]
async fn test_create_rejects_bad_csrf() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(tmp.path(), 100);
    let app = init_app!(state);
    let (cookie, _token) = obtain_session!(app);

    let resp = test::call_service(
        &app,
        post_create!(&cookie, "https://example.com", "wrong-token"),
    )
    .await;
    assert_eq!(resp.status(), 403);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid request token");
}

#[actix_rt::test]
async fn test_create_rejects_missing_url() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(tmp.path(), 100);
    let app = init_app!(state);
    let (cookie, token) = obtain_session!(app);

    let resp = test::call_service(&app, post_create!(&cookie, "", &token)).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "URL is required");
}

#[actix_rt::test]
async fn test_create_rejects_private_hosts() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(tmp.path(), 100);
    let app = init_app!(state);
    let (cookie, token) = obtain_session!(app);

    for url in [
        "http://192.168.1.1/admin",
        "http://10.0.0.1",
        "http://127.0.0.1:8080",
        "http://localhost/secret",
        "ftp://example.com",
        "javascript:alert(1)",
    ] {
        let resp = test::call_service(&app, post_create!(&cookie, url, &token)).await;
        assert_eq!(resp.status(), 400, "expected 400 for {}", url);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid or unsafe URL");
    }
}

#[actix_rt::test]
async fn test_same_url_reuses_code() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(tmp.path(), 100);
    let app = init_app!(state);
    let (cookie, token) = obtain_session!(app);

    let url = "https://example.com/duplicated";
    let resp = test::call_service(&app, post_create!(&cookie, url, &token)).await;
    let first: serde_json::Value = test::read_body_json(resp).await;

    let resp = test::call_service(&app, post_create!(&cookie, url, &token)).await;
    let second: serde_json::Value = test::read_body_json(resp).await;

    assert_eq!(first["short_url"], second["short_url"]);
    assert_eq!(second["total_in_session"], 1);
}

#[actix_rt::test]
async fn test_rate_limit_rejects_eleventh_creation() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(tmp.path(), 100);
    let app = init_app!(state);
    let (cookie, token) = obtain_session!(app);

    for i in 0..CREATION_LIMIT_PER_WINDOW {
        let url = format!("https://example.com/page/{}", i);
        let resp = test::call_service(&app, post_create!(&cookie, &url, &token)).await;
        assert_eq!(resp.status(), 200, "creation {} should pass", i + 1);
    }

    let resp = test::call_service(
        &app,
        post_create!(&cookie, "https://example.com/one-too-many", &token),
    )
    .await;
    assert_eq!(resp.status(), 429);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Rate limit exceeded. Please wait a minute.");
}

#[actix_rt::test]
async fn test_clear_session() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(tmp.path(), 100);
    let app = init_app!(state);
    let (cookie, token) = obtain_session!(app);

    let resp = test::call_service(
        &app,
        post_create!(&cookie, "https://example.com/to-clear", &token),
    )
    .await;
    assert_eq!(resp.status(), 200);

    // wrong token: rejected, mapping untouched
    let req = test::TestRequest::get()
        .uri("/?clear=1&csrf_token=wrong")
        .cookie(Cookie::new(SESSION_COOKIE_NAME, cookie.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::get()
        .uri(&format!("/?clear=1&csrf_token={}", token))
        .cookie(Cookie::new(SESSION_COOKIE_NAME, cookie.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        resp.headers().get("Location").unwrap().to_str().unwrap(),
        "/"
    );

    let req = test::TestRequest::get()
        .uri("/")
        .cookie(Cookie::new(SESSION_COOKIE_NAME, cookie))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["total_in_session"], 0);
}

#[actix_rt::test]
async fn test_forced_sweep_on_creation() {
    let tmp = TempDir::new().unwrap();
    // denominator 1: every creation triggers a sweep
    let state = test_state(tmp.path(), 1);

    let created = Utc::now() - Duration::seconds(2 * LINK_TTL_SECS);
    state
        .storage
        .set(StoredUrl {
            code: "sweepme".to_string(),
            url: "https://example.com/stale".to_string(),
            created_at: created,
            expires_at: created + Duration::seconds(LINK_TTL_SECS),
        })
        .await
        .unwrap();
    assert!(tmp.path().join("sweepme.json").exists());

    let app = init_app!(state);
    let (cookie, token) = obtain_session!(app);
    let resp = test::call_service(
        &app,
        post_create!(&cookie, "https://example.com/fresh", &token),
    )
    .await;
    assert_eq!(resp.status(), 200);

    assert!(!tmp.path().join("sweepme.json").exists());
}

#[actix_rt::test]
async fn test_health_check() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(tmp.path(), 100);
    let app = test::init_service(
        App::new()
            .app_data(state.storage.clone())
            .app_data(web::Data::new(shortstash::services::AppStartTime {
                start_datetime: Utc::now(),
            }))
            .route(
                "/health",
                web::get().to(shortstash::services::HealthService::health_check),
            ),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["storage"]["backend"], "temp_file");
}

#[actix_rt::test]
async fn test_session_cookie_attributes() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(tmp.path(), 100);
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .unwrap();

    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(
        cookie.same_site(),
        Some(actix_web::cookie::SameSite::Strict)
    );
}
