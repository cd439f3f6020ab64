use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use ielts_backend::db::operations::{boards, content, BoardType, ContentKind};

mod common;

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": common::ADMIN_USER, "password": common::ADMIN_PASS }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_connected_database() {
    let (app, _) = common::create_test_app().await;

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");

    let (status, _) = send(&app, get("/health/live")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let (app, _) = common::create_test_app().await;

    let (status, body) = send(&app, get("/api/nothing-here")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn admin_routes_require_a_session() {
    let (app, _) = common::create_test_app().await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/admin/boards", None, json!({ "name": "x", "type": "vocabulary" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        json_request("POST", "/api/admin/boards", Some("not.a.token"), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let (app, _) = common::create_test_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": common::ADMIN_USER, "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn login_sets_cookie_that_authorizes_admin_calls() {
    let (app, _) = common::create_test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": common::ADMIN_USER, "password": common::ADMIN_PASS }),
        ))
        .await
        .unwrap();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("ielts_session="));

    let req = Request::builder()
        .method("POST")
        .uri("/api/admin/grammar")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, &cookie)
        .body(Body::from(json!({ "title": "Present perfect" }).to_string()))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Present perfect");

    let req = Request::builder()
        .uri("/api/auth/session")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["data"]["authenticated"], true);
    assert_eq!(body["data"]["user"]["username"], common::ADMIN_USER);
}

#[tokio::test]
async fn missing_required_fields_are_rejected() {
    let (app, _) = common::create_test_app().await;
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/admin/boards", Some(&token), json!({ "type": "vocabulary" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        json_request("POST", "/api/admin/boards", Some(&token), json!({ "name": "B", "type": "poems" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        json_request("POST", "/api/admin/vocabulary", Some(&token), json!({ "word": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn board_lifecycle_over_http() {
    let (app, manager) = common::create_test_app().await;
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/admin/vocabulary", Some(&token), json!({ "id": "v1", "word": "mitigate" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "v1");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/boards",
            Some(&token),
            json!({ "id": "b1", "name": "Academic verbs", "type": "vocabulary" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["itemIds"], json!([]));

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            json_request("POST", "/api/admin/boards/b1/items", Some(&token), json!({ "itemId": "v1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["itemIds"], json!(["v1"]));
    }

    let (status, body) = send(&app, get("/api/boards?type=vocabulary")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let req = Request::builder()
        .method("DELETE")
        .uri("/api/admin/boards/b1")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], true);
    assert_eq!(body["data"]["children"][0]["status"], "deleted");

    let proxy = manager.proxy();
    assert!(boards::get_board(proxy, "b1").await.unwrap().is_none());
    assert!(!content::item_exists(proxy, ContentKind::Vocabulary, "v1").await.unwrap());

    let (status, _) = send(&app, get("/api/vocabulary/v1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lessons_only_attach_to_grammar_boards() {
    let (app, manager) = common::create_test_app().await;
    let token = login(&app).await;
    common::board(manager.proxy(), "vb", BoardType::Vocabulary, &[]).await;
    common::board(manager.proxy(), "gb", BoardType::Grammar, &[]).await;
    common::grammar_item(manager.proxy(), "g1").await;

    let (status, _) = send(
        &app,
        json_request("POST", "/api/admin/lessons", Some(&token), json!({ "boardId": "vb", "title": "L" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/lessons",
            Some(&token),
            json!({ "id": "l1", "boardId": "gb", "title": "Tenses", "itemIds": ["g1"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/api/lessons/l1/items")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], "g1");

    let (_, body) = send(&app, get("/api/boards/gb/lessons")).await;
    assert_eq!(body["data"][0]["id"], "l1");
}

#[tokio::test]
async fn maintenance_endpoints_run_sweeps() {
    let (app, manager) = common::create_test_app().await;
    let token = login(&app).await;
    let proxy = manager.proxy();
    common::vocab(proxy, "v1").await;
    common::vocab(proxy, "v3").await;
    common::board(proxy, "b1", BoardType::Vocabulary, &["v1"]).await;
    common::board(proxy, "b2", BoardType::Vocabulary, &[]).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/maintenance/orphans?kind=vocabulary&dryRun=true",
            Some(&token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["orphaned"], 1);
    assert_eq!(body["data"][0]["deleted"], 0);
    assert!(content::item_exists(proxy, ContentKind::Vocabulary, "v3").await.unwrap());

    let (status, body) = send(
        &app,
        json_request("POST", "/api/admin/maintenance/orphans", Some(&token), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert!(!content::item_exists(proxy, ContentKind::Vocabulary, "v3").await.unwrap());

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/maintenance/empty-boards?type=grammar",
            Some(&token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/maintenance/empty-boards?type=vocabulary",
            Some(&token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 1);
    assert!(boards::get_board(proxy, "b2").await.unwrap().is_none());
}

#[tokio::test]
async fn dictionary_rejects_blank_word() {
    let (app, _) = common::create_test_app().await;

    let (status, body) = send(&app, get("/api/dictionary/%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
