//! End-to-end tests for the audit layers.
//!
//! Each test assembles a router through `ControllerRegistry`, drives it with
//! `tower::ServiceExt::oneshot`, and inspects the lines captured by a
//! `MemorySink`.

use adminlog_audit::{
    AuditConfig, AuditInterceptor, ControllerRegistry, FailurePolicy, IdentityPolicy,
    JwtResolver, MemorySink, SubjectClaims, audit_admin_operation, mark_failed,
};
use axum::{
    Json, Router,
    body::{Body, Bytes},
    http::{Request, StatusCode, header},
    extract::Path,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

const SECRET: &str = "integration_test_secret_0123456789";

struct Failure;

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::NOT_FOUND, "user not found").into_response();
        mark_failed(&mut response);
        response
    }
}

static HANDLER_CALLS: AtomicUsize = AtomicUsize::new(0);

fn admin_routes() -> Router {
    Router::new()
        .route("/admin/users", get(|| async { Json(json!([{"id": 1, "role": "USER"}])) }))
        .route(
            "/admin/users/{id}/role",
            patch(|Json(_body): Json<Value>| async { Json(json!({"ok": true})) }),
        )
        .route(
            "/admin/raw",
            post(|| async {
                ([(header::CONTENT_TYPE, "application/json")], "{ \"ok\" :  true }")
            }),
        )
        .route("/admin/text", post(|| async { "deleted" }))
        .route(
            "/admin/comments/{id}",
            delete(|Path(_id): Path<u64>| async { StatusCode::NO_CONTENT }),
        )
        .route(
            "/admin/conflict",
            post(|| async { (StatusCode::CONFLICT, "already deleted") }),
        )
        .route(
            "/admin/counted",
            post(|| async {
                HANDLER_CALLS.fetch_add(1, Ordering::SeqCst);
                "counted"
            }),
        )
        .route("/admin/binary", get(|| async { Bytes::from_static(&[0xff, 0xfe, 0xfd]) }))
        .route(
            "/admin/missing",
            post(|| async { Err::<Json<Value>, _>(Failure) }),
        )
        .route(
            "/admin/panic",
            get(|| async {
                if true {
                    panic!("handler exploded");
                }
                "unreachable"
            }),
        )
}

fn user_routes() -> Router {
    Router::new()
        .route(
            "/users",
            get(|| async { Json(json!([{"id": 1}])) })
                .post(|Json(body): Json<Value>| async move { Json(body) }),
        )
}

fn app_with(config: AuditConfig) -> (Router, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let interceptor = AuditInterceptor::new(
        config,
        Arc::new(JwtResolver::new(SECRET)),
        sink.clone(),
    );

    let app = ControllerRegistry::new(Arc::new(interceptor))
        .controller("UserAdminController", admin_routes())
        .controller("UserController", user_routes())
        .into_router();

    (app, sink)
}

fn app() -> (Router, Arc<MemorySink>) {
    app_with(AuditConfig::default())
}

fn token(sub: &str) -> String {
    let claims = SubjectClaims {
        sub: sub.to_string(),
        exp: Some(4_102_444_800),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "localhost:8080")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authorized(method: &str, uri: &str, body: &str, sub: &str) -> Request<Body> {
    let mut req = request(method, uri, body);
    req.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token(sub)).parse().unwrap(),
    );
    req
}

fn audit_lines(sink: &MemorySink) -> Vec<String> {
    sink.lines()
        .into_iter()
        .filter(|l| l.starts_with("[LogAOP]"))
        .collect()
}

fn path_lines(sink: &MemorySink) -> Vec<String> {
    sink.lines()
        .into_iter()
        .filter(|l| !l.starts_with("[LogAOP]"))
        .collect()
}

/// Everything before the phase marker: tag, timestamp, method, url, identity.
fn prefix_before<'a>(line: &'a str, phase: &str) -> &'a str {
    let marker = format!("[{}]", phase);
    let idx = line.find(&marker).expect("phase marker present");
    &line[..idx]
}

async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_non_admin_operation_produces_no_audit_lines() {
    let (app, sink) = app();

    let res = app
        .oneshot(request("POST", "/users", r#"{"name":"kim"}"#))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_bytes(res).await, Bytes::from_static(br#"{"name":"kim"}"#));
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_admin_get_never_logs_request_body() {
    let (app, sink) = app();

    let res = app
        .oneshot(request("GET", "/admin/users", r#"{"ignored":true}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let lines = audit_lines(&sink);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("[GET][http://localhost:8080/admin/users][][request]"));
    assert!(lines[1].ends_with(r#"[response][Body: [{"id":1,"role":"USER"}]]"#));
}

#[tokio::test]
async fn test_admin_request_body_is_canonical() {
    let (app, sink) = app();

    let res = app
        .oneshot(request(
            "PATCH",
            "/admin/users/3/role",
            "{\n  \"role\": \"ADMIN\",\n  \"reason\": \"promotion\"\n}",
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let lines = audit_lines(&sink);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(r#"[request][Body: {"reason":"promotion","role":"ADMIN"}]"#));
}

#[tokio::test]
async fn test_response_line_body() {
    let (app, sink) = app();

    app.oneshot(request("PATCH", "/admin/users/3/role", r#"{"role":"ADMIN"}"#))
        .await
        .unwrap();

    let lines = audit_lines(&sink);
    assert!(lines[1].ends_with(r#"[response][Body: {"ok":true}]"#));
}

#[tokio::test]
async fn test_handler_failure_logs_request_only() {
    let (app, sink) = app();

    let res = app
        .oneshot(request("POST", "/admin/missing", r#"{"id":9}"#))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(res).await, Bytes::from_static(b"user not found"));

    let lines = audit_lines(&sink);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("[request]"));
}

#[tokio::test]
async fn test_path_rejection_logs_request_only() {
    let (app, sink) = app();

    let res = app
        .oneshot(request("DELETE", "/admin/comments/abc", ""))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let lines = audit_lines(&sink);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("[DELETE][http://localhost:8080/admin/comments/abc][][request]"));
}

#[tokio::test]
async fn test_valid_path_logs_both_phases() {
    let (app, sink) = app();

    let res = app
        .oneshot(request("DELETE", "/admin/comments/7", ""))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let lines = audit_lines(&sink);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with("[response]"));
}

#[tokio::test]
async fn test_unregistered_method_logs_request_only() {
    let (app, sink) = app();

    let res = app
        .oneshot(request("POST", "/admin/users", r#"{"id":5}"#))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(!audit_lines(&sink).iter().any(|l| l.contains("[response]")));
}

#[tokio::test]
async fn test_unmarked_error_status_logs_request_only() {
    let (app, sink) = app();

    let res = app
        .oneshot(request("POST", "/admin/conflict", ""))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_bytes(res).await, Bytes::from_static(b"already deleted"));

    let lines = audit_lines(&sink);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("[request]"));
}

#[tokio::test]
async fn test_handler_panic_logs_request_only_and_still_responds() {
    let (app, sink) = app();

    let res = app
        .oneshot(request("GET", "/admin/panic", ""))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let lines = audit_lines(&sink);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("[request]"));
}

#[tokio::test]
async fn test_phases_share_timestamp_and_identity() {
    let (app, sink) = app();

    app.oneshot(authorized(
        "PATCH",
        "/admin/users/3/role",
        r#"{"role":"ADMIN"}"#,
        "user-42",
    ))
    .await
    .unwrap();

    let lines = audit_lines(&sink);
    assert_eq!(lines.len(), 2);

    let request_prefix = prefix_before(&lines[0], "request");
    let response_prefix = prefix_before(&lines[1], "response");
    assert_eq!(request_prefix, response_prefix);
    assert!(request_prefix.ends_with("[user-42]"));
}

#[tokio::test]
async fn test_identity_empty_without_authorization() {
    let (app, sink) = app();

    app.oneshot(request("GET", "/admin/users", "")).await.unwrap();

    let lines = audit_lines(&sink);
    assert!(prefix_before(&lines[0], "request").ends_with("[http://localhost:8080/admin/users][]"));
}

#[tokio::test]
async fn test_malformed_authorization_is_lenient_by_default() {
    let (app, sink) = app();

    let mut req = request("GET", "/admin/users", "");
    req.headers_mut()
        .insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(audit_lines(&sink)[0].ends_with("][][request]"));
}

#[tokio::test]
async fn test_strict_identity_rejects_malformed_credential() {
    let (app, sink) = app_with(AuditConfig {
        identity_policy: IdentityPolicy::Strict,
        ..Default::default()
    });

    let mut req = request("GET", "/admin/users", "");
    req.headers_mut()
        .insert(header::AUTHORIZATION, "Bearer not-a-jwt".parse().unwrap());

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(audit_lines(&sink).is_empty());
}

#[tokio::test]
async fn test_path_logger_admin_prefix_only() {
    let (app, sink) = app();

    app.clone()
        .oneshot(request("GET", "/admin/users", ""))
        .await
        .unwrap();
    app.oneshot(request("GET", "/users", "")).await.unwrap();

    let lines = path_lines(&sink);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with('['));
    assert!(lines[0].ends_with("][/admin/users]"));
}

#[tokio::test]
async fn test_client_receives_handler_bytes_exactly() {
    let (app, sink) = app();

    let res = app
        .oneshot(request("POST", "/admin/raw", r#"{"x":1}"#))
        .await
        .unwrap();

    assert_eq!(
        body_bytes(res).await,
        Bytes::from_static(b"{ \"ok\" :  true }")
    );
    assert!(audit_lines(&sink)[1].ends_with(r#"[Body: {"ok":true}]"#));
}

#[tokio::test]
async fn test_plain_text_response_is_quoted() {
    let (app, sink) = app();

    app.oneshot(request("POST", "/admin/text", "")).await.unwrap();

    let lines = audit_lines(&sink);
    assert_eq!(lines.len(), 2);
    assert!(!lines[0].contains("[Body:"));
    assert!(lines[1].ends_with(r#"[response][Body: "deleted"]"#));
}

#[tokio::test]
async fn test_malformed_body_isolated_by_default() {
    let (app, sink) = app();
    let before = HANDLER_CALLS.load(Ordering::SeqCst);

    let res = app
        .oneshot(request("POST", "/admin/counted", "{broken"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(HANDLER_CALLS.load(Ordering::SeqCst) > before);

    let lines = audit_lines(&sink);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("[request]"));
}

#[tokio::test]
async fn test_malformed_body_propagates_when_configured() {
    let (app, sink) = app_with(AuditConfig {
        failure_policy: FailurePolicy::Propagate,
        ..Default::default()
    });

    let res = app
        .oneshot(request("POST", "/admin/text", "{broken"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(audit_lines(&sink).is_empty());
}

#[tokio::test]
async fn test_unserializable_response_propagates_when_configured() {
    let (app, sink) = app_with(AuditConfig {
        failure_policy: FailurePolicy::Propagate,
        ..Default::default()
    });

    let res = app
        .oneshot(request("GET", "/admin/binary", ""))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(audit_lines(&sink).len(), 1);
}

#[tokio::test]
async fn test_unserializable_response_isolated_keeps_bytes() {
    let (app, sink) = app();

    let res = app
        .oneshot(request("GET", "/admin/binary", ""))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_bytes(res).await, Bytes::from_static(&[0xff, 0xfe, 0xfd]));

    let lines = audit_lines(&sink);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with("[response]"));
}

#[tokio::test]
async fn test_interceptor_without_body_cache_is_environment_error() {
    let sink = Arc::new(MemorySink::new());
    let interceptor = Arc::new(AuditInterceptor::new(
        AuditConfig::default(),
        Arc::new(JwtResolver::new(SECRET)),
        sink.clone(),
    ));

    let app: Router = Router::new()
        .route("/admin/users", get(|| async { "[]" }))
        .route_layer(middleware::from_fn_with_state(
            interceptor,
            audit_admin_operation,
        ));

    let res = app
        .oneshot(request("GET", "/admin/users", ""))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (app, _sink) = app_with(AuditConfig {
        max_body_bytes: 8,
        ..Default::default()
    });

    let res = app
        .oneshot(request("POST", "/users", r#"{"name":"much too long"}"#))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_oversized_response_is_server_error() {
    let (app, sink) = app_with(AuditConfig {
        max_body_bytes: 16,
        ..Default::default()
    });

    let res = app
        .oneshot(request("GET", "/admin/users", ""))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let lines = audit_lines(&sink);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("[request]"));
}

#[tokio::test]
async fn test_disabled_config_is_silent() {
    let (app, sink) = app_with(AuditConfig {
        enabled: false,
        ..Default::default()
    });

    let res = app
        .oneshot(request("PATCH", "/admin/users/1/role", r#"{"role":"ADMIN"}"#))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_concurrent_requests_keep_their_own_context() {
    let (app, sink) = app();
    let mut tasks = tokio::task::JoinSet::new();

    for i in 0..16 {
        let app = app.clone();
        tasks.spawn(async move {
            let uri = format!("/admin/users/{}/role", i);
            let body = format!(r#"{{"role":"R{}"}}"#, i);
            app.oneshot(authorized("PATCH", &uri, &body, &format!("user-{}", i)))
                .await
                .unwrap()
        });
    }
    while let Some(res) = tasks.join_next().await {
        assert_eq!(res.unwrap().status(), StatusCode::OK);
    }

    let lines = audit_lines(&sink);
    assert_eq!(lines.len(), 32);

    for i in 0..16 {
        let url = format!("[http://localhost:8080/admin/users/{}/role][user-{}]", i, i);
        let mine: Vec<_> = lines.iter().filter(|l| l.contains(&url)).collect();
        assert_eq!(mine.len(), 2);

        let request = mine.iter().find(|l| l.contains("[request]")).unwrap();
        assert!(request.ends_with(&format!(r#"[Body: {{"role":"R{}"}}]"#, i)));
    }
}
