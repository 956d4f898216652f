// ============================================================================
// TOKEN FLOW TESTS - Emisión, validación y administración vía HTTP
// ============================================================================

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use qr_pass_ws::{config::Config, create_app_router, state::AppState};
use std::sync::Arc;
use tower::ServiceExt;

const BASE_URL: &str = "http://192.168.0.10:5000";

// ========================================================================
// HELPER FUNCTIONS
// ========================================================================

async fn setup_app(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config).await.expect("Failed to build app state"));
    (create_app_router(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Extrae el valor entre `marker` y la siguiente comilla doble
fn extract_after<'a>(html: &'a str, marker: &str) -> &'a str {
    let start = html.find(marker).expect("marker not found") + marker.len();
    let end = html[start..].find('"').expect("closing quote not found");
    &html[start..start + end]
}

fn decode_qr(png: &[u8]) -> String {
    let luma = image::load_from_memory(png).unwrap().to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare(luma);
    let grids = prepared.detect_grids();
    let grid = grids.first().expect("No QR grid detected");
    let (_, content) = grid.decode().unwrap();
    content
}

async fn issue(app: &Router, form: &str) -> (String, String) {
    let (status, html) = send(app, post_form(form)).await;
    assert_eq!(status, StatusCode::OK, "issuance failed: {}", html);

    let url = extract_after(&html, r#"class="validation-url" href=""#).to_string();
    let token = url
        .rsplit('/')
        .next()
        .expect("validation url without token")
        .to_string();
    (url, token)
}

// ========================================================================
// ISSUANCE
// ========================================================================

#[tokio::test]
async fn test_index_renders_form() {
    let (app, _) = setup_app(Config::for_tests(BASE_URL)).await;
    let (status, html) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"action="/generate""#));
    assert!(html.contains(r#"name="id_number""#));
}

#[tokio::test]
async fn test_generate_embeds_decodable_qr() {
    let (app, state) = setup_app(Config::for_tests(BASE_URL)).await;
    let (status, html) = send(&app, post_form("name=Ana&surname=Gomez&id_number=12345678")).await;
    assert_eq!(status, StatusCode::OK);

    let url = extract_after(&html, r#"class="validation-url" href=""#);
    let stored = state.store.list_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(url, format!("{}/validate/{}", BASE_URL, stored[0].token));

    let png = STANDARD
        .decode(extract_after(&html, "data:image/png;base64,"))
        .unwrap();
    assert_eq!(decode_qr(&png), url);

    assert!(html.contains("Ana"));
    assert!(html.contains("Gomez"));
    assert!(html.contains("12345678"));
}

#[tokio::test]
async fn test_missing_fields_rejected_without_record() {
    let (app, state) = setup_app(Config::for_tests(BASE_URL)).await;

    for body in [
        "surname=Gomez&id_number=12345678",
        "name=Ana&id_number=12345678",
        "name=Ana&surname=Gomez",
        "name=&surname=Gomez&id_number=12345678",
        "",
    ] {
        let (status, json) = send(&app, post_form(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["error"], "Todos los campos son requeridos");
    }

    assert!(state.store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_without_form_content_type_is_bad_request() {
    let (app, state) = setup_app(Config::for_tests(BASE_URL)).await;

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/generate")
        .body(Body::empty())
        .unwrap();
    let multipart = Request::builder()
        .method("POST")
        .uri("/generate")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
        .body(Body::from("--X--\r\n"))
        .unwrap();

    for request in [no_content_type, multipart] {
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["error"], "Todos los campos son requeridos");
    }

    assert!(state.store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_html_in_holder_fields_is_escaped() {
    let (app, _) = setup_app(Config::for_tests(BASE_URL)).await;
    let (status, html) = send(
        &app,
        post_form("name=%3Cb%3EAna%3C%2Fb%3E&surname=Gomez&id_number=1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("&lt;b&gt;Ana&lt;/b&gt;"));
    assert!(!html.contains("<b>Ana</b>"));
}

// ========================================================================
// VALIDATION
// ========================================================================

#[tokio::test]
async fn test_full_scenario_ana_gomez() {
    let (app, state) = setup_app(Config::for_tests(BASE_URL)).await;
    let (_, token) = issue(&app, "name=Ana&surname=Gomez&id_number=12345678").await;

    let (status, html) = send(&app, get(&format!("/validate/{}", token))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"data-outcome="success""#));
    assert!(html.contains("Ana"));
    assert!(html.contains("Gomez"));
    assert!(html.contains("12345678"));

    let stored = state.store.find_by_token(&token).await.unwrap();
    assert!(stored.is_used());
    assert!(stored.used_at.is_some());

    let (status, html) = send(&app, get(&format!("/validate/{}", token))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"data-outcome="already_used""#));
    assert!(html.contains("Este QR ya ha sido utilizado"));

    let unrelated = "Zq8Xw3Lm0P".repeat(4);
    assert_eq!(unrelated.len(), 40);
    let (status, html) = send(&app, get(&format!("/validate/{}", unrelated))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"data-outcome="invalid""#));
    assert!(html.contains("Token no válido"));
}

#[tokio::test]
async fn test_concurrent_http_validation_single_success() {
    let (app, _) = setup_app(Config::for_tests(BASE_URL)).await;
    let (_, token) = issue(&app, "name=Ana&surname=Gomez&id_number=12345678").await;

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let app = app.clone();
            let uri = format!("/validate/{}", token);
            tokio::spawn(async move { send(&app, get(&uri)).await })
        })
        .collect();

    let mut successes = 0;
    let mut already_used = 0;
    for handle in handles {
        let (status, html) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        if html.contains(r#"data-outcome="success""#) {
            successes += 1;
        } else if html.contains(r#"data-outcome="already_used""#) {
            already_used += 1;
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(already_used, 11);
}

#[tokio::test]
async fn test_unknown_token_does_not_mutate_store() {
    let (app, state) = setup_app(Config::for_tests(BASE_URL)).await;
    let (_, token) = issue(&app, "name=Ana&surname=Gomez&id_number=12345678").await;

    let (_, html) = send(&app, get("/validate/not-a-real-token")).await;
    assert!(html.contains(r#"data-outcome="invalid""#));

    let counts = state.store.count_by_status().await.unwrap();
    assert_eq!(counts.pending, 1);
    assert_eq!(counts.used, 0);
    assert!(!state.store.find_by_token(&token).await.unwrap().is_used());
}

// ========================================================================
// ADMIN / SYSTEM
// ========================================================================

#[tokio::test]
async fn test_admin_lists_newest_first() {
    let (app, _) = setup_app(Config::for_tests(BASE_URL)).await;
    let (_, first) = issue(&app, "name=Ana&surname=Gomez&id_number=111").await;
    let (_, second) = issue(&app, "name=Luis&surname=Perez&id_number=222").await;
    send(&app, get(&format!("/validate/{}", first))).await;

    let (status, html) = send(&app, get("/admin")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Total: 2"));
    assert!(html.contains("Usados: 1"));

    let first_pos = html.find(&first).unwrap();
    let second_pos = html.find(&second).unwrap();
    assert!(second_pos < first_pos);
}

#[tokio::test]
async fn test_admin_requires_configured_token() {
    let mut config = Config::for_tests(BASE_URL);
    config.admin_token = Some("s3cret".to_string());
    let (app, _) = setup_app(config).await;

    let (status, json) = send(&app, get("/admin")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["error"], "No autorizado");

    let wrong = Request::builder()
        .uri("/admin")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, wrong).await.0, StatusCode::UNAUTHORIZED);

    let authorized = Request::builder()
        .uri("/admin")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, authorized).await.0, StatusCode::OK);

    // El resto de rutas no requiere token
    assert_eq!(send(&app, get("/")).await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let (app, _) = setup_app(Config::for_tests(BASE_URL)).await;
    issue(&app, "name=Ana&surname=Gomez&id_number=12345678").await;

    let (status, json) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.contains("ok"));

    let (status, metrics) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(metrics.contains("qr_tokens_issued_total"));
}

#[tokio::test]
async fn test_metrics_use_route_templates() {
    let (app, _) = setup_app(Config::for_tests(BASE_URL)).await;
    let (_, token) = issue(&app, "name=Ana&surname=Gomez&id_number=12345678").await;
    send(&app, get(&format!("/validate/{}", token))).await;
    send(&app, get("/scan-label-1")).await;
    send(&app, get("/scan-label-2")).await;

    let (_, metrics) = send(&app, get("/metrics")).await;
    assert!(metrics.contains(r#"endpoint="/validate/:token""#));
    assert!(metrics.contains(r#"endpoint="unmatched""#));
    assert!(!metrics.contains(&token));
    assert!(!metrics.contains("scan-label"));
}

#[tokio::test]
async fn test_security_headers_present() {
    let (app, _) = setup_app(Config::for_tests(BASE_URL)).await;
    let response = app.clone().oneshot(get("/")).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers["content-security-policy"]
        .to_str()
        .unwrap()
        .contains("img-src 'self' data:"));
}
