//! Upload relay against a local stand-in for the automation webhook

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{Request, StatusCode},
    routing::post,
    Router,
};
use cmon_common::events::EventBus;
use cmon_common::models::NewCase;
use cmon_common::{db, time};
use cmon_server::relay::RelayClient;
use cmon_server::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::util::ServiceExt;
use uuid::Uuid;

/// (field name, file name, text value) seen by the fake webhook
type Seen = Arc<Mutex<Vec<(String, Option<String>, Option<String>)>>>;

#[derive(Clone)]
struct Webhook {
    seen: Seen,
    reply: StatusCode,
}

async fn receive(State(hook): State<Webhook>, mut multipart: Multipart) -> StatusCode {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let text = if file_name.is_some() {
            let _ = field.bytes().await;
            None
        } else {
            field.text().await.ok()
        };
        hook.seen.lock().unwrap().push((name, file_name, text));
    }
    hook.reply
}

/// Start a fake webhook on an ephemeral port, returning its URL
async fn spawn_webhook(reply: StatusCode) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/webhook", post(receive))
        .with_state(Webhook {
            seen: seen.clone(),
            reply,
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/webhook", addr), seen)
}

async fn app_with_relay(url: &str) -> Router {
    app_and_pool(url).await.0
}

async fn app_and_pool(url: &str) -> (Router, SqlitePool) {
    let pool = db::init_memory_database().await.unwrap();
    let relay = RelayClient::new(url, Duration::from_secs(5)).unwrap();
    let app = build_router(AppState::new(pool.clone(), EventBus::new(16)).with_relay(Some(relay)));
    (app, pool)
}

fn follow_up_request(user: Uuid, case_id: Uuid) -> Request<Body> {
    let boundary = "follow-up-boundary";
    let mut body = String::new();
    for (name, value) in [
        ("uploadType", "follow-up".to_string()),
        ("caseId", case_id.to_string()),
        ("caseNumber", "PIL/2243/2025".to_string()),
        ("documentType", "affidavit".to_string()),
    ] {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            boundary, name, value
        ));
    }
    body.push_str(&format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"affidavit.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\n\
         %PDF-1.4 test\r\n\
         --{b}--\r\n",
        b = boundary
    ));
    Request::builder()
        .method("POST")
        .uri("/api/uploads")
        .header("x-user-id", user.to_string())
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap()
}

fn new_case() -> NewCase {
    NewCase {
        case_number: "PIL/2243/2025".to_string(),
        petitioner: "Arvind Kumar".to_string(),
        ..Default::default()
    }
}

fn bundle_request(user: Uuid) -> Request<Body> {
    let boundary = "relay-test-boundary";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"caseNumber\"\r\n\r\n\
         WP/1170/2025\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"courtOrder\"; filename=\"order.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\n\
         %PDF-1.4 test\r\n\
         --{b}--\r\n",
        b = boundary
    );
    Request::builder()
        .method("POST")
        .uri("/api/uploads")
        .header("x-user-id", user.to_string())
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_order_bundle_relayed_with_owner_and_paths() {
    let (url, seen) = spawn_webhook(StatusCode::OK).await;
    let app = app_with_relay(&url).await;
    let user = Uuid::new_v4();

    let response = app.oneshot(bundle_request(user)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let receipt = json_body(response).await;
    assert_eq!(receipt["upload_type"], "order-bundle");
    assert_eq!(receipt["relay_status"], 200);
    assert_eq!(receipt["stored_paths"].as_array().unwrap().len(), 1);

    let seen = seen.lock().unwrap().clone();
    let text = |name: &str| {
        seen.iter()
            .find(|(field, _, _)| field == name)
            .and_then(|(_, _, value)| value.clone())
    };
    assert_eq!(text("userId"), Some(user.to_string()));
    assert_eq!(text("uploadType").as_deref(), Some("order-bundle"));
    let path = text("courtOrderFilePath").unwrap();
    assert!(path.starts_with(&format!("{}/", user)));
    assert!(path.ends_with(".pdf"));

    let (_, file_name, _) = seen
        .iter()
        .find(|(field, _, _)| field == "courtOrder")
        .expect("court order part forwarded");
    assert!(file_name.as_deref().unwrap().starts_with("court-order-"));
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let (url, _) = spawn_webhook(StatusCode::INTERNAL_SERVER_ERROR).await;
    let app = app_with_relay(&url).await;

    let response = app.oneshot(bundle_request(Uuid::new_v4())).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "TRANSIENT_IO");
    assert_eq!(body["error"]["retryable"], true);
}

#[tokio::test]
async fn test_follow_up_for_own_case_is_relayed() {
    let (url, seen) = spawn_webhook(StatusCode::OK).await;
    let (app, pool) = app_and_pool(&url).await;
    let user = Uuid::new_v4();
    let case = db::create_case(&pool, user, &new_case(), time::now()).await.unwrap();

    let response = app.oneshot(follow_up_request(user, case.id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let seen = seen.lock().unwrap().clone();
    assert!(seen
        .iter()
        .any(|(field, _, value)| field == "caseId" && value.as_deref() == Some(case.id.to_string().as_str())));
}

#[tokio::test]
async fn test_follow_up_for_someone_elses_case_is_not_relayed() {
    let (url, seen) = spawn_webhook(StatusCode::OK).await;
    let (app, pool) = app_and_pool(&url).await;
    let owner = Uuid::new_v4();
    let case = db::create_case(&pool, owner, &new_case(), time::now()).await.unwrap();

    let response = app
        .oneshot(follow_up_request(Uuid::new_v4(), case.id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bundle_without_files_rejected_before_relay() {
    let (url, seen) = spawn_webhook(StatusCode::OK).await;
    let app = app_with_relay(&url).await;

    let boundary = "empty-bundle";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"caseNumber\"\r\n\r\nWP/1/2025\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/uploads")
        .header("x-user-id", Uuid::new_v4().to_string())
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(seen.lock().unwrap().is_empty());
}
