use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use drive_form_bridge::clients::ReqwestTransport;
use drive_form_bridge::error::NETWORK_FAILURE_MESSAGE;
use drive_form_bridge::{Attachment, InputNormalizer, RawForm, SubmissionController, SubmitOutcome};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Captured {
    content_type: String,
    body: Vec<u8>,
}

#[derive(Clone)]
struct ServerState {
    status: StatusCode,
    reply: &'static str,
    captured: Arc<Mutex<Vec<Captured>>>,
}

async fn webhook(State(state): State<ServerState>, headers: HeaderMap, body: Bytes) -> (StatusCode, String) {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.captured.lock().unwrap().push(Captured {
        content_type,
        body: body.to_vec(),
    });
    (state.status, state.reply.to_string())
}

async fn spawn_webhook(
    status: StatusCode,
    reply: &'static str,
) -> Result<(String, Arc<Mutex<Vec<Captured>>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = ServerState {
        status,
        reply,
        captured: captured.clone(),
    };
    let app = Router::new().route("/webhook", post(webhook)).with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{}/webhook", addr), captured))
}

fn controller(endpoint: String) -> SubmissionController<ReqwestTransport> {
    SubmissionController::new(ReqwestTransport::new(), endpoint, InputNormalizer::default())
}

fn form(attachments: Vec<Attachment>) -> RawForm {
    RawForm {
        folder_id: "https://drive.google.com/drive/folders/Folder_42?usp=sharing".to_string(),
        message: " what is in here? ".to_string(),
        attachments,
    }
}

#[tokio::test]
async fn test_json_request_and_flat_results() {
    let (endpoint, captured) = spawn_webhook(StatusCode::OK, r#"{"a":"x","b":2}"#)
        .await
        .expect("spawn server");
    let c = controller(endpoint);

    let outcome = c.submit(form(Vec::new())).await;
    assert!(matches!(outcome, SubmitOutcome::Rendered(ref p) if p.len() == 2));

    let captured = captured.lock().unwrap().clone();
    assert_eq!(captured.len(), 1);
    assert!(captured[0].content_type.starts_with("application/json"));

    let body: serde_json::Value = serde_json::from_slice(&captured[0].body).unwrap();
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 3);
    assert_eq!(object["driveFolderId"], "Folder_42");
    assert_eq!(object["message"], "what is in here?");
    assert_eq!(object["sessionId"], c.session_id().as_str());

    let rows = c.view().results.unwrap().rows;
    assert_eq!(rows[0].key, "a");
    assert_eq!(rows[0].value, "x");
    assert_eq!(rows[1].key, "b");
    assert_eq!(rows[1].value, "2");
}

#[tokio::test]
async fn test_attachments_are_sent_as_multipart() {
    let (endpoint, captured) = spawn_webhook(StatusCode::OK, "{}").await.expect("spawn server");
    let c = controller(endpoint);

    let outcome = c
        .submit(form(vec![
            Attachment::new("a.txt", "alpha"),
            Attachment::new("b.txt", "bravo"),
        ]))
        .await;
    let SubmitOutcome::Rendered(payload) = outcome else {
        panic!("expected rendered outcome");
    };
    assert!(payload.is_empty());
    assert!(c.view().results.unwrap().is_empty_state());

    let captured = captured.lock().unwrap().clone();
    assert!(captured[0].content_type.starts_with("multipart/form-data"));

    let body = String::from_utf8_lossy(&captured[0].body);
    assert!(body.contains(r#"name="driveFolderId""#));
    assert!(body.contains("Folder_42"));
    assert!(body.contains(r#"name="message""#));
    assert!(body.contains(r#"name="sessionId""#));
    assert!(body.contains(c.session_id().as_str()));
    assert_eq!(body.matches(r#"name="files""#).count(), 2);

    let first = body.find(r#"filename="a.txt""#).expect("first file part");
    let second = body.find(r#"filename="b.txt""#).expect("second file part");
    assert!(first < second);
    assert!(body.contains("alpha"));
    assert!(body.contains("bravo"));
}

#[tokio::test]
async fn test_server_error_message_and_status() {
    let (endpoint, _) = spawn_webhook(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"boom"}"#)
        .await
        .expect("spawn server");
    let c = controller(endpoint);

    let SubmitOutcome::Failed(err) = c.submit(form(Vec::new())).await else {
        panic!("expected failure");
    };
    assert_eq!(err.message, "boom");
    assert_eq!(err.status, Some(500));
    assert_eq!(err.status_text, "Internal Server Error");

    let view = c.view();
    assert!(view.results.is_none());
    assert_eq!(
        view.error_panel.unwrap().status_line,
        "HTTP 500 Internal Server Error"
    );
    assert!(view.retry_enabled);
}

#[tokio::test]
async fn test_unparseable_not_found() {
    let (endpoint, _) = spawn_webhook(StatusCode::NOT_FOUND, "not json")
        .await
        .expect("spawn server");
    let c = controller(endpoint);

    let SubmitOutcome::Failed(err) = c.submit(form(Vec::new())).await else {
        panic!("expected failure");
    };
    assert_eq!(err.message, "Response was not valid JSON.");
    assert_eq!(err.status, Some(404));
}

#[tokio::test]
async fn test_retry_reuses_session_over_the_wire() {
    let (endpoint, captured) = spawn_webhook(StatusCode::BAD_GATEWAY, r#"{"message":"later"}"#)
        .await
        .expect("spawn server");
    let c = controller(endpoint);

    assert!(matches!(c.submit(form(Vec::new())).await, SubmitOutcome::Failed(_)));
    assert!(matches!(c.retry().await, SubmitOutcome::Failed(ref e) if e.message == "later"));

    let captured = captured.lock().unwrap().clone();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].body, captured[1].body);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let c = controller(format!("http://{}/webhook", addr));
    let SubmitOutcome::Failed(err) = c.submit(form(Vec::new())).await else {
        panic!("expected failure");
    };
    assert_eq!(err.message, NETWORK_FAILURE_MESSAGE);
    assert_eq!(err.status, None);
    assert_eq!(c.view().error_panel.unwrap().status_line, "Request error");
    assert!(!c.is_busy());
}
