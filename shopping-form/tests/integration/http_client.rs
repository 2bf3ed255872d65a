use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use shopping_form::api::UNKNOWN_ERROR;
use shopping_form::{HttpSubmitApi, SendItemsRequest, SubmitApi, SubmitError};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn request(items: &[&str]) -> SendItemsRequest {
    SendItemsRequest {
        password: "secret".to_string(),
        items: items.iter().map(|s| s.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_posts_json_to_send_items() {
    let received: Arc<Mutex<Vec<Value>>> = Arc::default();
    let sink = Arc::clone(&received);
    let app = Router::new().route(
        "/api/send-items",
        post(move |Json(body): Json<Value>| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(body);
                Json(json!({"status": "success"}))
            }
        }),
    );
    let addr = spawn_server(app).await;

    let api = HttpSubmitApi::new(&format!("http://{}", addr)).unwrap();
    api.send_items(&request(&["牛乳", "チーズ"])).await.unwrap();

    assert_eq!(
        received.lock().unwrap()[0],
        json!({"password": "secret", "items": ["牛乳", "チーズ"]})
    );
}

#[tokio::test]
async fn test_error_field_is_surfaced() {
    let app = Router::new().route(
        "/api/send-items",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid password"})),
            )
        }),
    );
    let addr = spawn_server(app).await;

    let api = HttpSubmitApi::new(&format!("http://{}", addr)).unwrap();
    let err = api.send_items(&request(&["卵"])).await.unwrap_err();

    match err {
        SubmitError::Rejected { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message.as_deref(), Some("Invalid password"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_error_body_is_unknown_error() {
    let app = Router::new().route(
        "/api/send-items",
        post(|| async { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") }),
    );
    let addr = spawn_server(app).await;

    let api = HttpSubmitApi::new(&format!("http://{}", addr)).unwrap();
    let err = api.send_items(&request(&["卵"])).await.unwrap_err();

    assert!(matches!(
        err,
        SubmitError::Rejected { status: 502, message: Some(ref m) } if m == UNKNOWN_ERROR
    ));
}

#[tokio::test]
async fn test_json_error_without_message() {
    let app = Router::new().route(
        "/api/send-items",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))) }),
    );
    let addr = spawn_server(app).await;

    let api = HttpSubmitApi::new(&format!("http://{}", addr)).unwrap();
    let err = api.send_items(&request(&["卵"])).await.unwrap_err();

    assert!(matches!(
        err,
        SubmitError::Rejected {
            status: 500,
            message: None
        }
    ));
}

#[tokio::test]
async fn test_empty_error_message_is_treated_as_missing() {
    let app = Router::new().route(
        "/api/send-items",
        post(|| async { (StatusCode::BAD_REQUEST, Json(json!({"error": ""}))) }),
    );
    let addr = spawn_server(app).await;

    let api = HttpSubmitApi::new(&format!("http://{}", addr)).unwrap();
    let err = api.send_items(&request(&["卵"])).await.unwrap_err();

    assert!(matches!(
        err,
        SubmitError::Rejected {
            status: 400,
            message: None
        }
    ));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpSubmitApi::new(&format!("http://{}", addr)).unwrap();
    let err = api.send_items(&request(&["卵"])).await.unwrap_err();

    assert!(matches!(err, SubmitError::Transport(_)));
}
