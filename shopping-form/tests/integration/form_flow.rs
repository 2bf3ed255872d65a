use axum::{http::StatusCode, routing::post, Json, Router};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use shopping_form::credential::{password_ttl, PASSWORD_KEY};
use shopping_form::{
    CredentialStore, FileCredentialStore, FormController, HttpSubmitApi, Locale,
    MemoryCredentialStore, NoticeKind, SubmitOutcome,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::http_client::spawn_server;

/// Gateway stand-in accepting one password and recording every body.
struct FakeGateway {
    base_url: String,
    bodies: Arc<Mutex<Vec<Value>>>,
    hits: Arc<AtomicUsize>,
}

async fn fake_gateway(password: &'static str) -> FakeGateway {
    let bodies: Arc<Mutex<Vec<Value>>> = Arc::default();
    let hits = Arc::new(AtomicUsize::new(0));

    let (sink, counter) = (Arc::clone(&bodies), Arc::clone(&hits));
    let app = Router::new().route(
        "/api/send-items",
        post(move |Json(body): Json<Value>| {
            let sink = Arc::clone(&sink);
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let authorized = body["password"] == password;
                sink.lock().unwrap().push(body);
                if authorized {
                    (StatusCode::OK, Json(json!({"status": "success"})))
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"error": "Invalid password"})),
                    )
                }
            }
        }),
    );

    let addr = spawn_server(app).await;
    FakeGateway {
        base_url: format!("http://{}", addr),
        bodies,
        hits,
    }
}

fn form(
    gateway: &FakeGateway,
    store: Arc<dyn CredentialStore>,
    locale: Locale,
) -> FormController {
    let api = HttpSubmitApi::new(&gateway.base_url).unwrap();
    FormController::new(Arc::new(api), store, locale)
}

#[tokio::test]
async fn test_successful_submit_resets_form_and_stores_password() {
    let gateway = fake_gateway("secret").await;
    let store = Arc::new(MemoryCredentialStore::new());
    let mut form = form(&gateway, store.clone(), Locale::Ja);

    form.set_password("secret");
    form.toggle("牛乳");
    form.toggle("卵");
    form.set_pending_item("チーズ");
    form.add_custom_item().unwrap();

    assert_eq!(form.submit().await, SubmitOutcome::Sent);

    assert_eq!(
        gateway.bodies.lock().unwrap()[0],
        json!({"password": "secret", "items": ["牛乳", "卵", "チーズ"]})
    );
    assert_eq!(form.selected_count(), 0);
    assert!(form.custom_items().is_empty());
    assert_eq!(form.pending_item(), "");
    assert_eq!(form.password(), "secret");
    assert!(!form.is_submitting());

    let notice = form.visible_notice(Utc::now()).unwrap();
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.message, "送信完了");
    assert!(form
        .visible_notice(Utc::now() + Duration::seconds(4))
        .is_none());

    assert_eq!(
        store.get(PASSWORD_KEY).unwrap().as_deref(),
        Some("secret")
    );
}

#[tokio::test]
async fn test_wrong_password_keeps_state() {
    let gateway = fake_gateway("secret").await;
    let store = Arc::new(MemoryCredentialStore::new());
    let mut form = form(&gateway, store.clone(), Locale::Ja);

    form.set_password("wrong");
    form.toggle("米");

    assert_eq!(
        form.submit().await,
        SubmitOutcome::Rejected { status: 401 }
    );

    let notice = form.visible_notice(Utc::now()).unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.message, "エラー: Invalid password");
    assert!(form
        .visible_notice(Utc::now() + Duration::seconds(6))
        .is_none());

    assert!(form.is_checked("米"));
    assert_eq!(form.password(), "wrong");
    assert_eq!(store.get(PASSWORD_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_empty_selection_makes_no_request() {
    let gateway = fake_gateway("secret").await;
    let mut form = form(
        &gateway,
        Arc::new(MemoryCredentialStore::new()),
        Locale::Ja,
    );
    form.set_password("secret");

    assert_eq!(form.submit().await, SubmitOutcome::EmptySelection);
    assert_eq!(gateway.hits.load(Ordering::SeqCst), 0);

    let notice = form.notice().unwrap();
    assert_eq!(notice.message, "アイテムを選択するか追加してください");
    assert_eq!(notice.dismiss_at, None);
}

#[tokio::test]
async fn test_unchecked_custom_item_is_not_sent() {
    let gateway = fake_gateway("secret").await;
    let mut form = form(
        &gateway,
        Arc::new(MemoryCredentialStore::new()),
        Locale::Ja,
    );
    form.set_password("secret");
    form.set_pending_item("チーズ");
    form.add_custom_item().unwrap();
    form.toggle("チーズ");
    form.toggle("豆腐");

    assert_eq!(form.submit().await, SubmitOutcome::Sent);
    assert_eq!(gateway.bodies.lock().unwrap()[0]["items"], json!(["豆腐"]));
}

#[tokio::test]
async fn test_unreachable_server_reports_send_failure_in_english() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpSubmitApi::new(&format!("http://{}", addr)).unwrap();
    let mut form = FormController::new(
        Arc::new(api),
        Arc::new(MemoryCredentialStore::new()),
        Locale::En,
    );
    form.set_password("secret");
    form.toggle("バナナ");

    assert_eq!(form.submit().await, SubmitOutcome::Failed);
    assert_eq!(form.notice().unwrap().message, "Failed to send");
    assert!(form.is_checked("バナナ"));
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn test_stored_password_prefills_next_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    let gateway = fake_gateway("secret").await;

    {
        let mut first = form(&gateway, Arc::new(FileCredentialStore::new(&path)), Locale::Ja);
        assert!(!first.load());
        first.set_password("secret");
        first.toggle("納豆");
        assert_eq!(first.submit().await, SubmitOutcome::Sent);
    }

    let mut second = form(&gateway, Arc::new(FileCredentialStore::new(&path)), Locale::Ja);
    assert!(second.load());
    assert_eq!(second.password(), "secret");
}

#[test]
fn test_expired_password_is_not_prefilled() {
    let store = Arc::new(MemoryCredentialStore::new());
    store.set_at(
        PASSWORD_KEY,
        "secret",
        password_ttl(),
        Utc::now() - Duration::days(31),
    );

    let api = HttpSubmitApi::new("http://localhost:8080").unwrap();
    let mut form = FormController::new(Arc::new(api), store, Locale::Ja);
    assert!(!form.load());
    assert_eq!(form.password(), "");
}
