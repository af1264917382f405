use std::sync::atomic::Ordering;
use std::sync::Arc;
use verlo_admin_lib::commands::execute;
use verlo_admin_lib::config::Command;
use verlo_admin_lib::session::{FileSessionStore, MemorySessionStore, SessionStore};
mod common;

fn list_countries() -> Command {
    Command::List {
        kind: "countries".into(),
        page: 1,
        country: None,
    }
}

#[tokio::test]
async fn test_valid_token_is_sent_without_refresh() {
    let backend = common::MockBackend::spawn().await;
    let token = common::fresh_token();
    let store = Arc::new(MemorySessionStore::with_tokens(&token, common::REFRESH_TOKEN));
    let app = backend.app(store);

    let out = execute(&app, list_countries()).await;

    assert!(out.success, "{:?}", out.lines);
    assert_eq!(backend.state.refresh_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.state.last_authorization(), Some(format!("Bearer {token}")));
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_persisted() {
    let backend = common::MockBackend::spawn().await;
    let store = Arc::new(MemorySessionStore::with_tokens(
        &common::expired_token(),
        common::REFRESH_TOKEN,
    ));
    let app = backend.app(store.clone());

    let out = execute(&app, list_countries()).await;

    assert!(out.success, "{:?}", out.lines);
    assert_eq!(backend.state.refresh_calls.load(Ordering::SeqCst), 1);
    let session = store.load().unwrap();
    let access = session.access_token.unwrap();
    assert!(!verlo_admin_lib::session::is_token_expired(Some(&access)));
    assert_eq!(session.refresh_token.as_deref(), Some(common::REFRESH_TOKEN));
    assert_eq!(backend.state.last_authorization(), Some(format!("Bearer {access}")));
}

#[tokio::test]
async fn test_failed_refresh_keeps_refresh_token() {
    let backend = common::MockBackend::spawn().await;
    backend.state.refresh_fails.store(true, Ordering::SeqCst);
    let expired = common::expired_token();
    let store = Arc::new(MemorySessionStore::with_tokens(&expired, common::REFRESH_TOKEN));
    let app = backend.app(store.clone());

    assert_eq!(app.session.get_valid_access_token().await, None);

    let out = execute(&app, list_countries()).await;
    assert!(!out.success);
    assert_eq!(out.lines, vec!["Not authenticated".to_string()]);

    // The list request never reached the backend.
    assert_eq!(backend.state.last_authorization(), None);

    let session = store.load().unwrap();
    assert_eq!(session.access_token.as_deref(), Some(expired.as_str()));
    assert_eq!(session.refresh_token.as_deref(), Some(common::REFRESH_TOKEN));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_refresh() {
    let backend = common::MockBackend::spawn().await;
    let store = Arc::new(MemorySessionStore::with_tokens(
        &common::expired_token(),
        common::REFRESH_TOKEN,
    ));
    let app = backend.app(store);

    let (a, b, c, d) = tokio::join!(
        app.session.get_valid_access_token(),
        app.session.get_valid_access_token(),
        app.session.get_valid_access_token(),
        app.session.get_valid_access_token(),
    );

    let first = a.expect("first caller gets a token");
    assert_eq!(b.as_deref(), Some(first.as_str()));
    assert_eq!(c.as_deref(), Some(first.as_str()));
    assert_eq!(d.as_deref(), Some(first.as_str()));
    assert_eq!(backend.state.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_no_session_means_no_request() {
    let backend = common::MockBackend::spawn().await;
    let app = backend.app(Arc::new(MemorySessionStore::new()));

    let out = execute(&app, list_countries()).await;

    assert_eq!(out.lines, vec!["Not authenticated".to_string()]);
    assert!(backend.state.authorization.lock().unwrap().is_empty());
    assert_eq!(backend.state.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_login_persists_session_and_logout_clears_it() {
    let backend = common::MockBackend::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let app = backend.app(Arc::new(FileSessionStore::open(&path).unwrap()));

    let out = execute(
        &app,
        Command::Login {
            username: "admin".into(),
            password: common::PASSWORD.into(),
        },
    )
    .await;
    assert!(out.success, "{:?}", out.lines);
    assert_eq!(out.lines, vec!["Signed in as admin".to_string()]);

    // A second process sees the same session.
    let reopened = FileSessionStore::open(&path).unwrap();
    let session = reopened.load().unwrap();
    assert!(session.access_token.is_some());
    assert_eq!(session.refresh_token.as_deref(), Some(common::REFRESH_TOKEN));
    assert_eq!(reopened.load_profile().unwrap().unwrap()["username"], "admin");

    let whoami = execute(&app, Command::Whoami).await;
    assert!(whoami.lines.iter().any(|l| l == "Username: admin"));

    let out = execute(&app, Command::Logout).await;
    assert!(out.success);
    let session = FileSessionStore::open(&path).unwrap().load().unwrap();
    assert_eq!(session.access_token, None);
    assert_eq!(session.refresh_token, None);
}

#[tokio::test]
async fn test_rejected_login_shows_backend_message_and_stores_nothing() {
    let backend = common::MockBackend::spawn().await;
    let store = Arc::new(MemorySessionStore::new());
    let app = backend.app(store.clone());

    let out = execute(
        &app,
        Command::Login {
            username: "admin".into(),
            password: "wrong".into(),
        },
    )
    .await;

    assert!(!out.success);
    assert_eq!(out.lines, vec!["Invalid credentials".to_string()]);
    assert_eq!(store.load().unwrap().access_token, None);
}
