mod common;

use std::sync::Arc;

use tokio::sync::mpsc;

use common::{FakeBackend, FakeExecutor};
use tabpost::dispatch::RequestDispatcher;
use tabpost::entries::{Entry, EntryField, EntryList, EntryListKind};
use tabpost::error::{DispatchError, NetworkError};
use tabpost::history::HistoryRecorder;
use tabpost::models::{AuthType, HttpMethod, ResponseBody};
use tabpost::store::MemoryStore;
use tabpost::workspace::{TabDraft, TabPatch, TabWorkspace};

/// Dispatcher wired to a recorder subscriber, as the app does it
fn pipeline(
    executor: Arc<FakeExecutor>,
    backend: Arc<FakeBackend>,
) -> (RequestDispatcher, tokio::task::JoinHandle<()>) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let recorder = Arc::new(HistoryRecorder::new(backend, Arc::new(MemoryStore::new())));
    let subscriber = tokio::spawn(recorder.run_subscriber(events_rx));
    let dispatcher = RequestDispatcher::new(executor).with_events(events_tx);
    (dispatcher, subscriber)
}

#[tokio::test]
async fn test_invalid_url_fails_fast_without_side_effects() {
    let executor = Arc::new(FakeExecutor::replying(200, "text/plain", "ok"));
    let backend = Arc::new(FakeBackend::default());
    let (dispatcher, subscriber) = pipeline(executor.clone(), backend.clone());

    let mut workspace = TabWorkspace::default();
    let tab = workspace.add_tab(TabDraft {
        url: Some("not-a-url".into()),
        ..TabDraft::default()
    });

    let result = dispatcher.send(workspace.tab(tab).unwrap()).await;
    assert!(matches!(result, Err(DispatchError::InvalidUrl { .. })));

    drop(dispatcher);
    subscriber.await.unwrap();
    assert_eq!(executor.calls(), 0);
    assert_eq!(backend.save_attempts(), 0);
}

#[tokio::test]
async fn test_network_failure_still_records_history_once() {
    let executor = Arc::new(FakeExecutor::failing("dns lookup failed"));
    let backend = Arc::new(FakeBackend::failing_saves());
    let (dispatcher, subscriber) = pipeline(executor.clone(), backend.clone());

    let mut workspace = TabWorkspace::default();
    let tab = workspace.add_tab(TabDraft::default());

    let result = dispatcher.send(workspace.tab(tab).unwrap()).await;
    assert_eq!(
        result,
        Err(DispatchError::Network(NetworkError::Connect("dns lookup failed".into())))
    );

    drop(dispatcher);
    subscriber.await.unwrap();
    assert_eq!(executor.calls(), 1);
    assert_eq!(backend.save_attempts(), 1);
}

#[tokio::test]
async fn test_history_failure_does_not_affect_successful_send() {
    let executor = Arc::new(FakeExecutor::replying(200, "application/json", r#"{"id":7}"#));
    let backend = Arc::new(FakeBackend::failing_saves());
    let (dispatcher, subscriber) = pipeline(executor, backend.clone());

    let mut workspace = TabWorkspace::default();
    let tab = workspace.add_tab(TabDraft::default());
    let result = dispatcher.send(workspace.tab(tab).unwrap()).await.unwrap();
    assert_eq!(result.body, ResponseBody::Json(serde_json::json!({"id": 7})));

    drop(dispatcher);
    subscriber.await.unwrap();
    assert_eq!(backend.save_attempts(), 1);
}

#[tokio::test]
async fn test_outbound_request_is_built_from_enabled_rows() {
    let executor = Arc::new(FakeExecutor::replying(200, "text/plain", "pong"));
    let dispatcher = RequestDispatcher::new(executor.clone());

    let parameters = EntryList::from_entries(vec![
        Entry::new("page", "2"),
        Entry {
            enabled: false,
            ..Entry::new("debug", "1")
        },
        Entry::new("", "dropped"),
        Entry::new("q", "a b"),
    ]);
    let headers = EntryList::from_entries(vec![
        Entry::new("X-Trace", "one"),
        Entry::new("x-trace", "two"),
        Entry {
            enabled: false,
            ..Entry::new("Content-Type", "text/xml")
        },
    ]);

    let mut workspace = TabWorkspace::default();
    let tab = workspace.add_tab(TabDraft {
        url: Some("  https://api.example.com/search  ".into()),
        parameters: Some(parameters),
        headers: Some(headers),
        ..TabDraft::default()
    });

    dispatcher.send(workspace.tab(tab).unwrap()).await.unwrap();
    let sent = executor.last();
    assert_eq!(sent.method, HttpMethod::GET);
    assert_eq!(sent.url, "https://api.example.com/search?page=2&q=a+b");
    assert_eq!(
        sent.headers,
        vec![
            ("X-Trace".to_string(), "two".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ]
    );
    assert_eq!(sent.body, None);
}

#[tokio::test]
async fn test_variables_auth_and_body_are_applied() {
    let executor = Arc::new(FakeExecutor::replying(201, "text/plain", "created"));
    let dispatcher = RequestDispatcher::new(executor.clone());

    let mut workspace = TabWorkspace::default();
    let tab = workspace.add_tab(TabDraft {
        method: Some(HttpMethod::POST),
        url: Some("https://{{host}}/users".into()),
        variables: Some(EntryList::from_entries(vec![Entry::new("host", "api.example.com")])),
        body: Some(r#"{"name":"{{name}}"}"#.into()),
        auth: Some(AuthType::Bearer("secret".into())),
        ..TabDraft::default()
    });
    workspace.edit_entries(tab, EntryListKind::Variables, |list| {
        let scratch = list.entries().last().unwrap().id;
        let changed = list.update(scratch, EntryField::Key("name".into()))
            && list.update(scratch, EntryField::Value("ada".into()));
        (changed, ())
    });

    dispatcher.send(workspace.tab(tab).unwrap()).await.unwrap();
    let sent = executor.last();
    assert_eq!(sent.url, "https://api.example.com/users");
    assert_eq!(sent.body.as_deref(), Some(r#"{"name":"ada"}"#));
    assert!(sent
        .headers
        .iter()
        .any(|(k, v)| k == "Authorization" && v == "Bearer secret"));
    assert!(sent.headers.iter().any(|(k, _)| k == "User-Agent"));
}

#[tokio::test]
async fn test_error_status_is_surfaced_on_the_tab() {
    let executor = Arc::new(FakeExecutor::replying(404, "text/plain", "missing"));
    let dispatcher = RequestDispatcher::new(executor);

    let mut workspace = TabWorkspace::default();
    let tab = workspace.add_tab(TabDraft::default());
    workspace.update_tab(
        tab,
        TabPatch {
            name: Some("lookup".into()),
            ..TabPatch::default()
        },
        None,
    );

    workspace.begin_dispatch();
    let outcome = dispatcher.send(workspace.tab(tab).unwrap()).await;
    workspace.commit_dispatch(tab, &outcome);

    let tab = workspace.tab(tab).unwrap();
    assert!(tab.response.is_none());
    assert!(tab.error.as_deref().unwrap().contains("404"));
    assert!(!tab.is_dirty);
    assert!(!workspace.is_loading());
}

#[tokio::test]
async fn test_successful_send_commits_response() {
    let executor = Arc::new(FakeExecutor::replying(200, "text/plain", "hello"));
    let dispatcher = RequestDispatcher::new(executor);

    let mut workspace = TabWorkspace::default();
    let tab = workspace.add_tab(TabDraft::default());
    workspace.update_tab(tab, TabPatch::default(), None);
    assert!(workspace.tab(tab).unwrap().is_dirty);

    let outcome = dispatcher.send(workspace.tab(tab).unwrap()).await;
    workspace.commit_dispatch(tab, &outcome);

    let tab = workspace.tab(tab).unwrap();
    let response = tab.response.as_ref().unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.size_bytes, 5);
    assert!(!tab.is_dirty);
    assert!(tab.error.is_none());
}

#[tokio::test]
async fn test_completion_event_carries_resolved_url() {
    let executor = Arc::new(FakeExecutor::replying(200, "text/plain", "ok"));
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let dispatcher = RequestDispatcher::new(executor).with_events(events_tx);

    let mut workspace = TabWorkspace::default();
    let tab = workspace.add_tab(TabDraft {
        url: Some("https://example.com/a".into()),
        parameters: Some(EntryList::from_entries(vec![Entry::new("x", "1")])),
        ..TabDraft::default()
    });
    dispatcher.send(workspace.tab(tab).unwrap()).await.unwrap();

    let event = events_rx.recv().await.unwrap();
    assert_eq!(event.tab_id, tab);
    assert_eq!(event.url, "https://example.com/a?x=1");
    assert_eq!(event.outcome, Ok(200));
}
