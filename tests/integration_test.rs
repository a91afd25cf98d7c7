use aida_term::api::{MockBackend, MockChat};
use aida_term::config::Config;
use aida_term::session::{ChatSession, Effect, StreamUpdate, Submission};
use aida_term::state::{AvatarImage, AvatarState, AvatarTimings, EntryKind};
use std::time::{Duration, Instant};

#[test]
fn test_config_validation_rejects_non_http_backend() {
    let config = Config {
        backend_url: "ftp://127.0.0.1:8000".to_string(),
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_allows_remote_https_backend() {
    let config = Config {
        backend_url: "https://aida.example.com".to_string(),
        ..Config::default()
    };
    assert!(config.validate().is_ok());
    assert_eq!(
        config.endpoint("/chat"),
        "https://aida.example.com/chat".to_string()
    );
}

/// Drive one chat cycle by hand, as the runtime would.
#[tokio::test]
async fn test_session_types_a_mock_response() {
    let backend = MockBackend::new().with_chat(MockChat::records(&[
        ("log", "RAG HIT: processes table"),
        ("text", "ok"),
    ]));
    let start = Instant::now();
    let delay = Duration::from_millis(10);
    let mut session = ChatSession::new(start, delay, AvatarTimings::deterministic());

    assert_eq!(session.submit("ps", start), Submission::Accepted);
    assert_eq!(session.avatar().state(), AvatarState::Thinking);
    assert_eq!(session.avatar().image(), AvatarImage::Think);

    let Some(Effect::OpenChat { cycle, query }) = session.take_effects().into_iter().next() else {
        panic!("expected a chat request");
    };
    assert_eq!(query, "ps");

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let backend: std::sync::Arc<dyn aida_term::api::Backend> = std::sync::Arc::new(backend);
    aida_term::session::pump::pump_chat(backend, cycle, query, tx).await;

    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        if let aida_term::runtime::UiUpdate::Stream { update, .. } = update {
            updates.push(update);
        }
    }
    assert_eq!(updates.last(), Some(&StreamUpdate::Finished));

    for update in updates {
        session.on_stream(cycle, update, start);
    }
    assert_eq!(session.avatar().state(), AvatarState::Responding);

    session.tick(start + delay * 2);
    assert!(!session.is_busy());
    assert_eq!(session.avatar().state(), AvatarState::Idle);

    let agent = session
        .transcript()
        .entries()
        .iter()
        .find(|entry| entry.kind == EntryKind::Agent)
        .expect("agent entry");
    assert_eq!(agent.text, "ok");
    assert!(session
        .system_log()
        .messages()
        .contains(&"RAG HIT: processes table"));
}
