use super::*;
use crate::error::CommandError;

const TYPING: Duration = Duration::from_millis(10);

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn session(start: Instant) -> ChatSession {
    ChatSession::new(start, TYPING, AvatarTimings::deterministic())
}

fn text(content: &str) -> StreamUpdate {
    StreamUpdate::Record(StreamRecord::Text {
        content: content.to_string(),
    })
}

fn log(content: &str) -> StreamUpdate {
    StreamUpdate::Record(StreamRecord::Log {
        content: content.to_string(),
    })
}

fn response_text(session: &ChatSession) -> String {
    session
        .transcript()
        .entries()
        .iter()
        .rev()
        .find(|entry| entry.kind == EntryKind::Agent)
        .map(|entry| entry.text.clone())
        .unwrap_or_default()
}

fn status_changes(events: &[SessionEvent]) -> Vec<AvatarState> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::StatusChanged(state) => Some(*state),
            _ => None,
        })
        .collect()
}

fn start_chat(session: &mut ChatSession, query: &str, now: Instant) -> u64 {
    assert_eq!(session.submit(query, now), Submission::Accepted);
    match session.take_effects().as_slice() {
        [Effect::OpenChat { cycle, query: sent }] => {
            assert_eq!(sent, query);
            *cycle
        }
        other => panic!("expected OpenChat, got {other:?}"),
    }
}

#[test]
fn test_empty_input_is_rejected() {
    let start = Instant::now();
    let mut session = session(start);
    assert_eq!(session.submit("   ", start), Submission::Empty);
    assert!(session.transcript().is_empty());
    assert!(session.take_effects().is_empty());
    assert_eq!(session.avatar().state(), AvatarState::Idle);
}

#[test]
fn test_query_is_sent_untrimmed() {
    let start = Instant::now();
    let mut session = session(start);
    start_chat(&mut session, "  who is logged in?\t", start);

    let entries = session.transcript().entries();
    assert_eq!(entries[0].text, "> who is logged in?");
}

#[test]
fn test_submit_shows_user_message_and_starts_thinking() {
    let start = Instant::now();
    let mut session = session(start);
    let cycle = start_chat(&mut session, "list listening ports", start);

    assert_eq!(cycle, 1);
    assert_eq!(session.active_cycle(), Some(1));
    assert_eq!(session.avatar().state(), AvatarState::Thinking);

    let entries = session.transcript().entries();
    assert_eq!(entries[0].kind, EntryKind::User);
    assert_eq!(entries[0].text, "> list listening ports");
    assert_eq!(entries[1].kind, EntryKind::Agent);
    assert!(entries[1].text.is_empty());

    let messages = session.system_log().messages();
    assert!(messages.contains(&"INPUT RECEIVED: \"list listening ports\""));
    assert!(messages.contains(&"AGENT STATUS: THINKING..."));

    let events = session.take_events();
    assert_eq!(status_changes(&events), vec![AvatarState::Thinking]);
}

#[test]
fn test_typing_passes_through_each_prefix_in_order() {
    let start = Instant::now();
    let mut session = session(start);
    let cycle = start_chat(&mut session, "hi", start);

    session.on_stream(cycle, text("abc"), start);
    assert_eq!(response_text(&session), "a");
    assert_eq!(session.avatar().state(), AvatarState::Responding);

    session.tick(start + ms(9));
    assert_eq!(response_text(&session), "a");
    session.tick(start + ms(10));
    assert_eq!(response_text(&session), "ab");
    session.tick(start + ms(20));
    assert_eq!(response_text(&session), "abc");

    let appended: Vec<char> = session
        .take_events()
        .into_iter()
        .filter_map(|event| match event {
            SessionEvent::TranscriptAppended { ch, .. } => Some(ch),
            _ => None,
        })
        .collect();
    assert_eq!(appended, vec!['a', 'b', 'c']);
}

#[test]
fn test_fast_forward_still_appends_one_character_at_a_time() {
    let start = Instant::now();
    let mut session = session(start);
    let cycle = start_chat(&mut session, "hi", start);
    session.on_stream(cycle, text("xyz"), start);
    session.take_events();

    session.tick(start + Duration::from_secs(5));
    let appends = session
        .take_events()
        .into_iter()
        .filter(|event| matches!(event, SessionEvent::TranscriptAppended { .. }))
        .count();
    assert_eq!(appends, 2);
    assert_eq!(response_text(&session), "xyz");
}

#[test]
fn test_records_are_processed_sequentially() {
    let start = Instant::now();
    let mut session = session(start);
    let cycle = start_chat(&mut session, "hi", start);

    session.on_stream(cycle, text("ab"), start);
    session.on_stream(cycle, log("QUERY DONE"), start);
    session.on_stream(cycle, text("c"), start);

    // The log line waits behind the text still being typed.
    assert!(!session.system_log().messages().contains(&"QUERY DONE"));
    session.tick(start + ms(10));
    assert_eq!(response_text(&session), "ab");
    assert!(!session.system_log().messages().contains(&"QUERY DONE"));

    session.tick(start + ms(20));
    assert!(session.system_log().messages().contains(&"QUERY DONE"));
    assert_eq!(response_text(&session), "abc");
}

#[test]
fn test_log_before_text_keeps_thinking() {
    let start = Instant::now();
    let mut session = session(start);
    let cycle = start_chat(&mut session, "hi", start);

    session.on_stream(cycle, log("SELECT * FROM processes"), start);
    assert!(session
        .system_log()
        .messages()
        .contains(&"SELECT * FROM processes"));
    assert_eq!(session.avatar().state(), AvatarState::Thinking);
}

#[test]
fn test_completion_waits_for_typing_then_returns_to_idle() {
    let start = Instant::now();
    let mut session = session(start);
    let cycle = start_chat(&mut session, "hi", start);

    session.on_stream(cycle, text("ok"), start);
    session.on_stream(cycle, StreamUpdate::Finished, start);
    assert_eq!(session.avatar().state(), AvatarState::Responding);
    assert!(session.is_busy());

    session.tick(start + ms(10));
    assert_eq!(response_text(&session), "ok");
    assert!(session.is_busy());

    session.tick(start + ms(20));
    assert!(!session.is_busy());
    assert_eq!(session.avatar().state(), AvatarState::Idle);
    assert_eq!(session.avatar().armed_timer_owner(), Some(AvatarState::Idle));
    assert_eq!(session.take_effects(), vec![Effect::RefreshUsage]);
    assert!(session
        .system_log()
        .messages()
        .contains(&"AGENT STATUS: IDLE."));
}

#[test]
fn test_transport_failure_preempts_typing() {
    let start = Instant::now();
    let mut session = session(start);
    let cycle = start_chat(&mut session, "hi", start);

    session.on_stream(cycle, text("abcdef"), start);
    session.tick(start + ms(10));
    assert_eq!(response_text(&session), "ab");

    session.on_stream(cycle, StreamUpdate::Failed("reset".to_string()), start + ms(15));
    assert_eq!(session.avatar().state(), AvatarState::Error);
    assert_eq!(session.avatar().armed_timer_owner(), None);
    assert!(!session.is_busy());

    session.tick(start + Duration::from_secs(30));
    assert_eq!(response_text(&session), "ab");
    assert_eq!(session.avatar().state(), AvatarState::Error);

    let last = session.transcript().entries().last().cloned().expect("entry");
    assert_eq!(last.kind, EntryKind::Error);
    assert_eq!(last.text, CONNECTION_LOST_MESSAGE);
    assert!(session
        .system_log()
        .messages()
        .contains(&"ERROR: CONNECTION LOST!"));
    assert!(!session.take_effects().contains(&Effect::RefreshUsage));
}

#[test]
fn test_next_query_after_error_starts_thinking_with_new_buffer() {
    let start = Instant::now();
    let mut session = session(start);
    let first = start_chat(&mut session, "one", start);
    session.on_stream(first, StreamUpdate::Failed("refused".to_string()), start);

    let second = start_chat(&mut session, "two", start + ms(100));
    assert_ne!(first, second);
    assert_eq!(session.avatar().state(), AvatarState::Thinking);
    assert_eq!(response_text(&session), "");
}

#[test]
fn test_submission_while_busy_is_rejected() {
    let start = Instant::now();
    let mut session = session(start);
    start_chat(&mut session, "first", start);
    let entries_before = session.transcript().len();

    assert_eq!(session.submit("second", start + ms(5)), Submission::Busy);
    assert_eq!(session.transcript().len(), entries_before);
    assert!(session.take_effects().is_empty());
}

#[test]
fn test_updates_for_stale_cycle_are_ignored() {
    let start = Instant::now();
    let mut session = session(start);
    let first = start_chat(&mut session, "one", start);
    session.on_stream(first, StreamUpdate::Finished, start);
    assert_eq!(session.take_effects(), vec![Effect::RefreshUsage]);
    let second = start_chat(&mut session, "two", start + ms(50));

    session.on_stream(first, text("late"), start + ms(60));
    session.on_stream(first, StreamUpdate::Failed("late".to_string()), start + ms(60));
    assert_eq!(session.active_cycle(), Some(second));
    assert_eq!(session.avatar().state(), AvatarState::Thinking);
    assert_eq!(response_text(&session), "");
}

#[test]
fn test_model_switch_never_touches_the_avatar() {
    let start = Instant::now();
    let mut session = session(start);
    session.take_events();

    assert_eq!(
        session.submit("/model gemini-2.5-pro", start),
        Submission::Accepted
    );
    assert_eq!(
        session.take_effects(),
        vec![Effect::SwitchModel("gemini-2.5-pro".to_string())]
    );
    session.on_command(CommandOutcome::ModelSwitched(Ok("gemini-2.5-pro".to_string())));

    let events = session.take_events();
    assert!(status_changes(&events).is_empty());
    assert_eq!(session.avatar().state(), AvatarState::Idle);
    assert!(!session.is_busy());
    assert_eq!(
        session.transcript().entries().last().map(|e| e.text.as_str()),
        Some("SYSTEM: MODEL SWITCHED TO gemini-2.5-pro")
    );
    assert_eq!(session.take_effects(), vec![Effect::RefreshUsage]);
}

#[test]
fn test_clear_failure_shows_server_error_without_avatar_change() {
    let start = Instant::now();
    let mut session = session(start);
    session.take_events();

    session.submit("/clear", start);
    assert_eq!(session.take_effects(), vec![Effect::ClearSession]);
    session.on_command(CommandOutcome::SessionCleared(Err(CommandError::Rejected(
        "no active session".to_string(),
    ))));

    assert!(status_changes(&session.take_events()).is_empty());
    assert_eq!(
        session.transcript().entries().last().map(|e| e.text.as_str()),
        Some("SYSTEM: ERROR: no active session")
    );
    assert_eq!(session.take_effects(), vec![Effect::RefreshUsage]);
}

#[test]
fn test_local_commands_stay_local() {
    let start = Instant::now();
    let mut session = session(start);

    session.submit("/help", start);
    assert!(session.take_effects().is_empty());
    assert!(session
        .transcript()
        .entries()
        .iter()
        .any(|entry| entry.text.contains("/model <id>")));

    session.submit("/model", start);
    assert!(session.take_effects().is_empty());
    assert_eq!(
        session.transcript().entries().last().map(|e| e.text.as_str()),
        Some("SYSTEM: USAGE: /model <model_id>")
    );

    session.submit("/quit", start);
    assert_eq!(session.take_effects(), vec![Effect::Quit]);
    assert_eq!(session.avatar().state(), AvatarState::Idle);
}

#[test]
fn test_boot_logs_fall_back_to_builtin_sequence() {
    let start = Instant::now();
    let mut session = session(start);

    session.on_boot_logs(Err(anyhow::anyhow!("404")), start);
    assert!(session.system_log().is_empty());

    session.tick(start + ms(3500));
    let messages = session.system_log().messages();
    assert_eq!(messages.first().copied(), Some("SYSTEM STARTUP..."));
    assert_eq!(messages.last().copied(), Some("AIDA AGENT READY."));
}

#[test]
fn test_usage_updates_are_kept() {
    let start = Instant::now();
    let mut session = session(start);
    let usage = SessionUsage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
        max_tokens: 100,
    };
    session.on_usage(Ok(usage));
    session.on_usage(Err(anyhow::anyhow!("offline")));
    assert_eq!(session.usage(), Some(usage));
}
