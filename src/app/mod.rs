use crate::api::{Backend, BackendClient};
use crate::config::Config;
use crate::runtime::context::RuntimeContext;
use crate::runtime::frontend::{ScrollAction, UserInputEvent};
use crate::runtime::mode::RuntimeMode;
use crate::runtime::{Runtime, UiUpdate};
use crate::session::{ChatSession, Effect, SessionEvent, Submission};
use crate::state::AvatarTimings;
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

const APP_TITLE: &str = "AIDA TERMINAL";

struct HistoryState {
    /// Wrapped lines scrolled back from the bottom; 0 follows new output.
    scroll_back: usize,
    unseen_entries: usize,
}

pub struct TuiMode {
    session: ChatSession,
    history: HistoryState,
    quit: bool,
}

impl TuiMode {
    pub fn new(session: ChatSession) -> Self {
        Self {
            session,
            history: HistoryState {
                scroll_back: 0,
                unseen_entries: 0,
            },
            quit: false,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn history_scroll_back(&self) -> usize {
        self.history.scroll_back
    }

    pub fn status_line(&self) -> String {
        let avatar = self.session.avatar();
        let mut status = format!("{APP_TITLE} | {}", avatar.label());
        if let Some(usage) = self.session.usage() {
            status.push_str(&format!(
                " | TOKENS {}/{}",
                usage.total_tokens, usage.max_tokens
            ));
        }
        if self.history.scroll_back > 0 {
            status.push_str(" | VIEW:SCROLLED");
            if self.history.unseen_entries > 0 {
                status.push_str(&format!(" ({} NEW)", self.history.unseen_entries));
            }
        }
        status
    }

    fn scroll(&mut self, action: ScrollAction) {
        let back = &mut self.history.scroll_back;
        *back = match action {
            ScrollAction::LineUp => back.saturating_add(1),
            ScrollAction::LineDown => back.saturating_sub(1),
            ScrollAction::PageUp(rows) => back.saturating_add(rows),
            ScrollAction::PageDown(rows) => back.saturating_sub(rows),
            ScrollAction::Home => usize::MAX / 2,
            ScrollAction::End => 0,
        };
        if *back == 0 {
            self.history.unseen_entries = 0;
        }
    }

    /// Hand queued effects to the runtime and fold events into view state.
    fn flush(&mut self, ctx: &mut RuntimeContext) {
        for effect in self.session.take_effects() {
            match effect {
                Effect::Quit => self.quit = true,
                other => ctx.dispatch(other),
            }
        }

        for event in self.session.take_events() {
            match event {
                SessionEvent::TranscriptEntryAdded(_) if self.history.scroll_back > 0 => {
                    self.history.unseen_entries += 1;
                }
                SessionEvent::StatusChanged(state) => {
                    tracing::debug!(?state, "status label changed");
                }
                _ => {}
            }
        }
    }
}

impl RuntimeMode for TuiMode {
    fn on_user_input(&mut self, input: String, ctx: &mut RuntimeContext) {
        match self.session.submit(&input, Instant::now()) {
            Submission::Accepted => {
                self.history.scroll_back = 0;
                self.history.unseen_entries = 0;
            }
            Submission::Busy => tracing::info!("submission rejected while a response is streaming"),
            Submission::Empty => {}
        }
        self.flush(ctx);
    }

    fn on_model_update(&mut self, update: UiUpdate, ctx: &mut RuntimeContext) {
        let now = Instant::now();
        match update {
            UiUpdate::Stream { cycle, update } => self.session.on_stream(cycle, update, now),
            UiUpdate::Command(outcome) => self.session.on_command(outcome),
            UiUpdate::Usage(usage) => self.session.on_usage(usage),
            UiUpdate::BootLogs(logs) => self.session.on_boot_logs(logs, now),
        }
        self.flush(ctx);
    }

    fn on_interrupt(&mut self, _ctx: &mut RuntimeContext) {
        self.quit = true;
    }

    fn on_frontend_event(&mut self, event: UserInputEvent, ctx: &mut RuntimeContext) {
        match event {
            UserInputEvent::Text(text) => self.on_user_input(text, ctx),
            UserInputEvent::Interrupt => self.on_interrupt(ctx),
            UserInputEvent::Scroll(action) => self.scroll(action),
        }
    }

    fn on_tick(&mut self, now: Instant, ctx: &mut RuntimeContext) {
        self.session.tick(now);
        self.flush(ctx);
    }

    fn is_turn_in_progress(&self) -> bool {
        self.session.is_busy()
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}

pub fn build_runtime(config: Config) -> Result<(Runtime<TuiMode>, RuntimeContext)> {
    let backend: Arc<dyn Backend> = Arc::new(BackendClient::new(&config));
    Ok(build_runtime_with_backend(&config, backend))
}

/// Wire a session to `backend` and kick off the startup requests.
pub fn build_runtime_with_backend(
    config: &Config,
    backend: Arc<dyn Backend>,
) -> (Runtime<TuiMode>, RuntimeContext) {
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let session = ChatSession::new(
        Instant::now(),
        config.typing_delay(),
        AvatarTimings::default(),
    );
    let ctx = RuntimeContext::new(backend, update_tx);

    if config.boot_sequence {
        ctx.fetch_boot_logs();
    }
    ctx.dispatch(Effect::RefreshUsage);

    (Runtime::new(TuiMode::new(session), update_rx), ctx)
}
