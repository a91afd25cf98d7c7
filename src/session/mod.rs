//! Chat session controller.
//!
//! `ChatSession` owns every piece of UI state (avatar, transcript, system log,
//! usage meter) and advances only through explicit calls: `submit`, the
//! `on_*` handlers for backend results, and `tick`. It performs no I/O itself;
//! requests for the outside world are queued as [`Effect`]s and the rendering
//! layer is told what changed through [`SessionEvent`]s.

pub mod boot;
pub mod command;
pub mod pump;

use crate::api::StreamRecord;
use crate::error::CommandError;
use crate::state::{
    AvatarChange, AvatarImage, AvatarMachine, AvatarState, AvatarTimings, EntryKind, LogLevel,
    LogLine, SystemLog, Transcript,
};
use crate::types::SessionUsage;
use crate::util::preview_chars;
use boot::{BootSequence, FALLBACK_BOOT_LINES};
use command::{parse_command, Command, HELP_LINES};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const CONNECTION_LOST_MESSAGE: &str = "ERROR: CONNECTION LOST";
const CONNECTION_LOST_LOG: &str = "ERROR: CONNECTION LOST!";
const INPUT_PREVIEW_CHARS: usize = 20;

/// What the chat stream pump reports for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    Record(StreamRecord),
    Finished,
    Failed(String),
}

#[derive(Debug)]
pub enum CommandOutcome {
    ModelSwitched(Result<String, CommandError>),
    SessionCleared(Result<String, CommandError>),
}

/// I/O the session needs the runtime to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    OpenChat { cycle: u64, query: String },
    SwitchModel(String),
    ClearSession,
    RefreshUsage,
    Quit,
}

/// Changes for the rendering layer, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    TranscriptEntryAdded(usize),
    TranscriptAppended { index: usize, ch: char },
    AvatarImageChanged(AvatarImage),
    StatusChanged(AvatarState),
    LogLine(LogLine),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Empty,
    Busy,
    Accepted,
}

enum PendingOp {
    Log(String),
    Type {
        chars: VecDeque<char>,
        started: bool,
    },
    Finish,
}

enum Step {
    Log(String),
    Type { index: usize, ch: char, first: bool },
    EndText { first: bool },
    Finish,
}

struct ActiveCycle {
    id: u64,
    response_entry: usize,
    queue: VecDeque<PendingOp>,
    next_due: Instant,
}

pub struct ChatSession {
    avatar: AvatarMachine,
    transcript: Transcript,
    log: SystemLog,
    usage: Option<SessionUsage>,
    boot: BootSequence,
    active: Option<ActiveCycle>,
    next_cycle_id: u64,
    typing_delay: Duration,
    events: Vec<SessionEvent>,
    effects: Vec<Effect>,
}

impl ChatSession {
    pub fn new(now: Instant, typing_delay: Duration, timings: AvatarTimings) -> Self {
        Self {
            avatar: AvatarMachine::new(now, timings),
            transcript: Transcript::new(),
            log: SystemLog::new(),
            usage: None,
            boot: BootSequence::default(),
            active: None,
            next_cycle_id: 1,
            typing_delay,
            events: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn avatar(&self) -> &AvatarMachine {
        &self.avatar
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn system_log(&self) -> &SystemLog {
        &self.log
    }

    pub fn usage(&self) -> Option<SessionUsage> {
        self.usage
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_cycle(&self) -> Option<u64> {
        self.active.as_ref().map(|cycle| cycle.id)
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn submit(&mut self, input: &str, now: Instant) -> Submission {
        let query = input.trim();
        if query.is_empty() {
            return Submission::Empty;
        }
        if self.active.is_some() {
            self.log_line("BUSY: RESPONSE IN PROGRESS", LogLevel::Info);
            return Submission::Busy;
        }

        self.add_entry(EntryKind::User, format!("> {query}"));
        self.log_line(
            format!(
                "INPUT RECEIVED: \"{}\"",
                preview_chars(query, INPUT_PREVIEW_CHARS)
            ),
            LogLevel::Info,
        );

        match parse_command(query) {
            Some(Ok(Command::SwitchModel(model_id))) => {
                self.log_line(format!("SWITCHING MODEL: {model_id}"), LogLevel::Info);
                self.effects.push(Effect::SwitchModel(model_id));
            }
            Some(Ok(Command::ClearSession)) => {
                self.log_line("CLEARING SESSION...", LogLevel::Info);
                self.effects.push(Effect::ClearSession);
            }
            Some(Ok(Command::Help)) => {
                for line in HELP_LINES {
                    self.add_entry(EntryKind::System, format!("SYSTEM: {line}"));
                }
            }
            Some(Ok(Command::Quit)) => self.effects.push(Effect::Quit),
            Some(Err(usage)) => {
                self.add_entry(EntryKind::System, format!("SYSTEM: {usage}"));
            }
            // The backend gets the text exactly as entered.
            None => self.start_cycle(input.to_string(), now),
        }

        Submission::Accepted
    }

    pub fn on_stream(&mut self, cycle: u64, update: StreamUpdate, now: Instant) {
        let Some(active) = self.active.as_mut().filter(|active| active.id == cycle) else {
            tracing::debug!(cycle, ?update, "ignoring update for inactive cycle");
            return;
        };

        let op = match update {
            StreamUpdate::Record(StreamRecord::Log { content }) => PendingOp::Log(content),
            StreamUpdate::Record(StreamRecord::Text { content }) => PendingOp::Type {
                chars: content.chars().collect(),
                started: false,
            },
            StreamUpdate::Finished => PendingOp::Finish,
            StreamUpdate::Failed(reason) => {
                tracing::warn!(cycle, %reason, "chat stream failed");
                self.fail_cycle();
                return;
            }
        };

        if active.queue.is_empty() && active.next_due < now {
            active.next_due = now;
        }
        active.queue.push_back(op);
        self.drain_cycle(now);
    }

    pub fn on_command(&mut self, outcome: CommandOutcome) {
        match outcome {
            CommandOutcome::ModelSwitched(Ok(model)) => {
                self.add_entry(
                    EntryKind::System,
                    format!("SYSTEM: MODEL SWITCHED TO {model}"),
                );
                self.log_line(format!("ACTIVE MODEL: {model}"), LogLevel::Info);
            }
            CommandOutcome::SessionCleared(Ok(message)) => {
                self.add_entry(EntryKind::System, format!("SYSTEM: {message}"));
                self.log_line("SESSION CLEARED.", LogLevel::Info);
            }
            CommandOutcome::ModelSwitched(Err(err)) | CommandOutcome::SessionCleared(Err(err)) => {
                tracing::warn!(error = %err, "command failed");
                self.add_entry(
                    EntryKind::System,
                    format!("SYSTEM: ERROR: {}", err.display_text()),
                );
            }
        }
        self.effects.push(Effect::RefreshUsage);
    }

    pub fn on_usage(&mut self, usage: anyhow::Result<SessionUsage>) {
        match usage {
            Ok(usage) => self.usage = Some(usage),
            Err(err) => tracing::warn!(error = %err, "usage refresh failed"),
        }
    }

    pub fn on_boot_logs(&mut self, logs: anyhow::Result<Vec<String>>, now: Instant) {
        let lines = match logs {
            Ok(lines) if !lines.is_empty() => lines,
            Ok(_) => FALLBACK_BOOT_LINES.iter().map(|s| s.to_string()).collect(),
            Err(err) => {
                tracing::warn!(error = %err, "boot logs unavailable, using built-in sequence");
                FALLBACK_BOOT_LINES.iter().map(|s| s.to_string()).collect()
            }
        };
        self.boot.schedule(lines, now);
        self.tick(now);
    }

    /// Advance typing, boot lines and avatar timers to `now`.
    pub fn tick(&mut self, now: Instant) {
        for line in self.boot.due(now) {
            self.log_line(line, LogLevel::Info);
        }
        self.drain_cycle(now);
        let changes = self.avatar.tick(now);
        self.record_avatar(changes);
    }

    fn start_cycle(&mut self, query: String, now: Instant) {
        let id = self.next_cycle_id;
        self.next_cycle_id += 1;

        let response_entry = self.transcript.open_response();
        self.events
            .push(SessionEvent::TranscriptEntryAdded(response_entry));

        let changes = self.avatar.query_submitted(now);
        self.record_avatar(changes);
        self.log_line("AGENT STATUS: THINKING...", LogLevel::Info);

        self.active = Some(ActiveCycle {
            id,
            response_entry,
            queue: VecDeque::new(),
            next_due: now,
        });
        self.effects.push(Effect::OpenChat { cycle: id, query });
    }

    /// Run queued ops in order until one is not yet due.
    fn drain_cycle(&mut self, now: Instant) {
        while let Some(step) = self.next_step(now) {
            match step {
                Step::Log(message) => self.log_line(message, LogLevel::Info),
                Step::Type { index, ch, first } => {
                    if first {
                        self.enter_responding(now);
                    }
                    if self.transcript.append_char(index, ch) {
                        self.events
                            .push(SessionEvent::TranscriptAppended { index, ch });
                    }
                }
                Step::EndText { first } => {
                    if first {
                        self.enter_responding(now);
                    }
                }
                Step::Finish => {
                    self.active = None;
                    let changes = self.avatar.stream_finished(now);
                    self.record_avatar(changes);
                    self.log_line("AGENT STATUS: IDLE.", LogLevel::Info);
                    self.effects.push(Effect::RefreshUsage);
                }
            }
        }
    }

    fn next_step(&mut self, now: Instant) -> Option<Step> {
        let active = self.active.as_mut()?;
        if active.next_due > now {
            return None;
        }

        let step = match active.queue.front_mut()? {
            PendingOp::Log(message) => Step::Log(std::mem::take(message)),
            PendingOp::Type { chars, started } => {
                let first = !std::mem::replace(started, true);
                match chars.pop_front() {
                    Some(ch) => Step::Type {
                        index: active.response_entry,
                        ch,
                        first,
                    },
                    None => Step::EndText { first },
                }
            }
            PendingOp::Finish => Step::Finish,
        };

        match step {
            // Each typed character holds the queue for one typing delay.
            Step::Type { .. } => active.next_due += self.typing_delay,
            _ => {
                active.queue.pop_front();
            }
        }
        Some(step)
    }

    fn enter_responding(&mut self, now: Instant) {
        let changes = self.avatar.text_received(now);
        self.record_avatar(changes);
    }

    fn fail_cycle(&mut self) {
        // Dropping the cycle also drops any characters still waiting to be typed.
        self.active = None;
        let changes = self.avatar.transport_failed();
        self.record_avatar(changes);
        self.add_entry(EntryKind::Error, CONNECTION_LOST_MESSAGE);
        self.log_line(CONNECTION_LOST_LOG, LogLevel::Error);
    }

    fn add_entry(&mut self, kind: EntryKind, text: impl Into<String>) {
        let index = self.transcript.push(kind, text);
        self.events.push(SessionEvent::TranscriptEntryAdded(index));
    }

    fn log_line(&mut self, message: impl Into<String>, level: LogLevel) {
        let line = self.log.push(message, level);
        self.events.push(SessionEvent::LogLine(line));
    }

    fn record_avatar(&mut self, changes: Vec<AvatarChange>) {
        self.events.extend(changes.into_iter().map(|change| match change {
            AvatarChange::Image(image) => SessionEvent::AvatarImageChanged(image),
            AvatarChange::Status(state) => SessionEvent::StatusChanged(state),
        }));
    }
}

#[cfg(test)]
mod tests;
