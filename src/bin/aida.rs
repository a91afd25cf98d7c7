use aida_term::app::{build_runtime, TuiMode};
use aida_term::config::Config;
use aida_term::logging;
use aida_term::runtime::frontend::{FrontendAdapter, ScrollAction, UserInputEvent};
use aida_term::runtime::mode::RuntimeMode;
use aida_term::terminal;
use aida_term::ui::editor::{InputAction, InputEditor};
use aida_term::ui::layout::split_terminal_layout;
use aida_term::ui::render::{
    input_visual_rows, render_avatar, render_header, render_input, render_system_log,
    render_transcript,
};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use ratatui::widgets::Clear;
use std::time::Duration;

const PAGE_ROWS: usize = 10;
const WHEEL_ROWS: usize = 3;
const MAX_INPUT_ROWS: usize = 4;

/// Transcript scrolling keys; everything else goes to the editor.
fn scroll_for_key(key: &KeyEvent) -> Option<ScrollAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::PageUp => Some(ScrollAction::PageUp(PAGE_ROWS)),
        KeyCode::PageDown => Some(ScrollAction::PageDown(PAGE_ROWS)),
        KeyCode::Home if ctrl => Some(ScrollAction::Home),
        KeyCode::End if ctrl => Some(ScrollAction::End),
        _ => None,
    }
}

/// Turns terminal events into runtime input. Keys the editor absorbs
/// produce nothing, so a burst is drained until something does.
#[derive(Default)]
struct InputRouter {
    editor: InputEditor,
    quit: bool,
}

impl InputRouter {
    fn next_event(&mut self, mut read: impl FnMut() -> Option<Event>) -> Option<UserInputEvent> {
        while !self.quit {
            let event = read()?;
            if let Some(input) = self.route(event) {
                return Some(input);
            }
        }
        None
    }

    fn route(&mut self, event: Event) -> Option<UserInputEvent> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.map_key(key),
            Event::Paste(text) => {
                self.editor.insert_str(&text);
                None
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => {
                    Some(UserInputEvent::Scroll(ScrollAction::PageUp(WHEEL_ROWS)))
                }
                MouseEventKind::ScrollDown => {
                    Some(UserInputEvent::Scroll(ScrollAction::PageDown(WHEEL_ROWS)))
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn map_key(&mut self, key: KeyEvent) -> Option<UserInputEvent> {
        if let Some(action) = scroll_for_key(&key) {
            return Some(UserInputEvent::Scroll(action));
        }
        match self.editor.apply_key(key) {
            InputAction::None => None,
            InputAction::Submit(text) => Some(UserInputEvent::Text(text)),
            InputAction::Interrupt => Some(UserInputEvent::Interrupt),
            InputAction::Quit => {
                self.quit = true;
                None
            }
        }
    }
}

struct TerminalFrontend {
    terminal: terminal::TerminalType,
    input: InputRouter,
}

impl TerminalFrontend {
    fn new() -> Result<Self> {
        Ok(Self {
            terminal: terminal::setup()?,
            input: InputRouter::default(),
        })
    }
}

impl Drop for TerminalFrontend {
    fn drop(&mut self) {
        terminal::restore();
    }
}

/// Next pending terminal event without blocking; the runtime paces itself.
fn read_pending(failed: &mut bool) -> Option<Event> {
    let Ok(true) = event::poll(Duration::ZERO) else {
        return None;
    };
    match event::read() {
        Ok(ev) => Some(ev),
        Err(err) => {
            tracing::error!(error = %err, "terminal input failed");
            *failed = true;
            None
        }
    }
}

impl FrontendAdapter<TuiMode> for TerminalFrontend {
    fn poll_user_input(&mut self, mode: &TuiMode) -> Option<UserInputEvent> {
        if mode.quit_requested() {
            return None;
        }
        let mut failed = false;
        let input = self.input.next_event(|| read_pending(&mut failed));
        if failed {
            self.input.quit = true;
        }
        input
    }

    fn render(&mut self, mode: &TuiMode) {
        let session = mode.session();
        let avatar = session.avatar();
        let status = mode.status_line();
        let input = self.input.editor.buffer();
        let cursor = self.input.editor.cursor();

        let drawn = self.terminal.draw(|frame| {
            let area = frame.area();
            frame.render_widget(Clear, area);
            let input_width = area.width.saturating_sub(2).max(1) as usize;
            let input_rows = input_visual_rows(input, input_width).min(MAX_INPUT_ROWS) as u16;
            let panes = split_terminal_layout(area, input_rows);

            render_header(frame, panes.header, &status, avatar.color(), session.usage());
            render_transcript(
                frame,
                panes.transcript,
                session.transcript().entries(),
                mode.history_scroll_back(),
            );
            render_avatar(frame, panes.avatar, avatar.image(), avatar.color(), avatar.label());
            render_system_log(frame, panes.system_log, session.system_log());
            render_input(frame, panes.input, input, cursor);
        });
        if let Err(err) = drawn {
            tracing::error!(error = %err, "terminal draw failed");
            self.input.quit = true;
        }
    }

    fn should_quit(&self) -> bool {
        self.input.quit
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    logging::init(config.log_path.as_deref())?;
    config.validate()?;
    tracing::info!(backend = %config.backend_url, "starting terminal");

    let (mut runtime, mut ctx) = build_runtime(config)?;
    let mut frontend = TerminalFrontend::new()?;
    runtime.run(&mut frontend, &mut ctx).await;

    tracing::info!("terminal closed");
    Ok(())
}
