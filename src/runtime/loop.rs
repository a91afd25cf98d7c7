use super::UiUpdate;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::{context::RuntimeContext, frontend::FrontendAdapter, mode::RuntimeMode};

/// Loop period; short enough to pace the 10ms typing effect.
const FRAME_INTERVAL: Duration = Duration::from_millis(10);

pub struct Runtime<M: RuntimeMode> {
    pub mode: M,
    update_rx: mpsc::UnboundedReceiver<UiUpdate>,
}

impl<M: RuntimeMode> Runtime<M> {
    pub fn new(mode: M, update_rx: mpsc::UnboundedReceiver<UiUpdate>) -> Self {
        Self { mode, update_rx }
    }

    pub async fn run<F: FrontendAdapter<M>>(&mut self, frontend: &mut F, ctx: &mut RuntimeContext) {
        let mut tick = tokio::time::interval(FRAME_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            while let Some(event) = frontend.poll_user_input(&self.mode) {
                self.mode.on_frontend_event(event, ctx);
            }
            while let Ok(update) = self.update_rx.try_recv() {
                self.mode.on_model_update(update, ctx);
            }
            self.mode.on_tick(Instant::now(), ctx);
            frontend.render(&self.mode);

            if frontend.should_quit() || self.mode.quit_requested() {
                break;
            }

            tokio::select! {
                _ = tick.tick() => {}
                update = self.update_rx.recv() => match update {
                    Some(update) => self.mode.on_model_update(update, ctx),
                    None => break,
                },
            }
        }
    }
}
