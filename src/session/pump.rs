//! Background tasks that talk to the backend and report back as `UiUpdate`s.

use super::{CommandOutcome, StreamUpdate};
use crate::api::{interpret, Backend, LineFramer};
use crate::runtime::UiUpdate;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Stream one chat query through the framer and interpreter.
///
/// Lines are forwarded strictly in arrival order; malformed ones are dropped
/// with a warning and the stream carries on.
pub async fn pump_chat(
    backend: Arc<dyn Backend>,
    cycle: u64,
    query: String,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
) {
    let send = |update: StreamUpdate| {
        let _ = update_tx.send(UiUpdate::Stream { cycle, update });
    };

    let mut stream = match backend.open_chat(&query).await {
        Ok(stream) => stream,
        Err(err) => {
            send(StreamUpdate::Failed(err.to_string()));
            return;
        }
    };

    let mut framer = LineFramer::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                for line in framer.feed(&bytes) {
                    forward_line(cycle, &line, &send);
                }
            }
            Err(err) => {
                send(StreamUpdate::Failed(err.to_string()));
                return;
            }
        }
    }

    if let Some(line) = framer.finish() {
        forward_line(cycle, &line, &send);
    }
    send(StreamUpdate::Finished);
}

fn forward_line(cycle: u64, line: &str, send: &impl Fn(StreamUpdate)) {
    match interpret(line) {
        Ok(record) => send(StreamUpdate::Record(record)),
        Err(err) => tracing::warn!(cycle, error = %err, line, "dropping malformed stream record"),
    }
}

pub async fn switch_model(
    backend: Arc<dyn Backend>,
    model_id: String,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
) {
    let result = backend.switch_model(&model_id).await;
    let _ = update_tx.send(UiUpdate::Command(CommandOutcome::ModelSwitched(result)));
}

pub async fn clear_session(backend: Arc<dyn Backend>, update_tx: mpsc::UnboundedSender<UiUpdate>) {
    let result = backend.clear_session().await;
    let _ = update_tx.send(UiUpdate::Command(CommandOutcome::SessionCleared(result)));
}

pub async fn refresh_usage(backend: Arc<dyn Backend>, update_tx: mpsc::UnboundedSender<UiUpdate>) {
    let usage = backend.session_usage().await;
    let _ = update_tx.send(UiUpdate::Usage(usage));
}

pub async fn fetch_boot_logs(
    backend: Arc<dyn Backend>,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
) {
    let logs = backend.boot_logs().await;
    let _ = update_tx.send(UiUpdate::BootLogs(logs));
}
