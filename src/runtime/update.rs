use crate::session::{CommandOutcome, StreamUpdate};
use crate::types::SessionUsage;

/// Results sent back to the UI loop by background tasks.
#[derive(Debug)]
pub enum UiUpdate {
    Stream { cycle: u64, update: StreamUpdate },
    Command(CommandOutcome),
    Usage(anyhow::Result<SessionUsage>),
    BootLogs(anyhow::Result<Vec<String>>),
}
