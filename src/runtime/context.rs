use crate::api::Backend;
use crate::session::{pump, Effect};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task;

use super::UiUpdate;

/// Handle through which a `RuntimeMode` reaches the backend.
///
/// Every request runs on its own task and reports back on `update_tx`, so the
/// UI loop never waits on the network.
pub struct RuntimeContext {
    backend: Arc<dyn Backend>,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
}

impl RuntimeContext {
    pub fn new(backend: Arc<dyn Backend>, update_tx: mpsc::UnboundedSender<UiUpdate>) -> Self {
        Self { backend, update_tx }
    }

    /// Start the task for one session effect. `Quit` is handled by the mode.
    pub fn dispatch(&self, effect: Effect) {
        let backend = Arc::clone(&self.backend);
        let update_tx = self.update_tx.clone();
        match effect {
            Effect::OpenChat { cycle, query } => {
                tracing::info!(cycle, "starting chat cycle");
                task::spawn(pump::pump_chat(backend, cycle, query, update_tx));
            }
            Effect::SwitchModel(model_id) => {
                task::spawn(pump::switch_model(backend, model_id, update_tx));
            }
            Effect::ClearSession => {
                task::spawn(pump::clear_session(backend, update_tx));
            }
            Effect::RefreshUsage => {
                task::spawn(pump::refresh_usage(backend, update_tx));
            }
            Effect::Quit => {}
        }
    }

    pub fn fetch_boot_logs(&self) {
        task::spawn(pump::fetch_boot_logs(
            Arc::clone(&self.backend),
            self.update_tx.clone(),
        ));
    }
}
