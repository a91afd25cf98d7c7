use crate::api::client::{Backend, ByteStream};
use crate::error::{CommandError, TransportError};
use crate::types::SessionUsage;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted reply to `POST /chat`.
#[derive(Debug, Clone)]
pub enum MockChat {
    /// Body delivered as these raw chunks, then a clean end of stream.
    Chunks(Vec<Vec<u8>>),
    /// The request itself fails.
    Refused(String),
    /// Some chunks arrive, then the body breaks.
    Broken(Vec<Vec<u8>>, String),
}

impl MockChat {
    /// Serialize records as NDJSON, one chunk per record.
    pub fn records(records: &[(&str, &str)]) -> Self {
        let chunks = records
            .iter()
            .map(|(kind, content)| {
                let line = serde_json::json!({ "type": kind, "content": content });
                format!("{line}\n").into_bytes()
            })
            .collect();
        MockChat::Chunks(chunks)
    }
}

#[derive(Default)]
struct MockState {
    chats: VecDeque<MockChat>,
    model_switches: VecDeque<Result<String, String>>,
    clears: VecDeque<Result<String, String>>,
    boot_logs: Option<Vec<String>>,
    usage: SessionUsage,
    queries: Vec<String>,
    usage_requests: usize,
}

/// Scripted in-memory backend.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat(self, chat: MockChat) -> Self {
        self.lock().chats.push_back(chat);
        self
    }

    pub fn with_model_switch(self, result: Result<&str, &str>) -> Self {
        self.lock()
            .model_switches
            .push_back(result.map(str::to_string).map_err(str::to_string));
        self
    }

    pub fn with_clear(self, result: Result<&str, &str>) -> Self {
        self.lock()
            .clears
            .push_back(result.map(str::to_string).map_err(str::to_string));
        self
    }

    pub fn with_boot_logs(self, logs: &[&str]) -> Self {
        self.lock().boot_logs = Some(logs.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_usage(self, usage: SessionUsage) -> Self {
        self.lock().usage = usage;
        self
    }

    /// Queries received on `/chat`, in order.
    pub fn queries(&self) -> Vec<String> {
        self.lock().queries.clone()
    }

    pub fn usage_requests(&self) -> usize {
        self.lock().usage_requests
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn open_chat(&self, query: &str) -> Result<ByteStream, TransportError> {
        let chat = {
            let mut state = self.lock();
            state.queries.push(query.to_string());
            state.chats.pop_front()
        };

        let items: Vec<Result<Bytes, TransportError>> = match chat {
            None => {
                return Err(TransportError::Mock(
                    "MockBackend: no more chat responses configured".to_string(),
                ))
            }
            Some(MockChat::Refused(message)) => return Err(TransportError::Mock(message)),
            Some(MockChat::Chunks(chunks)) => chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect(),
            Some(MockChat::Broken(chunks, message)) => chunks
                .into_iter()
                .map(|c| Ok(Bytes::from(c)))
                .chain(std::iter::once(Err(TransportError::Mock(message))))
                .collect(),
        };

        Ok(Box::pin(stream::iter(items)))
    }

    async fn boot_logs(&self) -> anyhow::Result<Vec<String>> {
        self.lock()
            .boot_logs
            .clone()
            .ok_or_else(|| anyhow::anyhow!("MockBackend: boot logs unavailable"))
    }

    async fn session_usage(&self) -> anyhow::Result<SessionUsage> {
        let mut state = self.lock();
        state.usage_requests += 1;
        Ok(state.usage)
    }

    async fn switch_model(&self, _model_id: &str) -> Result<String, CommandError> {
        match self.lock().model_switches.pop_front() {
            Some(Ok(model)) => Ok(model),
            Some(Err(error)) => Err(CommandError::Rejected(error)),
            None => Err(CommandError::Rejected(
                "MockBackend: no model switch configured".to_string(),
            )),
        }
    }

    async fn clear_session(&self) -> Result<String, CommandError> {
        match self.lock().clears.pop_front() {
            Some(Ok(message)) => Ok(message),
            Some(Err(error)) => Err(CommandError::Rejected(error)),
            None => Err(CommandError::Rejected(
                "MockBackend: no clear configured".to_string(),
            )),
        }
    }
}
