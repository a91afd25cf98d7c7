pub mod api;

pub use api::{
    BootLogs, ChatRequest, ClearSessionResponse, ModelSwitchRequest, ModelSwitchResponse,
    SessionUsage,
};
