use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelSwitchRequest<'a> {
    pub model_id: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootLogs {
    #[serde(default)]
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SessionUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub max_tokens: u64,
}

impl SessionUsage {
    /// Fraction of the context window in use, clamped to `0.0..=1.0`.
    pub fn ratio(&self) -> f64 {
        if self.max_tokens == 0 {
            return 0.0;
        }
        (self.total_tokens as f64 / self.max_tokens as f64).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ModelSwitchResponse {
    Failed { error: String },
    Switched { status: String, current_model: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ClearSessionResponse {
    Failed { error: String },
    Cleared { message: String },
}
