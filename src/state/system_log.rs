use chrono::Local;
use std::collections::VecDeque;

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Local wall-clock time, `HH:MM:SS`.
    pub time: String,
    pub message: String,
    pub level: LogLevel,
}

impl LogLine {
    pub fn formatted(&self) -> String {
        format!("[{}] {}", self.time, self.message)
    }
}

#[derive(Debug, Default)]
pub struct SystemLog {
    lines: VecDeque<LogLine>,
}

impl SystemLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>, level: LogLevel) -> LogLine {
        let line = LogLine {
            time: Local::now().format("%H:%M:%S").to_string(),
            message: message.into(),
            level,
        };
        match level {
            LogLevel::Info => tracing::info!(target: "aida_term::syslog", "{}", line.message),
            LogLevel::Error => tracing::error!(target: "aida_term::syslog", "{}", line.message),
        }
        if self.lines.len() == MAX_LOG_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line.clone());
        line
    }

    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &LogLine> + ExactSizeIterator {
        self.lines.iter()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.lines.iter().map(|line| line.message.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
