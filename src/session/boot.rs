use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Shown when `/boot_logs` cannot be fetched.
pub const FALLBACK_BOOT_LINES: &[&str] = &[
    "SYSTEM STARTUP...",
    "LOADING KERNEL...",
    "CONNECTING TO OSQUERY DAEMON...",
    "RAG DATABASE LOADED.",
    "AIDA AGENT READY.",
];

const BOOT_OFFSETS_MS: &[u64] = &[500, 1200, 2000, 2800, 3500];
const BOOT_TRAILING_STEP_MS: u64 = 700;

/// Boot lines waiting for their reveal time.
#[derive(Debug, Default)]
pub struct BootSequence {
    pending: VecDeque<(Instant, String)>,
}

impl BootSequence {
    pub fn schedule(&mut self, lines: Vec<String>, now: Instant) {
        self.pending.clear();
        for (index, line) in lines.into_iter().enumerate() {
            self.pending.push_back((now + reveal_offset(index), line));
        }
    }

    /// Lines whose reveal time has passed, in order.
    pub fn due(&mut self, now: Instant) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some((at, _)) = self.pending.front() {
            if *at > now {
                break;
            }
            if let Some((_, line)) = self.pending.pop_front() {
                lines.push(line);
            }
        }
        lines
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }
}

fn reveal_offset(index: usize) -> Duration {
    let ms = match BOOT_OFFSETS_MS.get(index) {
        Some(ms) => *ms,
        None => {
            let last = BOOT_OFFSETS_MS[BOOT_OFFSETS_MS.len() - 1];
            let extra = (index + 1 - BOOT_OFFSETS_MS.len()) as u64;
            last + extra * BOOT_TRAILING_STEP_MS
        }
    };
    Duration::from_millis(ms)
}
