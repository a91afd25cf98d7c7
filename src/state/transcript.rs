#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    User,
    Agent,
    System,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub text: String,
}

/// Chat transcript. Agent entries are the per-query response buffers.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TranscriptEntry> {
        self.entries.get(index)
    }

    pub fn push(&mut self, kind: EntryKind, text: impl Into<String>) -> usize {
        self.entries.push(TranscriptEntry {
            kind,
            text: text.into(),
        });
        self.entries.len() - 1
    }

    /// Open an empty agent entry for a new response and return its index.
    pub fn open_response(&mut self) -> usize {
        self.push(EntryKind::Agent, String::new())
    }

    /// Append one character to an agent entry. Other entry kinds are immutable.
    pub fn append_char(&mut self, index: usize, ch: char) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) if entry.kind == EntryKind::Agent => {
                entry.text.push(ch);
                true
            }
            _ => false,
        }
    }
}
