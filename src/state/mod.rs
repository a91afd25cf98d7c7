pub mod avatar;
pub mod system_log;
pub mod transcript;

pub use avatar::{AvatarChange, AvatarImage, AvatarMachine, AvatarState, AvatarTimings};
pub use system_log::{LogLevel, LogLine, SystemLog};
pub use transcript::{EntryKind, Transcript, TranscriptEntry};
