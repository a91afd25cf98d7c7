pub mod context;
pub mod frontend;
pub mod r#loop;
pub mod mode;
pub mod update;

pub use context::RuntimeContext;
pub use r#loop::Runtime;
pub use update::UiUpdate;

