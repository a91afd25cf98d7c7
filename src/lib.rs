pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod state;
pub mod terminal;
pub mod types;
pub mod ui;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
