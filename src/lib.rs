// fetchpub - fetch on a background context, publish on the main context
//
// This is the library crate containing the loader, the main context bridge and
// the observable state holder. The binary crate (main.rs) is a headless host
// that wires them together.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use crate::config::ConfigManager;
pub use metrics::Metrics;
pub use models::{AppConfig, AppState, LoadOutcome, LoadedImage};
pub use services::{FetchError, FetchRequest, ImageLoader};
pub use state::{StateChange, StateManager};
pub use ui::{MainContext, MainContextHandle};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
