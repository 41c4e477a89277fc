//! Data models for fetchpub.
//!
//! - [`AppState`]: the observable state a presentation layer watches (latest image or error,
//!   title text, timeline entries)
//! - [`LoadedImage`] / [`LoadOutcome`]: the payload of a successful fetch and the terminal
//!   outcome handed to the state holder
//! - [`AppConfig`]: host settings loaded from `fetchpub.yaml`
//!
//! # Architecture Note
//!
//! `AppState` is wrapped in `Arc<RwLock<>>` by [`StateManager`](crate::state::StateManager);
//! updates go through its `update()` method so change events are emitted consistently.

pub mod app_state;
pub mod config;
pub mod outcome;

pub use app_state::{AppState, STARTING_TEXT};
pub use self::config::{AppConfig, DEFAULT_IMAGE_URL};
pub use outcome::{LoadOutcome, LoadedImage};
