// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events to any number of subscribers.

use crate::metrics::Metrics;
use crate::models::{AppState, LoadOutcome};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::thread::{self, ThreadId};
use tokio::sync::broadcast;

/// Capacity of the change event channel; slow subscribers see `Lagged`.
pub const CHANGE_CHANNEL_CAPACITY: usize = 100;

/// Change events emitted when state is modified
///
/// These events let presentation layers react to state changes without polling.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A fetch has been marked as in flight
    FetchStarted { url: String },

    /// A fetch completed with a decoded image
    FetchSucceeded {
        url: String,
        width: u32,
        height: u32,
    },

    /// A fetch completed with a failure; `message` is never empty
    FetchFailed { message: String },

    /// Title text changed
    TextChanged { text: String },

    /// A value was appended to the timeline
    EntryAppended { entry: String, total: usize },

    /// State has been reset
    StateReset,
}

/// Thread-safe state holder with change notification
///
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events over a tokio broadcast channel
/// - Records which thread performed each mutation
///
/// # Single writer
///
/// Only the main context should call the mutating methods. Once
/// [`bind_main_thread()`](Self::bind_main_thread) has been called, a mutation from any
/// other thread is logged as a warning.
pub struct StateManager {
    state: Arc<RwLock<AppState>>,
    state_tx: broadcast::Sender<StateChange>,
    main_thread: Arc<OnceLock<ThreadId>>,
    metrics: Arc<Metrics>,
}

impl StateManager {
    /// Create a new StateManager with default state
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(Metrics::new()))
    }

    /// Create a StateManager that reports into shared metrics
    pub fn with_metrics(metrics: Arc<Metrics>) -> Self {
        let (state_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
            main_thread: Arc::new(OnceLock::new()),
            metrics,
        }
    }

    /// Declare the thread that owns mutations. Later calls are ignored.
    pub fn bind_main_thread(&self, thread_id: ThreadId) {
        if self.main_thread.set(thread_id).is_err() {
            tracing::debug!("Main thread already bound, ignoring rebind");
        }
    }

    /// Get a clone of the current state
    pub fn snapshot(&self) -> AppState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let loading = state_manager.read(|state| state.is_loading);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Stamps the writer thread and revision
    /// 4. Detects what changed and broadcasts it
    ///
    /// Returns the events that were emitted.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let writer = thread::current().id();
        if let Some(main) = self.main_thread.get() {
            if *main != writer {
                tracing::warn!(?writer, ?main, "State mutated off the main context");
            }
        }

        let changes = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let old_state = state.clone();

            update_fn(&mut state);
            state.last_writer = Some(writer);
            state.revision += 1;

            detect_changes(&old_state, &state)
        };

        self.metrics.record_state_update();
        for change in &changes {
            self.emit(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get all future state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn emit(&self, change: StateChange) {
        self.metrics.record_state_broadcast();
        // No subscribers is fine; the state itself is still updated
        if self.state_tx.send(change).is_err() {
            self.metrics.record_state_broadcast_unobserved();
        }
    }

    // Convenience methods for common state updates

    /// Mark a fetch for `url` as in flight
    pub fn begin_fetch(&self, url: &str) -> Vec<StateChange> {
        self.update(|state| state.begin_fetch(url))
    }

    /// Publish the terminal outcome of a fetch (last write wins)
    pub fn apply_outcome(&self, outcome: LoadOutcome) -> Vec<StateChange> {
        self.update(|state| state.apply_outcome(outcome))
    }

    /// Replace the title text
    pub fn set_text(&self, text: impl Into<String>) -> Vec<StateChange> {
        let text = text.into();
        self.update(|state| state.text = text)
    }

    /// Append one value to the timeline
    pub fn push_entry(&self, entry: impl Into<String>) -> Vec<StateChange> {
        let entry = entry.into();
        self.update(|state| state.entries.push(entry))
    }

    /// Reset everything observable back to defaults
    pub fn reset(&self) -> Vec<StateChange> {
        let mut changes = self.update(|state| state.reset());

        let reset_event = StateChange::StateReset;
        self.emit(reset_event.clone());
        changes.push(reset_event);

        changes
    }

    /// Shared metrics handle
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}

/// Detect what changed between two states and generate events
fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
    let mut changes = Vec::new();

    if new.started_fetches > old.started_fetches {
        changes.push(StateChange::FetchStarted {
            url: new.pending_url.clone().unwrap_or_default(),
        });
    }

    if new.completed_fetches > old.completed_fetches {
        match (&new.image, &new.error_message) {
            (Some(image), _) => changes.push(StateChange::FetchSucceeded {
                url: image.url.clone(),
                width: image.width,
                height: image.height,
            }),
            (None, Some(message)) => changes.push(StateChange::FetchFailed {
                message: message.clone(),
            }),
            (None, None) => {
                tracing::error!("Completed fetch left neither image nor error in state");
            }
        }
    }

    if old.text != new.text {
        changes.push(StateChange::TextChanged {
            text: new.text.clone(),
        });
    }

    if new.entries.len() > old.entries.len() && new.entries.starts_with(&old.entries) {
        let total = new.entries.len();
        for entry in &new.entries[old.entries.len()..] {
            changes.push(StateChange::EntryAppended {
                entry: entry.clone(),
                total,
            });
        }
    }

    changes
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Cloning shares the same state, channel and metrics
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
            main_thread: Arc::clone(&self.main_thread),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoadedImage, STARTING_TEXT};
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::sync::atomic::Ordering;

    fn loaded(url: &str) -> LoadOutcome {
        let pixels = DynamicImage::ImageRgba8(RgbaImage::new(8, 6));
        LoadOutcome::Loaded(LoadedImage::new(url, Some(ImageFormat::Png), 100, pixels))
    }

    #[test]
    fn test_new_state_manager() {
        let manager = StateManager::new();
        let state = manager.snapshot();

        assert!(!state.is_loading);
        assert!(state.image.is_none());
        assert_eq!(state.text, STARTING_TEXT);
    }

    #[test]
    fn test_begin_fetch_emits_started() {
        let manager = StateManager::new();

        let changes = manager.begin_fetch("http://a/img");

        assert_eq!(
            changes,
            vec![StateChange::FetchStarted {
                url: "http://a/img".to_string()
            }]
        );
        assert!(manager.read(|s| s.is_loading));
    }

    #[test]
    fn test_overlapping_begin_emits_each_start() {
        let manager = StateManager::new();
        manager.begin_fetch("http://a/first");

        let changes = manager.begin_fetch("http://a/second");
        assert_eq!(
            changes,
            vec![StateChange::FetchStarted {
                url: "http://a/second".to_string()
            }]
        );

        let changes = manager.apply_outcome(LoadOutcome::Failed("first done".to_string()));
        assert_eq!(
            changes,
            vec![StateChange::FetchFailed {
                message: "first done".to_string()
            }]
        );

        let state = manager.snapshot();
        assert!(state.is_loading);
        assert_eq!(state.pending_url.as_deref(), Some("http://a/second"));
        assert_eq!(state.status_line(), "Loading http://a/second...");
    }

    #[test]
    fn test_apply_success() {
        let manager = StateManager::new();
        manager.begin_fetch("http://a/img");

        let changes = manager.apply_outcome(loaded("http://a/img"));

        assert_eq!(
            changes,
            vec![StateChange::FetchSucceeded {
                url: "http://a/img".to_string(),
                width: 8,
                height: 6
            }]
        );
        let state = manager.snapshot();
        assert!(!state.is_loading);
        assert!(state.has_exclusive_outcome());
    }

    #[test]
    fn test_apply_failure() {
        let manager = StateManager::new();

        let changes = manager.apply_outcome(LoadOutcome::Failed("offline".to_string()));

        assert_eq!(
            changes,
            vec![StateChange::FetchFailed {
                message: "offline".to_string()
            }]
        );
    }

    #[test]
    fn test_repeated_failure_still_emits() {
        let manager = StateManager::new();
        manager.apply_outcome(LoadOutcome::Failed("offline".to_string()));

        let changes = manager.apply_outcome(LoadOutcome::Failed("offline".to_string()));

        assert_eq!(changes.len(), 1);
        assert!(matches!(changes[0], StateChange::FetchFailed { .. }));
    }

    #[test]
    fn test_last_write_wins() {
        let manager = StateManager::new();

        manager.apply_outcome(loaded("http://a/first"));
        manager.apply_outcome(loaded("http://a/second"));

        let state = manager.snapshot();
        assert_eq!(state.image.unwrap().url, "http://a/second");
        assert_eq!(state.completed_fetches, 2);
    }

    #[test]
    fn test_text_and_entries() {
        let manager = StateManager::new();

        let changes = manager.set_text("New Title");
        assert_eq!(
            changes,
            vec![StateChange::TextChanged {
                text: "New Title".to_string()
            }]
        );

        manager.push_entry("Title 1");
        let changes = manager.update(|s| {
            s.entries.push("Title 2".to_string());
            s.entries.push("Title 3".to_string());
        });
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[1],
            StateChange::EntryAppended {
                entry: "Title 3".to_string(),
                total: 3
            }
        );
    }

    #[test]
    fn test_unchanged_text_emits_nothing() {
        let manager = StateManager::new();
        let changes = manager.set_text(STARTING_TEXT);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_reset() {
        let manager = StateManager::new();
        manager.apply_outcome(loaded("http://a/img"));
        manager.push_entry("Title 1");

        let changes = manager.reset();

        assert!(changes.iter().any(|c| matches!(c, StateChange::StateReset)));
        let state = manager.snapshot();
        assert!(state.image.is_none());
        assert!(state.entries.is_empty());
    }

    #[test]
    fn test_update_records_writer_and_revision() {
        let manager = StateManager::new();
        manager.set_text("a");
        manager.set_text("b");

        let state = manager.snapshot();
        assert_eq!(state.last_writer, Some(thread::current().id()));
        assert_eq!(state.revision, 2);
    }

    #[test]
    fn test_writer_from_other_thread() {
        let manager = StateManager::new();
        let worker = manager.clone();

        let worker_id = std::thread::spawn(move || {
            worker.set_text("from worker");
            thread::current().id()
        })
        .join()
        .unwrap();

        assert_eq!(manager.read(|s| s.last_writer), Some(worker_id));
        assert_ne!(worker_id, thread::current().id());
    }

    #[test]
    fn test_subscribe_to_changes() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        manager.begin_fetch("http://a/img");

        let event = rx.try_recv();
        assert!(matches!(event, Ok(StateChange::FetchStarted { .. })));
    }

    #[test]
    fn test_multiple_subscribers() {
        let manager = StateManager::new();
        let mut rx1 = manager.subscribe();
        let mut rx2 = manager.subscribe();

        manager.set_text("New Title");

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_metrics_counted() {
        let manager = StateManager::new();
        manager.set_text("unobserved");

        let metrics = manager.metrics();
        assert_eq!(metrics.state_updates.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.state_broadcasts.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.state_broadcast_unobserved.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_clone_shares_state() {
        let manager1 = StateManager::new();
        let manager2 = manager1.clone();

        manager1.set_text("shared");

        assert_eq!(manager2.snapshot().text, "shared");
    }
}
