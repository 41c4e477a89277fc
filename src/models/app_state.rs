use crate::models::outcome::{LoadOutcome, LoadedImage};
use std::thread::ThreadId;

/// Text shown before any title has been fetched.
pub const STARTING_TEXT: &str = "Starting Text";

/// Single source of truth for everything a presentation layer observes.
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`].
/// Mutations go through [`StateManager::update()`](crate::state::StateManager::update),
/// which is only ever called from the main context, and every mutation records
/// the writing thread in [`last_writer`](Self::last_writer).
///
/// # Outcome exclusivity
///
/// After a fetch completes exactly one of [`image`](Self::image) and
/// [`error_message`](Self::error_message) is set. [`apply_outcome()`](Self::apply_outcome)
/// is the only place that writes either of them.
#[derive(Clone, Debug)]
pub struct AppState {
    // Image fetch
    pub image: Option<LoadedImage>,
    pub error_message: Option<String>,
    pub is_loading: bool,
    pub pending_url: Option<String>,
    pub started_fetches: u64,
    pub completed_fetches: u64,
    /// Fetches started but not yet resolved; `is_loading` mirrors `> 0`
    pub in_flight: u32,

    // Title demo
    pub text: String,

    // Timeline demo (history of produced values)
    pub entries: Vec<String>,

    // Bookkeeping
    pub last_writer: Option<ThreadId>,
    pub revision: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            image: None,
            error_message: None,
            is_loading: false,
            pending_url: None,
            started_fetches: 0,
            completed_fetches: 0,
            in_flight: 0,
            text: STARTING_TEXT.to_string(),
            entries: Vec::new(),
            last_writer: None,
            revision: 0,
        }
    }
}

impl AppState {
    /// Mark a fetch as in flight.
    ///
    /// The previous outcome stays visible until the new one lands.
    pub fn begin_fetch(&mut self, url: &str) {
        self.started_fetches += 1;
        self.in_flight += 1;
        self.is_loading = true;
        self.pending_url = Some(url.to_string());
    }

    /// Apply a terminal outcome; the newest outcome always wins.
    pub fn apply_outcome(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded(image) => {
                self.image = Some(image);
                self.error_message = None;
            }
            LoadOutcome::Failed(message) => {
                self.image = None;
                self.error_message = Some(message);
            }
        }
        // An outcome that was never marked as started still counts as completed
        self.in_flight = self.in_flight.saturating_sub(1);
        self.is_loading = self.in_flight > 0;
        if !self.is_loading {
            self.pending_url = None;
        }
        self.completed_fetches += 1;
    }

    /// True when exactly one of payload / error is populated.
    pub fn has_exclusive_outcome(&self) -> bool {
        self.image.is_some() != self.error_message.is_some()
    }

    /// Text a view would render in place of the image.
    pub fn status_line(&self) -> String {
        if self.is_loading {
            return match &self.pending_url {
                Some(url) => format!("Loading {}...", url),
                None => "Loading...".to_string(),
            };
        }
        match (&self.image, &self.error_message) {
            (Some(image), _) => format!("Loaded {}", image.describe()),
            (None, Some(message)) => message.clone(),
            (None, None) => String::new(),
        }
    }

    pub fn reset(&mut self) {
        self.image = None;
        self.error_message = None;
        self.is_loading = false;
        self.pending_url = None;
        self.started_fetches = 0;
        self.completed_fetches = 0;
        self.in_flight = 0;
        self.text = STARTING_TEXT.to_string();
        self.entries.clear();
    }
}
