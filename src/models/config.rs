use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_IMAGE_URL: &str = "https://picsum.photos/200";

/// Host configuration from `fetchpub.yaml` (plus `FETCHPUB_*` overrides)
///
/// Every field has a default so a partial file, or no file at all, is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Endpoint the image loader fetches
    pub image_url: String,

    /// Tokio worker threads used for background work
    pub worker_threads: usize,

    /// Optional upper bound on a single request; unset means wait for completion
    pub request_timeout_secs: Option<u64>,

    pub user_agent: String,

    pub debug_mode: bool,

    pub log_dir: String,

    /// Delay used by the timeline demo before producing a value
    pub timeline_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            image_url: DEFAULT_IMAGE_URL.to_string(),
            worker_threads: 4,
            request_timeout_secs: None,
            user_agent: format!("{}/{}", crate::APP_NAME, crate::VERSION),
            debug_mode: false,
            log_dir: "logs".to_string(),
            timeline_delay_ms: 2000,
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn timeline_delay(&self) -> Duration {
        Duration::from_millis(self.timeline_delay_ms)
    }
}
