use image::{DynamicImage, ImageFormat};
use std::fmt;
use std::sync::Arc;

/// A decoded image together with where it came from
///
/// Pixels are shared behind an `Arc` so snapshots of [`crate::models::AppState`]
/// stay cheap to clone.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub format: Option<ImageFormat>,
    pub byte_len: usize,
    pub pixels: Arc<DynamicImage>,
}

impl LoadedImage {
    pub fn new(
        url: impl Into<String>,
        format: Option<ImageFormat>,
        byte_len: usize,
        pixels: DynamicImage,
    ) -> Self {
        Self {
            url: url.into(),
            width: pixels.width(),
            height: pixels.height(),
            format,
            byte_len,
            pixels: Arc::new(pixels),
        }
    }

    /// Short human readable description, e.g. `200x200 Png (1532 bytes)`
    pub fn describe(&self) -> String {
        match self.format {
            Some(format) => format!(
                "{}x{} {:?} ({} bytes)",
                self.width, self.height, format, self.byte_len
            ),
            None => format!("{}x{} ({} bytes)", self.width, self.height, self.byte_len),
        }
    }
}

/// Terminal outcome of one fetch as seen by the state holder
///
/// Structured errors stop at the view model; only their display text reaches
/// observable state.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome {
    Loaded(LoadedImage),
    Failed(String),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }
}

impl<E: fmt::Display> From<Result<LoadedImage, E>> for LoadOutcome {
    fn from(result: Result<LoadedImage, E>) -> Self {
        match result {
            Ok(image) => LoadOutcome::Loaded(image),
            Err(e) => {
                let message = e.to_string();
                if message.trim().is_empty() {
                    LoadOutcome::Failed("Unknown error".to_string())
                } else {
                    LoadOutcome::Failed(message)
                }
            }
        }
    }
}
