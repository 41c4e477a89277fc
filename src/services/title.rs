use std::sync::RwLock;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

pub const DEFAULT_TITLE: &str = "New Title";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TitleError {
    #[error("The title source is not active")]
    Inactive,

    #[error("The title is empty")]
    Empty,
}

/// Source of a title string
///
/// Three ways to ask, from least to most informative:
/// - [`title_basic()`](Self::title_basic): `None` on failure, the reason is lost
/// - [`title()`](Self::title): tagged result, exactly one of value / reason
/// - [`title_checked()`](Self::title_checked): like `title()` but also validates,
///   propagating either failure with `?`
#[cfg_attr(test, mockall::automock)]
pub trait TitleProvider: Send + Sync {
    fn title(&self) -> Result<String, TitleError>;

    fn title_basic(&self) -> Option<String> {
        self.title().ok()
    }

    fn title_checked(&self) -> Result<String, TitleError> {
        let title = self.title()?;
        ensure_not_blank(&title)?;
        Ok(title)
    }
}

fn ensure_not_blank(title: &str) -> Result<(), TitleError> {
    if title.trim().is_empty() {
        return Err(TitleError::Empty);
    }
    Ok(())
}

/// In-memory title source that can be switched on and off
#[derive(Debug)]
pub struct TitleManager {
    is_active: AtomicBool,
    title: RwLock<String>,
}

impl TitleManager {
    pub fn new(is_active: bool) -> Self {
        Self {
            is_active: AtomicBool::new(is_active),
            title: RwLock::new(DEFAULT_TITLE.to_string()),
        }
    }

    pub fn set_active(&self, is_active: bool) {
        self.is_active.store(is_active, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *self.title.write().unwrap_or_else(PoisonError::into_inner) = title.into();
    }
}

impl Default for TitleManager {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TitleProvider for TitleManager {
    fn title(&self) -> Result<String, TitleError> {
        if !self.is_active() {
            return Err(TitleError::Inactive);
        }
        Ok(self
            .title
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
