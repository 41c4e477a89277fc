use crate::services::TitleProvider;
use crate::state::StateManager;
use crate::ui::bridge::{BridgeError, MainContextHandle};
use std::sync::Arc;

/// Shows a provider's title, or why there is none, as display text
pub struct TitleViewModel<P: TitleProvider> {
    provider: Arc<P>,
    state: StateManager,
    main: MainContextHandle,
}

impl<P: TitleProvider + 'static> TitleViewModel<P> {
    pub fn new(provider: Arc<P>, state: StateManager, main: MainContextHandle) -> Self {
        Self {
            provider,
            state,
            main,
        }
    }

    /// Replace the text with the title, or with the failure's message.
    pub fn fetch_title(&self) -> Result<(), BridgeError> {
        let text = match self.provider.title_checked() {
            Ok(title) => title,
            Err(e) => {
                tracing::debug!("Title unavailable: {}", e);
                e.to_string()
            }
        };
        self.post_text(text)
    }

    /// Optional form: on absence the text is left as it was.
    pub fn fetch_title_basic(&self) -> Result<(), BridgeError> {
        match self.provider.title_basic() {
            Some(title) => self.post_text(title),
            None => {
                tracing::debug!("No title available, keeping current text");
                Ok(())
            }
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    fn post_text(&self, text: String) -> Result<(), BridgeError> {
        let state = self.state.clone();
        self.main.post(move || {
            state.set_text(text);
        })
    }
}
