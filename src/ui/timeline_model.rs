// Timeline view model
//
// Produces timer-delayed values and appends them to the timeline. Each value is
// labelled with the context that produced it, which makes the hop from a
// runtime worker to the main context visible in the entries themselves.

use crate::state::StateManager;
use crate::ui::bridge::{BridgeError, MainContextHandle, current_context_name};
use std::time::Duration;

pub struct TimelineViewModel {
    state: StateManager,
    main: MainContextHandle,
}

impl TimelineViewModel {
    pub fn new(state: StateManager, main: MainContextHandle) -> Self {
        Self { state, main }
    }

    /// After `delay`, produce and append a value entirely on the main context.
    pub fn add_title_on_main(
        &self,
        delay: Duration,
    ) -> tokio::task::JoinHandle<Result<(), BridgeError>> {
        let state = self.state.clone();
        self.main.post_after(delay, move || {
            state.push_entry(format!("Title 1: {}", current_context_name()));
        })
    }

    /// After `delay`, produce a value on a runtime worker, then hop to main and
    /// append it followed by a second value produced on main.
    pub fn add_title_from_background(&self, delay: Duration) -> tokio::task::JoinHandle<()> {
        let state = self.state.clone();
        let main = self.main.clone();
        self.main.spawn_async(move || async move {
            tokio::time::sleep(delay).await;
            let title = format!("Title 2: {}", current_context_name());

            let posted = main.post(move || {
                state.push_entry(title);
                state.push_entry(format!("Title 3: {}", current_context_name()));
            });
            if let Err(e) = posted {
                tracing::warn!("Dropping timeline values: {}", e);
            }
        })
    }

    /// Produce a value on the calling task and append it on main.
    pub async fn add_author(&self) -> Result<(), BridgeError> {
        let author = format!("Author 1: {}", current_context_name());
        let state = self.state.clone();
        self.main
            .run(move || {
                state.push_entry(author);
            })
            .await
    }
}
