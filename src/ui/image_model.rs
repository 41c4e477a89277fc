// Image view model
//
// Triggers an image fetch and publishes its outcome. Three entry points, one per
// style of asynchrony; all of them go through ImageLoader::fetch and all of them
// mutate state only from the main context.

use crate::models::{LoadOutcome, LoadedImage};
use crate::services::{FetchError, FetchRequest, ImageLoader};
use crate::state::StateManager;
use crate::ui::bridge::{BridgeError, MainContextHandle};

pub struct ImageViewModel {
    loader: ImageLoader,
    request: FetchRequest,
    state: StateManager,
    main: MainContextHandle,
}

impl ImageViewModel {
    pub fn new(
        loader: ImageLoader,
        request: FetchRequest,
        state: StateManager,
        main: MainContextHandle,
    ) -> Self {
        Self {
            loader,
            request,
            state,
            main,
        }
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    /// Callback style: returns immediately; the completion hops to main.
    pub fn fetch_image(&self) -> tokio::task::JoinHandle<()> {
        self.post_started();

        let state = self.state.clone();
        let main = self.main.clone();
        self.loader.fetch_with_callback(
            self.request.clone(),
            self.main.tokio_handle(),
            move |result| publish(&main, &state, result),
        )
    }

    /// Stream style: every item the stream emits is received on main.
    pub fn fetch_image_stream(&self) -> tokio::task::JoinHandle<()> {
        self.post_started();

        let mut stream = self.loader.fetch_stream(self.request.clone());
        let state = self.state.clone();
        let main = self.main.clone();
        self.main.spawn_async(move || async move {
            while let Some(result) = stream.next().await {
                publish(&main, &state, result);
            }
        })
    }

    /// Suspend/resume style: resumes once the outcome has been applied on main.
    pub async fn fetch_image_async(&self) -> Result<LoadOutcome, BridgeError> {
        let state = self.state.clone();
        let url = self.request.url().to_string();
        self.main.post(move || {
            state.begin_fetch(&url);
        })?;

        let outcome = LoadOutcome::from(self.loader.fetch(&self.request).await);

        let state = self.state.clone();
        let applied = outcome.clone();
        self.main
            .run(move || {
                state.apply_outcome(applied);
            })
            .await?;

        Ok(outcome)
    }

    fn post_started(&self) {
        let state = self.state.clone();
        let url = self.request.url().to_string();
        if let Err(e) = self.main.post(move || {
            state.begin_fetch(&url);
        }) {
            tracing::warn!("Could not mark fetch as started: {}", e);
        }
    }
}

fn publish(
    main: &MainContextHandle,
    state: &StateManager,
    result: Result<LoadedImage, FetchError>,
) {
    let outcome = LoadOutcome::from(result);
    let state = state.clone();
    if let Err(e) = main.post(move || {
        state.apply_outcome(outcome);
    }) {
        tracing::warn!("Dropping fetch outcome: {}", e);
    }
}
