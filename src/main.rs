//! fetchpub - headless host for the fetch-and-publish loader
//!
//! # Overview
//!
//! The binary stands in for an interactive preview: it wires the library
//! components together and exercises every style of asynchrony once.
//! - Configuration ([`ConfigManager`]: `fetchpub-data/fetchpub.yaml` + `FETCHPUB_*`)
//! - Logging (file rotation + console output)
//! - Tokio runtime for background work
//! - Main context thread, the only writer of observable state
//! - Console presenter printing state change events
//!
//! # Execution Flow
//!
//! 1. Load configuration, initialize logging
//! 2. Create the runtime, the state holder and the main context
//! 3. Fetch the configured image three times (callback, stream, async)
//! 4. Run the title demo (inactive, then active) and the timeline demo
//! 5. Stop the presenter, shut down the main context and the runtime

use anyhow::{Context, Result};
use fetchpub::services::TitleManager;
use fetchpub::ui::{ImageViewModel, TimelineViewModel, TitleViewModel, spawn_console_presenter};
use fetchpub::{
    APP_NAME, ConfigManager, FetchRequest, ImageLoader, MainContext, Metrics, StateManager,
    VERSION,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const CONFIG_DIR: &str = "fetchpub-data";

fn main() -> Result<()> {
    let config_manager = ConfigManager::new(CONFIG_DIR)?;
    let config = config_manager.load_config()?;

    let _log_guard = fetchpub::logging::setup_logging_with_console(
        &config.log_dir,
        APP_NAME,
        config.debug_mode,
        true,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(config.worker_threads)
        .thread_name("fetchpub-worker")
        .build()?;

    tracing::info!(
        "Tokio runtime initialized with {} worker threads",
        config.worker_threads
    );

    let metrics = Arc::new(Metrics::new());
    let state_manager = StateManager::with_metrics(Arc::clone(&metrics));

    let main_context = MainContext::start(runtime.handle().clone(), Arc::clone(&metrics))
        .context("Failed to start main context")?;
    let main = main_context.handle();
    state_manager.bind_main_thread(main.thread_id());

    let (stop_tx, stop_rx) = watch::channel(false);
    let presenter = spawn_console_presenter(&state_manager, runtime.handle(), stop_rx, |line| {
        println!("{}", line)
    });

    let loader = ImageLoader::new(&config, Arc::clone(&metrics))?;
    let request = FetchRequest::parse(&config.image_url)?;
    let images = ImageViewModel::new(loader, request, state_manager.clone(), main.clone());

    let title_source = Arc::new(TitleManager::new(false));
    let titles = TitleViewModel::new(
        Arc::clone(&title_source),
        state_manager.clone(),
        main.clone(),
    );
    let timeline = TimelineViewModel::new(state_manager.clone(), main.clone());

    let demo = runtime.block_on(async {
        images.fetch_image().await?;
        images.fetch_image_stream().await?;
        let outcome = images.fetch_image_async().await?;
        tracing::info!("Async fetch finished, loaded={}", outcome.is_loaded());

        titles.fetch_title_basic()?;
        titles.fetch_title()?;
        title_source.set_active(true);
        titles.fetch_title()?;

        let delay = config.timeline_delay();
        let on_main = timeline.add_title_on_main(delay);
        let from_background = timeline.add_title_from_background(delay);
        timeline.add_author().await?;
        on_main.await??;
        from_background.await?;

        // Everything posted so far has run once this returns
        main.run(|| ()).await?;
        Ok::<_, anyhow::Error>(())
    });

    if let Err(e) = &demo {
        tracing::error!("Demo aborted: {:#}", e);
    }

    let _ = stop_tx.send(true);
    let rendered = runtime.block_on(presenter).unwrap_or_default();
    tracing::info!("Presenter rendered {} state changes", rendered);

    let final_state = state_manager.snapshot();
    tracing::info!(
        "Final state: status='{}', text='{}', entries={}, revision={}",
        final_state.status_line(),
        final_state.text,
        final_state.entries.len(),
        final_state.revision
    );

    main_context.shutdown();
    metrics.log_summary();
    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Shutdown complete");
    demo
}
