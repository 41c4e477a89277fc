// Console presenter - renders state change events as text lines
//
// Stands in for a real view: it only reads change events, never writes state.

use crate::state::{StateChange, StateManager};
use tokio::sync::{broadcast, watch};

/// One line of text for a change event
pub fn render_change(change: &StateChange) -> String {
    match change {
        StateChange::FetchStarted { url } => format!("[image] loading {}", url),
        StateChange::FetchSucceeded { url, width, height } => {
            format!("[image] {}x{} from {}", width, height, url)
        }
        StateChange::FetchFailed { message } => format!("[image] error: {}", message),
        StateChange::TextChanged { text } => format!("[title] {}", text),
        StateChange::EntryAppended { entry, total } => format!("[timeline #{}] {}", total, entry),
        StateChange::StateReset => "[state] reset".to_string(),
    }
}

/// Render change events until `stop` flips to true, then flush what is queued.
///
/// Subscribes before returning, so no event published after this call is missed.
/// The task resolves to the number of lines rendered.
pub fn spawn_console_presenter<F>(
    state: &StateManager,
    runtime: &tokio::runtime::Handle,
    mut stop: watch::Receiver<bool>,
    mut sink: F,
) -> tokio::task::JoinHandle<usize>
where
    F: FnMut(String) + Send + 'static,
{
    let mut rx = state.subscribe();

    runtime.spawn(async move {
        let mut rendered = 0;

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(change) => {
                        sink(render_change(&change));
                        rendered += 1;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Presenter lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        rendered += drain_queued(&mut rx, &mut sink);
                        break;
                    }
                }
            }
        }

        tracing::debug!("Console presenter rendered {} events", rendered);
        rendered
    })
}

/// Render whatever is already queued, skipping past a lag instead of stopping at it.
fn drain_queued<F>(rx: &mut broadcast::Receiver<StateChange>, sink: &mut F) -> usize
where
    F: FnMut(String),
{
    let mut rendered = 0;
    loop {
        match rx.try_recv() {
            Ok(change) => {
                sink(render_change(&change));
                rendered += 1;
            }
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!("Presenter lagged while flushing, skipped {} events", skipped);
            }
            Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => {
                return rendered;
            }
        }
    }
}
