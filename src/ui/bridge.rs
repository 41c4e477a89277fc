// Main context bridge - hands work from tokio tasks to the single main thread
//
// Two execution contexts are in play:
// 1. The tokio multi-threaded runtime, where fetches and timers run
// 2. One dedicated "main" thread, the only place observable state is mutated
//
// The bridge owns the main thread and the receiving half of its job channel.
// Anything that wants to touch observable state posts a closure here; the main
// thread drains the channel and runs jobs one at a time in posting order.

use crate::metrics::Metrics;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Name given to the main context thread.
pub const MAIN_CONTEXT_NAME: &str = "fetchpub-main";

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Shutdown,
}

/// Errors from handing work to the main context
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("main context has shut down")]
    Closed,

    #[error("main context dropped the job before it produced a value")]
    JobDropped,
}

/// Owner of the main context thread
///
/// # Example
/// ```ignore
/// let runtime = tokio::runtime::Runtime::new()?;
/// let main = MainContext::start(runtime.handle().clone(), metrics)?;
/// let handle = main.handle();
///
/// handle.spawn_async(move || async move {
///     let value = do_background_work().await;
///     let _ = handle.post(move || state.set_text(value));
/// });
///
/// main.shutdown();
/// ```
pub struct MainContext {
    handle: MainContextHandle,
    thread: Option<JoinHandle<()>>,
}

impl MainContext {
    /// Spawn the main context thread.
    pub fn start(
        tokio_handle: tokio::runtime::Handle,
        metrics: Arc<Metrics>,
    ) -> std::io::Result<Self> {
        let (job_tx, mut job_rx) = mpsc::unbounded_channel::<Message>();

        let loop_metrics = Arc::clone(&metrics);
        let thread = thread::Builder::new()
            .name(MAIN_CONTEXT_NAME.to_string())
            .spawn(move || {
                tracing::debug!("Main context thread started");

                while let Some(message) = job_rx.blocking_recv() {
                    match message {
                        Message::Run(job) => run_job(job, &loop_metrics),
                        Message::Shutdown => {
                            // Refuse new work, then finish what was already queued
                            job_rx.close();
                            while let Ok(message) = job_rx.try_recv() {
                                if let Message::Run(job) = message {
                                    run_job(job, &loop_metrics);
                                }
                            }
                            break;
                        }
                    }
                }

                tracing::debug!("Main context thread terminated");
            })?;

        let handle = MainContextHandle {
            job_tx,
            tokio_handle,
            thread_id: thread.thread().id(),
            metrics,
        };

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Cloneable handle for posting work
    pub fn handle(&self) -> MainContextHandle {
        self.handle.clone()
    }

    /// Stop accepting jobs, run the ones already queued and join the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        // Ignore the error: the loop may already be gone
        let _ = self.handle.job_tx.send(Message::Shutdown);

        if thread::current().id() == self.handle.thread_id {
            tracing::warn!("Main context shut down from its own thread; not joining");
            return;
        }
        if thread.join().is_err() {
            tracing::error!("Main context thread panicked");
        }
    }
}

impl Drop for MainContext {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_job(job: Job, metrics: &Metrics) {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        tracing::error!("Job panicked on the main context; continuing");
    }
    metrics.record_main_job();
}

/// Lightweight handle that can be cloned into tasks and callbacks
#[derive(Clone)]
pub struct MainContextHandle {
    job_tx: mpsc::UnboundedSender<Message>,
    tokio_handle: tokio::runtime::Handle,
    thread_id: ThreadId,
    metrics: Arc<Metrics>,
}

impl MainContextHandle {
    /// Queue a job to run on the main context.
    ///
    /// Never blocks and never drops the job while the context is running.
    pub fn post<F>(&self, job: F) -> Result<(), BridgeError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.job_tx
            .send(Message::Run(Box::new(job)))
            .map_err(|_| {
                self.metrics.record_main_job_rejected();
                tracing::warn!("Failed to post job - main context has stopped");
                BridgeError::Closed
            })
    }

    /// Queue a job on the main context once `delay` has elapsed.
    ///
    /// The timer runs on the tokio runtime, so the main context stays free meanwhile.
    pub fn post_after<F>(
        &self,
        delay: Duration,
        job: F,
    ) -> tokio::task::JoinHandle<Result<(), BridgeError>>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = self.clone();
        self.tokio_handle.spawn(async move {
            tokio::time::sleep(delay).await;
            handle.post(job)
        })
    }

    /// Run a job on the main context and await its return value.
    pub async fn run<F, R>(&self, job: F) -> Result<R, BridgeError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        self.post(move || {
            let _ = result_tx.send(job());
        })?;
        result_rx.await.map_err(|_| BridgeError::JobDropped)
    }

    /// Spawn an async task on the tokio runtime
    pub fn spawn_async<F, Fut>(&self, future_factory: F) -> tokio::task::JoinHandle<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            future_factory().await;
        })
    }

    /// True when called from the main context thread
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    pub fn tokio_handle(&self) -> &tokio::runtime::Handle {
        &self.tokio_handle
    }
}

/// Name of the calling thread, for labelling values by the context that produced them
pub fn current_context_name() -> String {
    let current = thread::current();
    match current.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", current.id()),
    }
}
