//! Shared helpers for integration tests: a local image endpoint and a wired-up
//! main context + state holder.

#![allow(dead_code)]

use axum::Router;
use axum::http::{StatusCode, header};
use axum::routing::get;
use fetchpub::{
    AppConfig, FetchRequest, ImageLoader, MainContext, Metrics, StateChange, StateManager,
};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

pub const IMAGE_WIDTH: u32 = 20;
pub const IMAGE_HEIGHT: u32 = 10;

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Serve a few fixed routes on an ephemeral port:
/// - `/image.png`: 200 with a PNG
/// - `/missing`: 404
/// - `/error`: 500 with a valid PNG body (status must still win)
/// - `/garbage`: 200 with text
/// - `/slow`: PNG after 5 seconds
pub async fn spawn_image_server() -> SocketAddr {
    let app = Router::new()
        .route(
            "/image.png",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "image/png")],
                    png_bytes(IMAGE_WIDTH, IMAGE_HEIGHT),
                )
            }),
        )
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/error",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, png_bytes(1, 1)) }),
        )
        .route("/garbage", get(|| async { "definitely not an image" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                png_bytes(1, 1)
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

/// A URL nothing is listening on
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/image.png", addr)
}

pub fn request(addr: SocketAddr, path: &str) -> FetchRequest {
    FetchRequest::parse(&format!("http://{}{}", addr, path)).unwrap()
}

pub fn loader(metrics: Arc<Metrics>) -> ImageLoader {
    ImageLoader::new(&AppConfig::default(), metrics).unwrap()
}

/// Main context + state holder sharing one metrics instance
pub struct Harness {
    pub metrics: Arc<Metrics>,
    pub state: StateManager,
    pub main: MainContext,
}

impl Harness {
    /// Must be called from inside a tokio runtime
    pub fn start() -> Self {
        let metrics = Arc::new(Metrics::new());
        let state = StateManager::with_metrics(Arc::clone(&metrics));
        let main = MainContext::start(tokio::runtime::Handle::current(), Arc::clone(&metrics))
            .expect("Failed to start main context");
        state.bind_main_thread(main.handle().thread_id());
        Self {
            metrics,
            state,
            main,
        }
    }

    /// Wait until every job posted so far has run on the main context
    pub async fn settle(&self) {
        self.main.handle().run(|| ()).await.unwrap();
    }
}

/// Next fetch outcome event, skipping unrelated events
pub async fn next_outcome(rx: &mut broadcast::Receiver<StateChange>) -> StateChange {
    loop {
        let event = timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("Timeout waiting for fetch outcome")
            .expect("Channel closed");

        if matches!(
            event,
            StateChange::FetchSucceeded { .. } | StateChange::FetchFailed { .. }
        ) {
            return event;
        }
    }
}
