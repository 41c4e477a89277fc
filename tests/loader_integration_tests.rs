//! Integration tests for ImageLoader against a local HTTP endpoint
//!
//! These tests verify:
//! - Successful fetch and decode
//! - Transport, status, decode and timeout failures
//! - Exactly one outcome from the callback and stream forms
//! - All three forms agree on the outcome

mod common;

use common::{IMAGE_HEIGHT, IMAGE_WIDTH, request, spawn_image_server, unreachable_url};
use fetchpub::{AppConfig, FetchError, FetchRequest, ImageLoader, LoadOutcome, Metrics};
use image::ImageFormat;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Duration;

#[tokio::test]
async fn test_fetch_success() {
    let addr = spawn_image_server().await;
    let metrics = Arc::new(Metrics::new());
    let loader = common::loader(Arc::clone(&metrics));

    let image = loader.fetch(&request(addr, "/image.png")).await.unwrap();

    assert_eq!(image.width, IMAGE_WIDTH);
    assert_eq!(image.height, IMAGE_HEIGHT);
    assert_eq!(image.format, Some(ImageFormat::Png));
    assert!(image.url.ends_with("/image.png"));
    assert_eq!(metrics.fetches_started.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.fetches_succeeded.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_fetch_transport_failure() {
    let loader = common::loader(Arc::new(Metrics::new()));
    let request = FetchRequest::parse(&unreachable_url().await).unwrap();

    let err = loader.fetch(&request).await.unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }), "got {:?}", err);
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn test_fetch_non_success_status() {
    let addr = spawn_image_server().await;
    let loader = common::loader(Arc::new(Metrics::new()));

    let server_error = loader.fetch(&request(addr, "/error")).await.unwrap_err();
    let not_found = loader.fetch(&request(addr, "/missing")).await.unwrap_err();

    assert!(matches!(server_error, FetchError::Status { status: 500, .. }));
    assert!(matches!(not_found, FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_fetch_undecodable_payload() {
    let addr = spawn_image_server().await;
    let loader = common::loader(Arc::new(Metrics::new()));

    let err = loader.fetch(&request(addr, "/garbage")).await.unwrap_err();

    assert!(matches!(err, FetchError::Decode { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_fetch_timeout_is_a_failure() {
    let addr = spawn_image_server().await;
    let config = AppConfig {
        request_timeout_secs: Some(1),
        ..AppConfig::default()
    };
    let metrics = Arc::new(Metrics::new());
    let loader = ImageLoader::new(&config, Arc::clone(&metrics)).unwrap();

    let err = loader.fetch(&request(addr, "/slow")).await.unwrap_err();

    assert!(matches!(err, FetchError::Timeout { .. }), "got {:?}", err);
    assert_eq!(metrics.fetches_failed.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_every_failure_maps_to_one_outcome_kind() {
    let addr = spawn_image_server().await;
    let loader = common::loader(Arc::new(Metrics::new()));
    let unreachable = FetchRequest::parse(&unreachable_url().await).unwrap();

    let outcomes = vec![
        LoadOutcome::from(loader.fetch(&unreachable).await),
        LoadOutcome::from(loader.fetch(&request(addr, "/error")).await),
        LoadOutcome::from(loader.fetch(&request(addr, "/garbage")).await),
    ];

    for outcome in outcomes {
        match outcome {
            LoadOutcome::Failed(message) => assert!(!message.is_empty()),
            other => panic!("Expected failure, got {:?}", other),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_callback_invoked_exactly_once() {
    let addr = spawn_image_server().await;
    let loader = common::loader(Arc::new(Metrics::new()));
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let task = loader.fetch_with_callback(
        request(addr, "/image.png"),
        &tokio::runtime::Handle::current(),
        move |result| {
            assert!(result.is_ok());
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );
    task.await.unwrap();

    // Give a stray second invocation a chance to show up
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_callback_invoked_once_on_failure() {
    let loader = common::loader(Arc::new(Metrics::new()));
    let request = FetchRequest::parse(&unreachable_url().await).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    loader
        .fetch_with_callback(request, &tokio::runtime::Handle::current(), move |result| {
            assert!(result.is_err());
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stream_emits_single_item() {
    let addr = spawn_image_server().await;
    let loader = common::loader(Arc::new(Metrics::new()));

    let mut stream = loader.fetch_stream(request(addr, "/image.png"));
    let mut items = 0;
    while let Some(result) = stream.next().await {
        assert!(result.is_ok());
        items += 1;
    }

    assert_eq!(items, 1);
    assert!(stream.is_terminated());
}

#[tokio::test]
async fn test_stream_is_lazy() {
    let addr = spawn_image_server().await;
    let metrics = Arc::new(Metrics::new());
    let loader = common::loader(Arc::clone(&metrics));

    let stream = loader.fetch_stream(request(addr, "/image.png"));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(metrics.fetches_started.load(Ordering::Relaxed), 0);
    drop(stream);
}

#[tokio::test]
async fn test_all_styles_agree() {
    let addr = spawn_image_server().await;
    let loader = common::loader(Arc::new(Metrics::new()));

    for path in ["/image.png", "/error"] {
        let awaited = LoadOutcome::from(loader.fetch(&request(addr, path)).await);

        let streamed = LoadOutcome::from(
            loader
                .fetch_stream(request(addr, path))
                .next()
                .await
                .expect("stream yielded nothing"),
        );

        let (tx, rx) = tokio::sync::oneshot::channel();
        loader.fetch_with_callback(
            request(addr, path),
            &tokio::runtime::Handle::current(),
            move |result| {
                let _ = tx.send(LoadOutcome::from(result));
            },
        );
        let called_back = rx.await.unwrap();

        assert_eq!(awaited, streamed, "stream differs for {}", path);
        assert_eq!(awaited, called_back, "callback differs for {}", path);
    }
}
