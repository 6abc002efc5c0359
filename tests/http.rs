//! End-to-end tests against a local mock origin.
//!
//! Spins up an axum server on `127.0.0.1:0` that serves a two-page
//! country list in the nested shape of a real countries API, plus flag
//! images, and drives the HTTP fetcher, downloader, and session through it.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use pagefeed::config::{parse_config, ArtifactsConfig, SourceConfig};
use pagefeed::download::HttpArtifactSource;
use pagefeed::error::{ArtifactFetchError, FetchError};
use pagefeed::fetcher::HttpPageFetcher;
use pagefeed::scroll::scroll_to_end;
use pagefeed::session::Session;
use pagefeed::traits::{ArtifactSource, PageFetcher};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone)]
struct Origin {
    base: String,
    flag_hits: Arc<AtomicUsize>,
}

async fn countries(
    State(origin): State<Origin>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let flag_url = |code: &str| format!("{}/flags/{}.png", origin.base, code);
    match params.get("page").map(String::as_str) {
        Some("2") => Json(json!({
            "countries": [
                { "name": "Denmark", "countryInfo": { "flag": flag_url("dk") } },
                { "name": "Atlantis", "countryInfo": { "flag": flag_url("missing") } }
            ],
            "next": ""
        })),
        _ => Json(json!({
            "countries": [
                { "name": "Aruba", "countryInfo": { "flag": flag_url("aw") } },
                { "name": "Brazil", "countryInfo": { "flag": flag_url("br") } },
                { "name": "Chad", "countryInfo": { "flag": flag_url("td") } }
            ],
            "next": "/countries?page=2"
        })),
    }
}

async fn flag(State(origin): State<Origin>, Path(file): Path<String>) -> Response {
    origin.flag_hits.fetch_add(1, Ordering::SeqCst);
    if file.starts_with("missing") {
        return StatusCode::NOT_FOUND.into_response();
    }
    (
        [(header::CONTENT_TYPE, "image/png")],
        format!("PNG:{}", file).into_bytes(),
    )
        .into_response()
}

/// 4 KiB with no `Content-Length`, sent in 512-byte chunks.
async fn streamed() -> Body {
    let chunks = (0..8).map(|_| Ok::<_, std::io::Error>(vec![b'x'; 512]));
    Body::from_stream(futures::stream::iter(chunks))
}

async fn unavailable() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn garbage() -> &'static str {
    "<html>not json</html>"
}

async fn spawn_origin() -> Origin {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = Origin {
        base: format!("http://{}", listener.local_addr().unwrap()),
        flag_hits: Arc::new(AtomicUsize::new(0)),
    };
    let app = Router::new()
        .route("/countries", get(countries))
        .route("/flags/{file}", get(flag))
        .route("/stream", get(streamed))
        .route("/unavailable", get(unavailable))
        .route("/garbage", get(garbage))
        .with_state(origin.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    origin
}

fn countries_source(base: &str) -> SourceConfig {
    let mut cfg = SourceConfig::for_endpoint(format!("{}/countries", base));
    cfg.items_field = "countries".to_string();
    cfg.artifact_field = "countryInfo.flag".to_string();
    cfg
}

#[tokio::test]
async fn fetcher_follows_relative_next_path() {
    let origin = spawn_origin().await;
    let fetcher = HttpPageFetcher::new(countries_source(&origin.base)).unwrap();

    let first = fetcher.fetch(None).await.unwrap();
    assert_eq!(first.items.len(), 3);
    assert_eq!(first.items[0].name, "Aruba");
    assert_eq!(first.next.as_deref(), Some("/countries?page=2"));

    let second = fetcher.fetch(first.next.as_deref()).await.unwrap();
    assert_eq!(second.items[0].name, "Denmark");
    assert_eq!(second.next, None);
}

#[tokio::test]
async fn non_success_status_is_fetch_error() {
    let origin = spawn_origin().await;
    let fetcher =
        HttpPageFetcher::new(SourceConfig::for_endpoint(format!("{}/unavailable", origin.base)))
            .unwrap();

    match fetcher.fetch(None).await {
        Err(FetchError::Status { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn non_json_body_is_decode_error() {
    let origin = spawn_origin().await;
    let fetcher =
        HttpPageFetcher::new(SourceConfig::for_endpoint(format!("{}/garbage", origin.base)))
            .unwrap();

    assert!(matches!(
        fetcher.fetch(None).await,
        Err(FetchError::Decode(_))
    ));
}

#[tokio::test]
async fn unreachable_origin_is_transport_error() {
    // Bind and drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher =
        HttpPageFetcher::new(SourceConfig::for_endpoint(format!("http://{}/countries", addr)))
            .unwrap();
    assert!(matches!(
        fetcher.fetch(None).await,
        Err(FetchError::Transport { .. })
    ));
}

#[tokio::test]
async fn download_reports_content_type_and_limits() {
    let origin = spawn_origin().await;
    let url = format!("{}/flags/aw.png", origin.base);

    let source = HttpArtifactSource::new(&ArtifactsConfig::default()).unwrap();
    let art = source.download(&url).await.unwrap();
    assert_eq!(&art.bytes[..], b"PNG:aw.png");
    assert_eq!(art.content_type.as_deref(), Some("image/png"));

    let tiny = HttpArtifactSource::new(&ArtifactsConfig {
        max_bytes: Some(4),
        ..ArtifactsConfig::default()
    })
    .unwrap();
    assert!(matches!(
        tiny.download(&url).await,
        Err(ArtifactFetchError::TooLarge { limit: 4, .. })
    ));

    let missing = format!("{}/flags/missing.png", origin.base);
    assert!(matches!(
        source.download(&missing).await,
        Err(ArtifactFetchError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn download_limit_applies_without_content_length() {
    let origin = spawn_origin().await;
    let url = format!("{}/stream", origin.base);

    let capped = HttpArtifactSource::new(&ArtifactsConfig {
        max_bytes: Some(1024),
        ..ArtifactsConfig::default()
    })
    .unwrap();
    match capped.download(&url).await {
        Err(ArtifactFetchError::TooLarge { size, limit, .. }) => {
            assert_eq!(limit, 1024);
            assert!(size > 1024, "read {} bytes", size);
        }
        other => panic!("expected size error, got {:?}", other),
    }

    let roomy = HttpArtifactSource::new(&ArtifactsConfig {
        max_bytes: Some(4096),
        ..ArtifactsConfig::default()
    })
    .unwrap();
    assert_eq!(roomy.download(&url).await.unwrap().len(), 4096);
}

#[tokio::test]
async fn session_scrolls_and_resolves_over_http() {
    let origin = spawn_origin().await;
    let cfg = parse_config(&format!(
        r#"
[source]
endpoint = "{}/countries"
items_field = "countries"
artifact_field = "countryInfo.flag"
"#,
        origin.base
    ))
    .unwrap();
    let session = Session::from_config_quiet(&cfg).unwrap();

    let summary = scroll_to_end(&session.collection, None).await.unwrap();
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.items, 5);
    assert!(summary.reached_end);

    let items = session.collection.items();
    let mut placeholders = 0;
    for (key, item) in items.iter().enumerate() {
        let art = session.resolver.resolve_now(item, key).await;
        if art.is_placeholder() {
            placeholders += 1;
        }
    }
    assert_eq!(placeholders, 1);
    assert_eq!(session.cache().len(), 4);
    assert_eq!(origin.flag_hits.load(Ordering::SeqCst), 5);

    // Second pass is served from the cache except for the failed one
    for (key, item) in items.iter().enumerate() {
        session.resolver.resolve_now(item, key).await;
    }
    assert_eq!(origin.flag_hits.load(Ordering::SeqCst), 6);
}
