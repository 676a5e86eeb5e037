//! Integration tests for the HTTP surface.
//!
//! Drive the router with `oneshot` against temporary asset and download
//! directories and a scripted fetcher.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tokio::time::timeout;
use tower::ServiceExt;

use tubefetch_axum::{AppContext, ServerConfig, bootstrap, create_router};
use tubefetch_core::{
    BusMessage, FetchError, FetchRequest, FetchStatus, JobId, MediaFetcher, ProgressEvent,
    ProgressStatus, StatusCallback, Subscription,
};

/// Fetcher that reports a few progress steps and finishes.
struct ScriptedFetcher {
    fail_with: Option<String>,
}

#[async_trait]
impl MediaFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        _request: &FetchRequest,
        on_status: &StatusCallback<'_>,
    ) -> Result<(), FetchError> {
        for downloaded in [0, 50, 100] {
            on_status(FetchStatus::Downloading {
                downloaded,
                total: Some(100),
            });
            tokio::task::yield_now().await;
        }
        match &self.fail_with {
            Some(reason) => Err(FetchError::Failed(reason.clone())),
            None => {
                on_status(FetchStatus::Finished);
                Ok(())
            }
        }
    }
}

struct Fixture {
    _root: TempDir,
    config: ServerConfig,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let templates = root.path().join("templates");
        let statics = root.path().join("static");
        let downloads = root.path().join("downloads");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::create_dir_all(statics.join("img")).unwrap();
        std::fs::write(
            templates.join("index.html"),
            "<html><body><form id=\"download-form\"></form></body></html>",
        )
        .unwrap();
        std::fs::write(statics.join("style.css"), "body { margin: 0; }").unwrap();
        std::fs::write(statics.join("app.js"), "console.log('hi');").unwrap();
        std::fs::write(statics.join("img").join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        std::fs::write(statics.join("data.bin"), [0_u8, 1, 2]).unwrap();
        std::fs::write(root.path().join("secret.txt"), "secret").unwrap();

        let config = ServerConfig::with_defaults()
            .with_templates_dir(templates)
            .with_static_dir(statics)
            .with_download_dir(downloads);
        Self {
            _root: root,
            config,
        }
    }

    fn with_keepalive(mut self, keepalive: Duration) -> Self {
        self.config = self.config.with_keepalive(keepalive);
        self
    }

    async fn context(&self, fetcher: ScriptedFetcher) -> AppContext {
        bootstrap(&self.config, Arc::new(fetcher)).await.unwrap()
    }
}

fn succeeding() -> ScriptedFetcher {
    ScriptedFetcher { fail_with: None }
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn content_type(response: &Response) -> &str {
    response.headers()[header::CONTENT_TYPE].to_str().unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/download")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_multipart(field: &str, value: &str) -> Request<Body> {
    let boundary = "tubefetch-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n--{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/download")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Collect one job's events through its terminal event.
async fn collect_until_terminal(subscription: &mut Subscription) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    loop {
        match timeout(Duration::from_secs(5), subscription.next()).await.unwrap() {
            Some(BusMessage::Event(event)) => {
                let terminal = event.is_terminal();
                events.push(event);
                if terminal {
                    return events;
                }
            }
            Some(BusMessage::KeepAlive) => {}
            None => panic!("bus closed"),
        }
    }
}

/// Next SSE frame of a streaming response body, as text.
async fn next_frame(body: &mut Body) -> Option<String> {
    let frame = timeout(Duration::from_secs(5), body.frame())
        .await
        .expect("timed out waiting for SSE frame")?
        .unwrap();
    let data = frame.into_data().unwrap();
    Some(String::from_utf8(data.to_vec()).unwrap())
}

// ---------------------------------------------------------------------------
// Pages and static assets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn index_serves_template() {
    let fixture = Fixture::new();
    let app = create_router(fixture.context(succeeding()).await);

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "text/html; charset=utf-8");
    assert!(body_text(response).await.contains("download-form"));
}

#[tokio::test]
async fn missing_index_is_server_error() {
    let fixture = Fixture::new();
    let mut ctx = fixture.context(succeeding()).await;
    ctx.templates_dir = ctx.templates_dir.join("missing");
    let app = create_router(ctx);

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.starts_with("Error loading HTML file: "));
}

#[tokio::test]
async fn static_assets_use_extension_content_types() {
    let fixture = Fixture::new();
    let app = create_router(fixture.context(succeeding()).await);
    let cases = [
        ("/static/style.css", "text/css"),
        ("/static/app.js", "application/javascript"),
        ("/static/img/logo.png", "image/png"),
        ("/static/data.bin", "application/octet-stream"),
    ];

    for (uri, expected) in cases {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(content_type(&response), expected, "{uri}");
    }
}

#[tokio::test]
async fn static_asset_body_is_file_content() {
    let fixture = Fixture::new();
    let app = create_router(fixture.context(succeeding()).await);

    let response = app.oneshot(get("/static/style.css")).await.unwrap();
    assert_eq!(body_text(response).await, "body { margin: 0; }");
}

#[tokio::test]
async fn missing_static_file_is_not_found() {
    let fixture = Fixture::new();
    let app = create_router(fixture.context(succeeding()).await);

    let response = app.oneshot(get("/static/nope.css")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "File not found");
}

#[tokio::test]
async fn static_path_cannot_escape_root() {
    let fixture = Fixture::new();
    let app = create_router(fixture.context(succeeding()).await);

    let response = app.oneshot(get("/static/../secret.txt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_ne!(body_text(response).await, "secret");
}

#[tokio::test]
async fn static_directory_and_wrong_method_are_not_found() {
    let fixture = Fixture::new();
    let app = create_router(fixture.context(succeeding()).await);

    let response = app.clone().oneshot(get("/static/img/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method("POST")
        .uri("/static/style.css")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "File not found");
}

#[tokio::test]
async fn unknown_route_is_page_not_found() {
    let fixture = Fixture::new();
    let app = create_router(fixture.context(succeeding()).await);

    let response = app.oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&response), "text/html; charset=utf-8");
    assert_eq!(body_text(response).await, "Page not found");
}

#[tokio::test]
async fn wrong_method_is_page_not_found() {
    let fixture = Fixture::new();
    let app = create_router(fixture.context(succeeding()).await);

    let response = app.oneshot(get("/download")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Page not found");
}

#[tokio::test]
async fn health_reports_ok() {
    let fixture = Fixture::new();
    let app = create_router(fixture.context(succeeding()).await);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_submissions_are_rejected_without_bus_activity() {
    let fixture = Fixture::new().with_keepalive(Duration::from_millis(50));
    let ctx = fixture.context(succeeding()).await;
    let mut subscription = ctx.bus.subscribe();
    let app = create_router(ctx);

    let requests = [
        post_form("other=value"),
        post_form("downloadlink="),
        post_form("downloadlink=%20%20"),
        post_form("downloadlink=not+a+url"),
        post_form("downloadlink=ftp%3A%2F%2Fexample.com%2Fv"),
        post_multipart("other", "https://example.com/video"),
        Request::builder()
            .method("POST")
            .uri("/download")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"downloadlink":"https://example.com/video"}"#))
            .unwrap(),
    ];

    for request in requests {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Invalid video URL");
    }

    assert_eq!(subscription.next().await, Some(BusMessage::KeepAlive));
}

#[tokio::test]
async fn urlencoded_submission_runs_job_to_completion() {
    let fixture = Fixture::new();
    let ctx = fixture.context(succeeding()).await;
    let mut subscription = ctx.bus.subscribe();
    let app = create_router(ctx);

    let response = app
        .oneshot(post_form("downloadlink=https%3A%2F%2Fexample.com%2Fvideo"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "text/html; charset=utf-8");
    assert_eq!(
        body_text(response).await,
        "Download started. Check the server console for details."
    );

    let events = collect_until_terminal(&mut subscription).await;
    let (last, progress) = events.split_last().unwrap();
    assert_eq!(last.status, ProgressStatus::Completed);
    assert!(!last.message.as_deref().unwrap_or_default().is_empty());

    let percents: Vec<f64> = progress.iter().filter_map(|e| e.progress).collect();
    assert_eq!(percents, vec![0.0, 50.0, 100.0]);
}

#[tokio::test]
async fn multipart_submission_is_accepted() {
    let fixture = Fixture::new();
    let ctx = fixture.context(succeeding()).await;
    let mut subscription = ctx.bus.subscribe();
    let app = create_router(ctx);

    let response = app
        .oneshot(post_multipart("downloadlink", "https://example.com/video"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = collect_until_terminal(&mut subscription).await;
    assert_eq!(events.last().unwrap().status, ProgressStatus::Completed);
}

#[tokio::test]
async fn failing_fetch_reports_one_error_and_server_keeps_accepting() {
    let fixture = Fixture::new();
    let failing = ScriptedFetcher {
        fail_with: Some("ERROR: connection reset".to_string()),
    };
    let ctx = fixture.context(failing).await;
    let mut subscription = ctx.bus.subscribe();
    let app = create_router(ctx);

    let response = app
        .clone()
        .oneshot(post_form("downloadlink=https%3A%2F%2Fexample.com%2Fa"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = collect_until_terminal(&mut subscription).await;
    let errors: Vec<_> = events
        .iter()
        .filter(|e| e.status == ProgressStatus::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message.as_deref(), Some("ERROR: connection reset"));

    let response = app
        .oneshot(post_form("downloadlink=https%3A%2F%2Fexample.com%2Fb"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Progress stream
// ---------------------------------------------------------------------------

#[tokio::test]
async fn progress_streams_events_as_sse_frames() {
    let fixture = Fixture::new();
    let ctx = fixture.context(succeeding()).await;
    let bus = ctx.bus.clone();
    let app = create_router(ctx);

    let response = app.oneshot(get("/progress")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(content_type(&response).starts_with("text/event-stream"));
    assert_eq!(bus.subscriber_count(), 1);

    let job = JobId::new();
    bus.publish(ProgressEvent::downloading(job, 42.5));
    bus.publish(ProgressEvent::indeterminate(job));
    bus.publish(ProgressEvent::completed(job, "Download complete. Saved to /tmp"));

    let mut body = response.into_body();
    assert_eq!(
        next_frame(&mut body).await.unwrap(),
        "data: {\"status\":\"downloading\",\"progress\":42.5}\n\n"
    );
    assert_eq!(
        next_frame(&mut body).await.unwrap(),
        "data: {\"status\":\"downloading\"}\n\n"
    );

    let frame = next_frame(&mut body).await.unwrap();
    let json = frame
        .strip_prefix("data: ")
        .and_then(|rest| rest.strip_suffix("\n\n"))
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(json).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "status": "completed",
            "message": "Download complete. Saved to /tmp",
        })
    );
}

#[tokio::test]
async fn idle_progress_stream_sends_keep_alive() {
    let fixture = Fixture::new().with_keepalive(Duration::from_millis(50));
    let ctx = fixture.context(succeeding()).await;
    // The router is consumed by `oneshot`; hold a sender so the bus stays open.
    let bus = ctx.bus.clone();
    let app = create_router(ctx);

    let response = app.oneshot(get("/progress")).await.unwrap();
    let mut body = response.into_body();

    assert_eq!(next_frame(&mut body).await.unwrap(), "data: {}\n\n");
    assert_eq!(next_frame(&mut body).await.unwrap(), "data: {}\n\n");
    assert_eq!(bus.subscriber_count(), 1);
}

#[tokio::test]
async fn bus_shutdown_ends_progress_stream() {
    let fixture = Fixture::new();
    let ctx = fixture.context(succeeding()).await;
    let bus = ctx.bus.clone();
    let app = create_router(ctx);

    let response = app.oneshot(get("/progress")).await.unwrap();
    let mut body = response.into_body();

    bus.shutdown();
    assert_eq!(next_frame(&mut body).await, None);
}

#[tokio::test]
async fn closing_progress_stream_unsubscribes() {
    let fixture = Fixture::new();
    let ctx = fixture.context(succeeding()).await;
    let bus = ctx.bus.clone();
    let app = create_router(ctx);

    let response = app.oneshot(get("/progress")).await.unwrap();
    assert_eq!(bus.subscriber_count(), 1);

    drop(response);
    assert_eq!(bus.subscriber_count(), 0);
}
