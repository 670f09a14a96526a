// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Static fetcher behavior against a local mock server.

use evidence_contacts_ingest::{IngestConfig, IngestError, PageFetcher, StaticFetcher};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> StaticFetcher {
    StaticFetcher::new(&IngestConfig {
        static_timeout_ms: 5_000,
        ..IngestConfig::default()
    })
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

#[tokio::test]
async fn test_robots_disallow_blocks_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /team\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/team"))
        .respond_with(html("<h3>Jane Doe</h3>"))
        .expect(0)
        .mount(&server)
        .await;

    let url = format!("{}/team", server.uri());
    let result = fetcher().fetch(&url).await.unwrap();
    assert!(result.blocked_by_robots);
    assert_eq!(result.status_code, 0);
    assert!(result.html.is_none());
}

#[tokio::test]
async fn test_missing_robots_allows_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/team"))
        .respond_with(html("<h3>Jane Doe</h3>"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/team", server.uri());
    let result = fetcher().fetch(&url).await.unwrap();
    assert!(!result.blocked_by_robots);
    assert_eq!(result.status_code, 200);
    assert_eq!(result.mime.as_deref(), Some("text/html"));
    assert_eq!(result.html.as_deref(), Some("<h3>Jane Doe</h3>"));
    assert_eq!(result.content_length, 17);
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/team"))
        .respond_with(html("ok"))
        .mount(&server)
        .await;

    let f = StaticFetcher::new(&IngestConfig {
        respect_robots: false,
        ..IngestConfig::default()
    });
    let result = f.fetch(&format!("{}/team", server.uri())).await.unwrap();
    assert_eq!(result.html.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_non_html_has_no_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/brochure.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_string("%PDF-1.4"),
        )
        .mount(&server)
        .await;

    let result = fetcher()
        .fetch(&format!("{}/brochure.pdf", server.uri()))
        .await
        .unwrap();
    assert_eq!(result.mime.as_deref(), Some("application/pdf"));
    assert!(result.html.is_none());
    assert!(!result.is_html());
}

#[tokio::test]
async fn test_http_error_status_is_reported() {
    let server = MockServer::start().await;
    let result = fetcher()
        .fetch(&format!("{}/gone", server.uri()))
        .await
        .unwrap();
    assert_eq!(result.status_code, 404);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/team"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/team"))
        .respond_with(html("back"))
        .mount(&server)
        .await;

    let result = fetcher()
        .fetch(&format!("{}/team", server.uri()))
        .await
        .unwrap();
    assert_eq!(result.status_code, 200);
    assert_eq!(result.html.as_deref(), Some("back"));
}

#[tokio::test]
async fn test_retries_stay_inside_the_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "10"))
        .expect(1)
        .mount(&server)
        .await;

    let f = StaticFetcher::new(&IngestConfig {
        respect_robots: false,
        ..IngestConfig::default()
    });
    let started = Instant::now();
    let busy = f
        .fetch_with_timeout(&format!("{}/busy", server.uri()), 300)
        .await
        .unwrap();
    assert_eq!(busy.status_code, 503);
    assert!(started.elapsed() < Duration::from_millis(300), "{:?}", started.elapsed());

    let started = Instant::now();
    let limited = f
        .fetch_with_timeout(&format!("{}/limited", server.uri()), 2_000)
        .await
        .unwrap();
    assert_eq!(limited.status_code, 429);
    assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("late").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = fetcher()
        .fetch_with_timeout(&format!("{}/slow", server.uri()), 200)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Timeout(200)), "{err}");
}

#[tokio::test]
async fn test_invalid_url_is_rejected() {
    let err = fetcher().fetch("not a url").await.unwrap_err();
    assert!(matches!(err, IngestError::InvalidUrl(_)));
}
