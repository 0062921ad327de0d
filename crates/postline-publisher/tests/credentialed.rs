//! Credentialed connector paths against a mock platform API.

use chrono::Utc;
use rust_decimal::Decimal;
use wiremock::matchers::{bearer_token, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use postline_core::Platform;
use postline_publisher::{Credentials, OutboundPost, Publisher, PublisherConfig, PublisherError};

fn publisher_against(server: &MockServer, credentials: Credentials) -> Publisher {
    Publisher::new(
        &PublisherConfig {
            api_base_override: Some(server.uri()),
            ..PublisherConfig::default()
        },
        credentials,
    )
    .expect("client")
}

#[tokio::test]
async fn instagram_metrics_use_the_real_api_when_a_token_is_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v19.0/brand.main/insights"))
        .and(bearer_token("ig-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "followers": 12_345,
            "growth_rate": "1.25",
            "engagement_rate": "4.80",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = publisher_against(
        &server,
        Credentials {
            instagram: Some("ig-token".to_string()),
            ..Credentials::default()
        },
    );

    let sample = publisher
        .fetch_metrics(&Platform::Instagram, "brand.main")
        .await
        .expect("metrics");

    assert_eq!(sample.follower_count, 12_345);
    assert_eq!(sample.growth_rate, Decimal::new(125, 2));
    assert_eq!(sample.engagement_rate, Decimal::new(480, 2));
}

#[tokio::test]
async fn malformed_metrics_payload_is_a_typed_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/2/users/by/username/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": "not the shape we map",
        })))
        .mount(&server)
        .await;

    let publisher = publisher_against(
        &server,
        Credentials {
            x: Some("x-token".to_string()),
            ..Credentials::default()
        },
    );

    let result = publisher.fetch_metrics(&Platform::X, "brand").await;
    assert!(matches!(
        result,
        Err(PublisherError::UnexpectedPayload { .. })
    ));
}

#[tokio::test]
async fn server_errors_propagate_as_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let publisher = publisher_against(
        &server,
        Credentials {
            pinterest: Some("pin-token".to_string()),
            ..Credentials::default()
        },
    );

    let result = publisher.fetch_metrics(&Platform::Pinterest, "brand").await;
    assert!(matches!(result, Err(PublisherError::Http(_))));
}

#[tokio::test]
async fn scheduling_against_x_returns_the_platform_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(bearer_token("x-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "1890000000" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let publisher = publisher_against(
        &server,
        Credentials {
            x: Some("x-token".to_string()),
            ..Credentials::default()
        },
    );

    let receipt = publisher
        .schedule_post(
            &Platform::X,
            "brand",
            &OutboundPost {
                content: "ship it".to_string(),
                hashtags: vec![],
                media_urls: vec![],
                scheduled_for: Utc::now(),
            },
        )
        .await
        .expect("receipt");

    assert_eq!(receipt.external_id, "1890000000");
}

#[tokio::test]
async fn uncredentialed_scheduling_synthesizes_an_identifier() {
    // No server, no tokens: the synthetic path must not attempt I/O.
    let publisher = Publisher::new(&PublisherConfig::default(), Credentials::default())
        .expect("client");

    let receipt = publisher
        .schedule_post(
            &Platform::YouTube,
            "brand",
            &OutboundPost {
                content: "premiere".to_string(),
                hashtags: vec![],
                media_urls: vec![],
                scheduled_for: Utc::now(),
            },
        )
        .await
        .expect("receipt");

    assert!(receipt.external_id.starts_with("youtube-"));
}
