use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::StudioClient;
use crate::error::BackendError;
use crate::retry::{Retrier, RetryPolicy};

fn fast_retrier() -> Retrier {
    Retrier::new(CancellationToken::new())
        .with_policy(RetryPolicy { max_attempts: 3, base_delay: Duration::from_millis(1) })
}

fn test_client(server: &MockServer) -> StudioClient {
    StudioClient::new("test-key".to_owned(), server.uri())
        .unwrap()
        .with_poll_interval(Duration::from_millis(1))
}

fn image_body() -> serde_json::Value {
    serde_json::json!({
        "images": [{ "data": "aGVsbG8=", "mime_type": "image/png" }]
    })
}

#[tokio::test]
async fn image_success_on_first_attempt() {
    let server = MockServer::start().await;
    let client = test_client(&server);

    Mock::given(method("POST"))
        .and(path("/v1/images:generate"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body()))
        .mount(&server)
        .await;

    let image = client.generate_image("a red fox at dusk").await.unwrap();
    assert_eq!(image.data, "aGVsbG8=");
    assert_eq!(image.mime_type, "image/png");
}

#[tokio::test]
async fn image_retry_on_503_then_success() {
    let server = MockServer::start().await;
    let client = test_client(&server);

    Mock::given(method("POST"))
        .and(path("/v1/images:generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/images:generate"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let image =
        fast_retrier().run(|| client.generate_image("a red fox at dusk")).await.unwrap();
    assert_eq!(image.mime_type, "image/png");
}

#[tokio::test]
async fn no_retry_on_401() {
    let server = MockServer::start().await;
    let client = test_client(&server);

    Mock::given(method("POST"))
        .and(path("/v1/images:generate"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let result = fast_retrier().run(|| client.generate_image("x")).await;
    let err = result.unwrap_err();
    assert!(matches!(err, BackendError::HttpStatus { code: 401, .. }));
}

#[tokio::test]
async fn all_retries_exhausted_surfaces_last_error() {
    let server = MockServer::start().await;
    let client = test_client(&server);

    Mock::given(method("POST"))
        .and(path("/v1/images:generate"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let result = fast_retrier().run(|| client.generate_image("x")).await;
    let err = result.unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, BackendError::RetriesExhausted(_)));
    assert!(message.contains("503"));
    assert!(message.contains("Service Unavailable"));
}

#[tokio::test]
async fn video_job_polled_to_completion() {
    let server = MockServer::start().await;
    let client = test_client(&server);

    Mock::given(method("POST"))
        .and(path("/v1/videos:generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "operations/op-7",
            "done": false
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/operations/op-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "operations/op-7",
            "done": true,
            "result": { "uri": "https://cdn.example/clip-7.mp4", "duration_secs": 6.5 }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/operations/op-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "operations/op-7",
            "done": false
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    let image = storyforge_core::GeneratedImage {
        id: "img-1".into(),
        data: "aGVsbG8=".into(),
        mime_type: "image/png".into(),
    };
    let cancel = CancellationToken::new();
    let operation = client.start_video("slow pan", &image).await.unwrap();
    let asset = client.wait_for_video(&operation, &cancel).await.unwrap();
    assert_eq!(asset.uri, "https://cdn.example/clip-7.mp4");
    assert!((asset.duration_secs - 6.5).abs() < f32::EPSILON);
}

#[tokio::test]
async fn failed_video_job_is_fatal() {
    let server = MockServer::start().await;
    let client = test_client(&server);

    Mock::given(method("GET"))
        .and(path("/v1/operations/op-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "operations/op-9",
            "done": true,
            "error": { "message": "safety filter rejected the prompt" }
        })))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let err = client.wait_for_video("operations/op-9", &cancel).await.unwrap_err();
    assert!(matches!(err, BackendError::JobFailed(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn cancelled_token_stops_polling_immediately() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    // No mock mounted: a poll would 404. Cancellation must win first.
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = client.wait_for_video("operations/op-1", &cancel).await.unwrap_err();
    assert!(matches!(err, BackendError::Cancelled));
}

#[tokio::test]
async fn narration_without_audio_is_empty_response() {
    let server = MockServer::start().await;
    let client = test_client(&server);

    Mock::given(method("POST"))
        .and(path("/v1/audio:synthesize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "audio": null
        })))
        .mount(&server)
        .await;

    let err = client.synthesize_narration("once upon a time").await.unwrap_err();
    assert!(matches!(err, BackendError::EmptyResponse("audio")));
}
