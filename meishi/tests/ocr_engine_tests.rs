mod common;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use meishi::config::OcrConfig;
use meishi::error::MeishiError;
use meishi::ocr::OcrEngine;

fn remote_config(base_url: String) -> OcrConfig {
    OcrConfig {
        model: "paddle".to_string(),
        base_url: Some(base_url),
        languages: "jpn+eng".to_string(),
        timeout_secs: 5,
        min_image_dimension: 50,
    }
}

#[tokio::test]
async fn remote_backend_parses_recognized_lines() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::recognition_body(&[
            ("株式会社サンプル", 0.97),
            ("090-1234-5678", 0.91),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let engine = OcrEngine::new(&remote_config(server.uri())).unwrap();
    let lines = engine.recognize(&common::card_png(200, 120)).await.unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].text, "株式会社サンプル");
    assert!((lines[0].confidence - 0.97).abs() < 1e-6);
    assert_eq!(lines[1].text, "090-1234-5678");
}

#[tokio::test]
async fn remote_backend_clamps_out_of_range_confidence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::recognition_body(&[("TEXT", 1.7), ("MORE", -0.3)])),
        )
        .mount(&server)
        .await;

    let engine = OcrEngine::new(&remote_config(server.uri())).unwrap();
    let lines = engine.recognize(&[1, 2, 3]).await.unwrap();

    assert_eq!(lines[0].confidence, 1.0);
    assert_eq!(lines[1].confidence, 0.0);
}

#[tokio::test]
async fn remote_backend_empty_block_list_is_ok() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::recognition_body(&[])))
        .mount(&server)
        .await;

    let engine = OcrEngine::new(&remote_config(server.uri())).unwrap();
    let lines = engine.recognize(&[0u8; 16]).await.unwrap();
    assert!(lines.is_empty());
}

#[tokio::test]
async fn remote_backend_maps_server_error_to_recognition_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let engine = OcrEngine::new(&remote_config(server.uri())).unwrap();
    let result = engine.recognize(&[0u8; 16]).await;

    match result {
        Err(MeishiError::Recognition(msg)) => assert!(msg.contains("500")),
        other => panic!("expected recognition error, got {other:?}"),
    }
}

#[tokio::test]
async fn remote_backend_maps_malformed_body_to_recognition_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let engine = OcrEngine::new(&remote_config(server.uri())).unwrap();
    let result = engine.recognize(&[0u8; 16]).await;
    assert!(matches!(result, Err(MeishiError::Recognition(_))));
}

#[tokio::test]
async fn unconfigured_remote_backend_is_unavailable() {
    let config = OcrConfig {
        base_url: None,
        ..remote_config(String::new())
    };

    let engine = OcrEngine::new(&config).unwrap();
    assert!(!engine.is_available());

    let result = engine.recognize(&[0u8; 16]).await;
    assert!(matches!(
        result,
        Err(MeishiError::RecognitionUnavailable(_))
    ));
}
