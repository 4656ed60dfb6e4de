mod routes;
mod state;
pub mod v1;

pub use routes::create_router;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::api::routes::create_router;
    use crate::api::state::AppState;
    use crate::config::{Config, OcrConfig, PreprocessConfig, ServerConfig};
    use crate::llm::LlmProvider;
    use crate::ocr::OcrEngine;

    fn test_state(api_keys: Vec<String>) -> AppState {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                api_keys,
                max_upload_bytes: 25 * 1024 * 1024,
            },
            ocr: OcrConfig {
                model: "paddle".to_string(),
                base_url: Some("http://localhost:8868".to_string()),
                languages: "jpn+eng".to_string(),
                timeout_secs: 60,
                min_image_dimension: 50,
            },
            preprocess: PreprocessConfig::default(),
            llm: None,
        };

        let ocr = OcrEngine::new(&config.ocr).unwrap();
        let llm = LlmProvider::new(config.llm.as_ref());

        AppState::new(config, ocr, llm)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn protected_route_requires_auth() {
        let app = create_router(test_state(vec!["test-key".to_string()]));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/scans")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "unauthorized");
    }

    #[tokio::test]
    async fn invalid_api_key_is_rejected() {
        let app = create_router(test_state(vec!["test-key".to_string()]));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/scans")
                    .header("Authorization", "Bearer wrong-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "Invalid API key");
    }

    #[tokio::test]
    async fn auth_locked_down_when_no_keys_configured() {
        let app = create_router(test_state(vec![]));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/scans")
                    .header("Authorization", "Bearer any-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = create_router(test_state(vec!["secret".to_string()]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["ocr"]["status"], "available");
        assert_eq!(json["data"]["llm"]["status"], "unavailable");
    }

    #[tokio::test]
    async fn openapi_json_is_public() {
        let app = create_router(test_state(vec!["secret".to_string()]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["paths"]["/api/v1/scans"].is_object());
    }
}
