use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::config::OcrConfig;
use crate::error::{MeishiError, Result};
use crate::models::RecognizedLine;

/// HTTP client for a remote recognition server.
///
/// The server accepts a multipart image upload on `POST /ocr` and responds
/// with `{"blocks": [{"text": "...", "confidence": 0.97}, ...]}` in reading
/// order.
#[derive(Clone, Debug)]
pub struct RecognitionClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    blocks: Vec<RecognizedBlock>,
}

#[derive(Debug, Deserialize)]
struct RecognizedBlock {
    text: String,
    confidence: f32,
}

impl RecognitionClient {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| {
                MeishiError::Recognition("OCR_BASE_URL required for the remote backend".to_string())
            })?
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MeishiError::Recognition(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    pub async fn recognize(&self, image_bytes: &[u8]) -> Result<Vec<RecognizedLine>> {
        let part = Part::bytes(image_bytes.to_vec())
            .file_name("card.png")
            .mime_str("image/png")
            .map_err(|e| MeishiError::Recognition(format!("Failed to build upload: {e}")))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/ocr", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MeishiError::Recognition(format!("Recognition request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(MeishiError::Recognition(format!(
                "Recognition server returned {}",
                response.status()
            )));
        }

        let body: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| MeishiError::Recognition(format!("Failed to parse response: {e}")))?;

        Ok(body
            .blocks
            .into_iter()
            .map(|block| RecognizedLine {
                text: block.text,
                confidence: block.confidence.clamp(0.0, 1.0),
            })
            .collect())
    }
}
