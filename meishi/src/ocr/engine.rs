use std::sync::Arc;
use std::time::Duration;

use leptess::LepTess;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::OcrConfig;
use crate::error::{MeishiError, Result};
use crate::models::RecognizedLine;

use super::api::RecognitionClient;

enum OcrBackend {
    Http { client: RecognitionClient },
    Local { tesseract: Arc<Mutex<LepTess>> },
    Unavailable { reason: String },
}

pub struct OcrEngine {
    backend: OcrBackend,
    config: OcrConfig,
}

fn create_tesseract(languages: &str) -> std::result::Result<LepTess, String> {
    LepTess::new(None, languages).map_err(|e| e.to_string())
}

impl OcrEngine {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let model_lower = config.model.to_lowercase();
        let provider_prefix = model_lower.split('/').next().unwrap_or("local");

        let backend = match provider_prefix {
            "paddle" | "http" => match RecognitionClient::new(config) {
                Ok(client) => {
                    info!(base_url = ?config.base_url, "Remote recognition backend initialized");
                    OcrBackend::Http { client }
                }
                Err(e) => {
                    let reason = format!("Remote recognition backend unavailable: {e}");
                    warn!("{}", reason);
                    OcrBackend::Unavailable { reason }
                }
            },
            _ => match create_tesseract(&config.languages) {
                Ok(lt) => {
                    info!(languages = %config.languages, "Tesseract recognition initialized");
                    OcrBackend::Local {
                        tesseract: Arc::new(Mutex::new(lt)),
                    }
                }
                Err(e) => {
                    let reason = format!("Tesseract not available: {e}");
                    warn!("{}", reason);
                    OcrBackend::Unavailable { reason }
                }
            },
        };

        Ok(Self {
            backend,
            config: config.clone(),
        })
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, OcrBackend::Unavailable { .. })
    }

    /// Recognize text lines in an already-normalized image.
    ///
    /// A single engine failure surfaces immediately as a recognition error;
    /// there is no retry.
    pub async fn recognize(&self, image_bytes: &[u8]) -> Result<Vec<RecognizedLine>> {
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);

        let result =
            tokio::time::timeout(timeout_duration, self.recognize_internal(image_bytes)).await;

        match result {
            Ok(inner_result) => inner_result,
            Err(_) => Err(MeishiError::Recognition(format!(
                "Recognition timed out after {} seconds",
                self.config.timeout_secs
            ))),
        }
    }

    async fn recognize_internal(&self, image_bytes: &[u8]) -> Result<Vec<RecognizedLine>> {
        match &self.backend {
            OcrBackend::Http { client } => client.recognize(image_bytes).await,
            OcrBackend::Local { tesseract } => {
                let bytes = image_bytes.to_vec();
                let tesseract = Arc::clone(tesseract);

                let (text, mean_confidence) = tokio::task::spawn_blocking(move || {
                    let mut lt = tesseract.blocking_lock();
                    lt.set_image_from_mem(&bytes)
                        .map_err(|e| MeishiError::Recognition(format!("Failed to set image: {e}")))?;
                    let text = lt.get_utf8_text().map_err(|e| {
                        MeishiError::Recognition(format!("Failed to extract text: {e}"))
                    })?;
                    let confidence = lt.mean_text_conf();
                    Ok::<_, MeishiError>((text, confidence))
                })
                .await
                .map_err(|e| MeishiError::Recognition(format!("Recognition task panicked: {e}")))??;

                // The in-process engine reports one mean confidence for the
                // whole page; each line carries it scaled into [0, 1].
                let confidence = (mean_confidence as f32 / 100.0).clamp(0.0, 1.0);
                Ok(text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| RecognizedLine::new(line, confidence))
                    .collect())
            }
            OcrBackend::Unavailable { reason } => {
                Err(MeishiError::RecognitionUnavailable(reason.clone()))
            }
        }
    }
}

impl Clone for OcrEngine {
    fn clone(&self) -> Self {
        match &self.backend {
            OcrBackend::Http { client } => Self {
                backend: OcrBackend::Http {
                    client: client.clone(),
                },
                config: self.config.clone(),
            },
            OcrBackend::Local { tesseract } => Self {
                backend: OcrBackend::Local {
                    tesseract: Arc::clone(tesseract),
                },
                config: self.config.clone(),
            },
            OcrBackend::Unavailable { reason } => Self {
                backend: OcrBackend::Unavailable {
                    reason: reason.clone(),
                },
                config: self.config.clone(),
            },
        }
    }
}
