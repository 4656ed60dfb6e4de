use std::sync::Arc;

use crate::config::Config;
use crate::extraction::FieldExtractor;
use crate::llm::LlmProvider;
use crate::ocr::OcrEngine;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Recognition engine handle, constructed once at startup and shared by
    /// reference across request handlers.
    pub ocr: OcrEngine,
    pub llm: LlmProvider,
    pub extractor: FieldExtractor,
}

impl AppState {
    pub fn new(config: Config, ocr: OcrEngine, llm: LlmProvider) -> Self {
        let extractor = FieldExtractor::new(llm.clone());

        Self {
            config: Arc::new(config),
            ocr,
            llm,
            extractor,
        }
    }
}
