//! Meishi — business-card OCR service.
//!
//! Pipeline per uploaded photo: decode → [`imaging::normalize`] → external
//! recognition engine ([`ocr::OcrEngine`]) → per-line rectification
//! ([`textfix`]) → optional contact field extraction
//! ([`extraction::FieldExtractor`]).

pub mod api;
pub mod config;
pub mod error;
pub mod extraction;
pub mod imaging;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod textfix;
