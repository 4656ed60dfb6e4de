//! Recognition engine boundary.
//!
//! The engine itself is an external black box consumed through a narrow
//! interface: one normalized image in, an ordered list of text lines with
//! confidence scores out. Two backends are supported:
//! - `paddle` — a remote recognition server (multipart image upload, JSON
//!   line list), reached over HTTP via `OCR_BASE_URL`
//! - `local/tesseract` — an in-process engine via leptess
//!
//! Construction is expensive, so the engine is built once at startup and the
//! handle is shared by reference through the application state. A backend
//! that cannot be constructed degrades to `Unavailable` instead of failing
//! startup; recognition calls then return a service-unavailable error.

mod api;
mod engine;

pub use api::RecognitionClient;
pub use engine::OcrEngine;
