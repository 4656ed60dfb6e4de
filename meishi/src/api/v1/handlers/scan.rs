//! v1 Scan handler.
//!
//! Accepts a card photo as a multipart upload, runs the normalization →
//! recognition → rectification pipeline, and optionally asks the extraction
//! collaborator to fill the contact schema. All responses are wrapped in
//! [`ApiResponse`] envelopes.

use axum::extract::{Multipart, State};
use image::GenericImageView;

use crate::api::v1::dto::ScanResponse;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::error::MeishiError;
use crate::imaging;
use crate::models::TextBlock;
use crate::textfix;

fn parse_form_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `POST /api/v1/scans`
///
/// Multipart form with a `file` field (the card photo) and an optional
/// `extract` boolean field. Returns the rectified text blocks and, when
/// extraction was requested, the extracted contact record.
#[utoipa::path(
    post,
    path = "/api/v1/scans",
    tag = "scans",
    operation_id = "scans.create",
    request_body(content_type = "multipart/form-data", content = String, description = "Card photo upload with optional extract flag"),
    responses(
        (status = 200, description = "Scan result", body = ScanResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 502, description = "Recognition failed", body = ApiError),
        (status = 503, description = "Recognition backend unavailable", body = ApiError),
    )
)]
pub async fn scan_card(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResponse<ScanResponse> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut extract_requested = false;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let bytes = match field.bytes().await {
                    Ok(b) => b,
                    Err(e) => {
                        return ApiResponse::error(
                            ErrorCode::InvalidRequest,
                            format!("Failed to read file: {e}"),
                        );
                    }
                };
                file_bytes = Some(bytes.to_vec());
            }
            "extract" => {
                let value = field.text().await.unwrap_or_default();
                match parse_form_bool(&value) {
                    Some(flag) => extract_requested = flag,
                    None => {
                        return ApiResponse::error(
                            ErrorCode::InvalidRequest,
                            format!("Invalid boolean value for extract: '{value}'"),
                        );
                    }
                }
            }
            _ => {}
        }
    }

    let Some(bytes) = file_bytes else {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Missing file field");
    };
    if bytes.is_empty() {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Uploaded file is empty");
    }

    // Reject undecodable input before any preprocessing.
    let decoded = match image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(e) => {
            let response: ApiResponse<ScanResponse> =
                MeishiError::Decode(format!("Failed to decode image: {e}")).into();
            return response;
        }
    };

    let (width, height) = decoded.dimensions();
    let min_dim = state.config.ocr.min_image_dimension;
    if width < min_dim || height < min_dim {
        return ApiResponse::error(
            ErrorCode::InvalidRequest,
            format!("Image too small: {width}x{height}, minimum {min_dim}x{min_dim}"),
        );
    }

    // Normalization is CPU-bound; keep it off the async workers.
    let preprocess = state.config.preprocess.clone();
    let encoded = tokio::task::spawn_blocking(move || {
        let normalized = imaging::normalize(&decoded.to_rgb8(), &preprocess);
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(normalized)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .map(|_| png)
    })
    .await;

    let normalized_png = match encoded {
        Ok(Ok(png)) => png,
        Ok(Err(e)) => {
            return ApiResponse::error(
                ErrorCode::InternalError,
                format!("Failed to encode normalized image: {e}"),
            );
        }
        Err(e) => {
            return ApiResponse::error(
                ErrorCode::InternalError,
                format!("Normalization task failed: {e}"),
            );
        }
    };

    let lines = match state.ocr.recognize(&normalized_png).await {
        Ok(lines) => lines,
        Err(e) => {
            tracing::error!(error = %e, "Recognition failed");
            let response: ApiResponse<ScanResponse> = e.into();
            return response;
        }
    };

    let rectified = textfix::rectify_lines(&lines);

    if !extract_requested {
        return ApiResponse::success(ScanResponse {
            blocks: rectified.iter().map(TextBlock::recognized).collect(),
            contact: None,
        });
    }

    // Extraction never fails; an empty record means the collaborator had
    // nothing usable and the recognition result stands on its own.
    let record = state.extractor.extract(&rectified).await;
    let blocks = if record.is_empty() {
        rectified.iter().map(TextBlock::recognized).collect()
    } else {
        record.to_blocks()
    };

    ApiResponse::success(ScanResponse {
        blocks,
        contact: Some(record),
    })
}
