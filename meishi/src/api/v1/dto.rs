//! v1 request/response DTOs.

use serde::{Deserialize, Serialize};

use crate::models::{ContactRecord, TextBlock};

/// Response of `POST /api/v1/scans`.
///
/// `blocks` carries the recognized lines after rectification — or, when
/// field extraction was requested and produced anything, the labeled values
/// from the extracted record. `contact` is present only when extraction was
/// requested.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub blocks: Vec<TextBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactRecord>,
}
