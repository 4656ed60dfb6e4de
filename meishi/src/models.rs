//! Core data types shared across the recognition pipeline.

use serde::{Deserialize, Serialize};

/// One text line produced by the recognition engine.
///
/// Immutable once produced; the rectifier derives a corrected line from it
/// but never alters the confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RecognizedLine {
    pub text: String,
    /// Engine confidence in `[0, 1]`.
    pub confidence: f32,
}

impl RecognizedLine {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// One block of the scan response.
///
/// Blocks sourced from recognition carry a confidence; blocks sourced from
/// field extraction carry the list of schema fields the text was filed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TextBlock {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl TextBlock {
    pub fn recognized(line: &RecognizedLine) -> Self {
        Self {
            text: line.text.clone(),
            confidence: Some(line.confidence),
            labels: None,
        }
    }

    pub fn labeled(text: impl Into<String>, label: &str) -> Self {
        Self {
            text: text.into(),
            confidence: None,
            labels: Some(vec![label.to_string()]),
        }
    }
}

/// The fixed contact schema filled in by the field-extraction collaborator.
///
/// Every field defaults to empty; a response missing or mangling a field is
/// coerced rather than rejected, so this record never fails to materialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactRecord {
    pub name: String,
    pub company: String,
    pub department: String,
    pub title: String,
    pub postal_code: String,
    pub address: String,
    pub phones: Vec<String>,
    pub mobiles: Vec<String>,
    pub faxes: Vec<String>,
    pub emails: Vec<String>,
    pub urls: Vec<String>,
    pub other: Vec<String>,
}

impl ContactRecord {
    /// True when the collaborator produced nothing usable.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.company.is_empty()
            && self.department.is_empty()
            && self.title.is_empty()
            && self.postal_code.is_empty()
            && self.address.is_empty()
            && self.phones.is_empty()
            && self.mobiles.is_empty()
            && self.faxes.is_empty()
            && self.emails.is_empty()
            && self.urls.is_empty()
            && self.other.is_empty()
    }

    /// Flatten the record into labeled text blocks, scalar fields first.
    pub fn to_blocks(&self) -> Vec<TextBlock> {
        let mut blocks = Vec::new();

        let scalars = [
            ("name", &self.name),
            ("company", &self.company),
            ("department", &self.department),
            ("title", &self.title),
            ("postal_code", &self.postal_code),
            ("address", &self.address),
        ];
        for (label, value) in scalars {
            if !value.is_empty() {
                blocks.push(TextBlock::labeled(value.clone(), label));
            }
        }

        let lists = [
            ("phones", &self.phones),
            ("mobiles", &self.mobiles),
            ("faxes", &self.faxes),
            ("emails", &self.emails),
            ("urls", &self.urls),
            ("other", &self.other),
        ];
        for (label, values) in lists {
            for value in values {
                blocks.push(TextBlock::labeled(value.clone(), label));
            }
        }

        blocks
    }
}
