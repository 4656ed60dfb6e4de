use serde_json::Value;

use crate::llm::{CompletionOptions, LlmProvider};
use crate::models::{ContactRecord, RecognizedLine};

use super::prompts;

#[derive(Debug, Clone)]
pub struct FieldExtractor {
    llm: LlmProvider,
}

impl FieldExtractor {
    pub fn new(llm: LlmProvider) -> Self {
        Self { llm }
    }

    pub fn is_available(&self) -> bool {
        self.llm.is_available()
    }

    /// Extract contact fields from the rectified line list.
    ///
    /// Never fails: an unavailable or failing collaborator yields the
    /// all-empty default record, logged at warn level.
    pub async fn extract(&self, lines: &[RecognizedLine]) -> ContactRecord {
        if lines.is_empty() {
            return ContactRecord::default();
        }
        if !self.llm.is_available() {
            tracing::warn!("LLM unavailable, skipping field extraction");
            return ContactRecord::default();
        }

        let prompt = prompts::contact_extraction_prompt(lines);
        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: None,
        };

        match self.llm.complete_json(&prompt, Some(&options)).await {
            Ok(value) => coerce_record(&value),
            Err(error) => {
                tracing::warn!(error = %error, "Field extraction failed, returning empty record");
                ContactRecord::default()
            }
        }
    }
}

/// Coerce a collaborator response into the contact schema.
///
/// Field-by-field: a key that is absent, or present with the wrong shape, is
/// replaced by its empty default. A schema violation never propagates past
/// this point.
fn coerce_record(value: &Value) -> ContactRecord {
    ContactRecord {
        name: string_field(value, "name"),
        company: string_field(value, "company"),
        department: string_field(value, "department"),
        title: string_field(value, "title"),
        postal_code: string_field(value, "postalCode"),
        address: string_field(value, "address"),
        phones: list_field(value, "phones"),
        mobiles: list_field(value, "mobiles"),
        faxes: list_field(value, "faxes"),
        emails: list_field(value, "emails"),
        urls: list_field(value, "urls"),
        other: list_field(value, "other"),
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

fn list_field(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
