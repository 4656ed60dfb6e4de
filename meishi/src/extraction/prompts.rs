//! Prompt templates for contact field extraction
//!
//! Templates use basic `format!()` interpolation for type safety.

use crate::models::RecognizedLine;

/// Generate a prompt for extracting contact fields from recognized lines.
///
/// The lines are rendered one per row with their confidence so the model can
/// discount low-confidence reads. The response is constrained to a single
/// JSON object matching the contact schema.
pub fn contact_extraction_prompt(lines: &[RecognizedLine]) -> String {
    let rendered = lines
        .iter()
        .map(|line| format!("[{:.2}] {}", line.confidence, line.text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"The following lines were read from one business card by OCR, in reading
order, each prefixed with the recognition confidence. Extract the contact
fields into a single JSON object with exactly these keys:

- "name", "company", "department", "title", "postalCode", "address": strings
  (empty string when not present on the card)
- "phones", "mobiles", "faxes", "emails", "urls", "other": arrays of strings
  (empty array when not present)

File mobile numbers (070/080/090 prefixes) under "mobiles", fax numbers under
"faxes", and anything that fits no field under "other". Do not invent values
that are not on the card.

Lines:
{rendered}

Respond with the JSON object only."#
    )
}
