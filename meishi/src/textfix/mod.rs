//! Text rectification for recognized lines.
//!
//! The recognition engine returns lines as printed, misreads included. Each
//! line is classified as phone-like, URL-like, or plain, and the first two
//! get rewritten into canonical form. Rectification only corrects known
//! confusable characters and re-punctuates — it never invents information
//! that is not in the source text, and it never touches the confidence
//! score.

pub mod phone;
pub mod url;

pub use phone::{looks_like_phone, normalize_phone};
pub use url::normalize_url;

use crate::models::RecognizedLine;

fn has_url_marker(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("http") || lower.contains("www")
}

/// Rectify one line: phone first, then URL, else pass through unchanged.
pub fn rectify_line(line: &RecognizedLine) -> RecognizedLine {
    if looks_like_phone(&line.text) {
        RecognizedLine {
            text: normalize_phone(&line.text),
            confidence: line.confidence,
        }
    } else if has_url_marker(&line.text) {
        RecognizedLine {
            text: normalize_url(&line.text),
            confidence: line.confidence,
        }
    } else {
        line.clone()
    }
}

pub fn rectify_lines(lines: &[RecognizedLine]) -> Vec<RecognizedLine> {
    lines.iter().map(rectify_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_rectifies_synthetic_scan() {
        let lines = vec![
            RecognizedLine::new("090-l234-5678", 0.9),
            RecognizedLine::new("httpwwwexamp1e．com", 0.8),
            RecognizedLine::new("田中太郎", 0.95),
        ];

        let rectified = rectify_lines(&lines);

        assert_eq!(rectified[0].text, "090-1234-5678");
        assert_eq!(rectified[0].confidence, 0.9);
        assert!(rectified[1].text.starts_with("http://www."));
        assert_eq!(rectified[1].confidence, 0.8);
        assert_eq!(rectified[2].text, "田中太郎");
        assert_eq!(rectified[2].confidence, 0.95);
    }

    #[test]
    fn test_phone_classification_wins_over_url() {
        // A line that is phone-like never reaches the URL path, even though
        // the URL path would also accept it.
        let line = RecognizedLine::new("03-1234-5678", 0.9);
        assert_eq!(rectify_line(&line).text, "03-1234-5678");
    }

    #[test]
    fn test_url_line_with_scheme_is_repaired() {
        let line = RecognizedLine::new("httpsrnwww．example．co．ip", 0.7);
        let rectified = rectify_line(&line);
        assert_eq!(rectified.text, "https://www.example.co.jp");
        assert_eq!(rectified.confidence, 0.7);
    }

    #[test]
    fn test_plain_line_passes_through_verbatim() {
        let line = RecognizedLine::new("営業部 部長", 0.85);
        assert_eq!(rectify_line(&line), line);
    }
}
