//! Phone-number detection and canonicalization.
//!
//! Printed cards use narrow fonts that the recognition engine reliably
//! confuses in both directions: letter-O for zero, lowercase l for one, and
//! so on. Detection substitutes the known confusables, derives digit-only
//! candidates, and gates on length and residual noise before committing to a
//! rewrite. Canonicalization re-groups the digits with the separators
//! Japanese numbers are printed with.

use once_cell::sync::Lazy;
use regex::Regex;

/// ASCII hyphen plus the dash variants the engine emits for printed hyphens.
const HYPHEN_LIKE: [char; 4] = ['-', '\u{2010}', '\u{2212}', '\u{FF0D}'];

static KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(tel|fax|phone|mobile)\b").expect("valid keyword regex"));

/// Three hyphen-separated digit groups, e.g. `03-1234-5678`.
static GROUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{2,4}[-\u{2010}\u{2212}\u{FF0D}]\d{2,4}[-\u{2010}\u{2212}\u{FF0D}]\d{3,4}")
        .expect("valid group regex")
});

/// Fold full-width digits and the full-width plus sign to ASCII.
fn fold_width(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            '＋' => '+',
            other => other,
        })
        .collect()
}

/// Substitute visually confusable letters with the digits they stand for.
fn substitute_confusables(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'O' | 'o' | 'D' | 'C' => '0',
            'I' | 'l' | '|' | '!' => '1',
            'Z' => '2',
            'A' => '4',
            'S' => '5',
            'B' => '8',
            'g' | 'q' => '9',
            other => other,
        })
        .collect()
}

fn extract_digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Derive digit-only candidates from a width-folded line, in preference
/// order: direct substitution, substitution with exclamation marks stripped
/// first, then repairs for a hallucinated leading digit ("40…" / "43…").
/// Deduplicated by exact string, derivation order preserved.
fn digit_candidates(folded: &str) -> Vec<String> {
    let mut candidates = Vec::with_capacity(4);
    let mut push = |candidate: String| {
        if !candidate.is_empty() && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    push(extract_digits(&substitute_confusables(folded)));

    // Exclamation marks often appear as noise next to hyphens; stripping them
    // before substitution keeps them from turning into spurious ones.
    let without_bangs: String = folded.chars().filter(|&c| c != '!').collect();
    let stripped = extract_digits(&substitute_confusables(&without_bangs));
    push(stripped.clone());

    if stripped.len() == 11 && stripped.starts_with("40") {
        let repaired = stripped[1..].to_string();
        if repaired.starts_with('0') && repaired.len() == 10 {
            push(repaired);
        }
    }
    if stripped.len() == 12 && stripped.starts_with("43") {
        let repaired = stripped[2..].to_string();
        if repaired.starts_with('0') && repaired.len() == 10 {
            push(repaired);
        }
    }

    candidates
}

/// Candidate priority: a Navi Dial shape wins, then the first candidate
/// shaped like a domestic number (leading zero, 10 or 11 digits), then the
/// longest. Ties keep derivation order. This is an empirically tuned
/// tie-break; keep it as-is.
fn best_candidate(candidates: &[String]) -> Option<&String> {
    if let Some(navi) = candidates
        .iter()
        .find(|c| c.starts_with("0570") && c.len() == 10)
    {
        return Some(navi);
    }
    if let Some(domestic) = candidates
        .iter()
        .find(|c| c.starts_with('0') && (c.len() == 10 || c.len() == 11))
    {
        return Some(domestic);
    }
    candidates
        .iter()
        .fold(None, |best: Option<&String>, candidate| match best {
            Some(current) if candidate.len() <= current.len() => Some(current),
            _ => Some(candidate),
        })
}

/// Whether a recognized line reads as a phone number.
pub fn looks_like_phone(text: &str) -> bool {
    let folded = fold_width(text);
    let lower = folded.to_lowercase();

    // Different field entirely: URLs and mail addresses.
    if lower.contains("http") || lower.contains("://") || lower.contains("www") || folded.contains('@')
    {
        return false;
    }

    let candidates = digit_candidates(&folded);
    let long_enough = candidates
        .iter()
        .any(|c| (c.starts_with("0570") && c.len() >= 6) || c.len() >= 9);
    if !long_enough {
        return false;
    }

    // Field keywords are not noise; discount them before counting leftovers.
    let without_keywords = KEYWORD_RE.replace_all(&folded, "");
    let substituted = substitute_confusables(&without_keywords);
    let residue = substituted
        .chars()
        .filter(|&c| {
            !(c.is_ascii_digit()
                || c.is_whitespace()
                || matches!(c, '(' | ')' | '+' | '.' | '/')
                || HYPHEN_LIKE.contains(&c))
        })
        .count();
    if residue >= 3 {
        return false;
    }

    if KEYWORD_RE.is_match(&folded) {
        return true;
    }
    if GROUP_RE.is_match(&substitute_confusables(&folded)) {
        return true;
    }

    let best = best_candidate(&candidates).map(String::as_str).unwrap_or("");
    if best.starts_with('0') && (best.len() == 10 || best.len() == 11) {
        return true;
    }
    folded.trim_start().starts_with('+') && best.len() >= 10
}

/// Rewrite a phone-like line into its canonical grouped form.
///
/// Returns the trimmed original when the digits are too few to rewrite with
/// confidence (under 9, unless a partial Navi Dial number).
pub fn normalize_phone(text: &str) -> String {
    let folded = fold_width(text);
    let candidates = digit_candidates(&folded);
    let Some(best) = best_candidate(&candidates) else {
        return text.trim().to_string();
    };

    let navi_partial = best.starts_with("0570") && best.len() >= 6;
    if best.len() < 9 && !navi_partial {
        return text.trim().to_string();
    }

    if folded.trim_start().starts_with('+') {
        return format!("+{best}");
    }

    group_digits(best)
}

/// Fixed-width grouping keyed on prefix and length, hyphen-joined.
fn group_digits(digits: &str) -> String {
    let groups: &[usize] = match (digits, digits.len()) {
        (d, 10) if d.starts_with("0570") => &[4, 2, 4],
        (d, 10) if d.starts_with("0743") => &[4, 2, 4],
        (d, 10) if d.starts_with("03") || d.starts_with("06") => &[2, 4, 4],
        (d, 11) if ["070", "080", "090"].iter().any(|p| d.starts_with(p)) => &[3, 4, 4],
        (_, 10) => &[3, 3, 4],
        (_, 11) => &[3, 4, 4],
        _ => return digits.to_string(),
    };

    let mut parts = Vec::with_capacity(groups.len());
    let mut offset = 0;
    for &len in groups {
        parts.push(&digits[offset..offset + len]);
        offset += len;
    }
    parts.join("-")
}
