//! URL repair for recognized lines.
//!
//! Each fix below targets one misread the engine actually produces on
//! printed cards. The cascade is ordered: separator folding first, then the
//! scheme, then the host, then Japan-specific domain suffixes — later steps
//! assume earlier ones have already normalized the separators. Keep new
//! rules in cascade position, not appended at the end.
//!
//! | step | fixes |
//! |------|-------|
//! | 1 | full-width colon/slash/dot, dash variants, whitespace |
//! | 2 | trailing bracket/full-stop/ellipsis noise |
//! | 3 | characters outside the URL character set, stray `!` |
//! | 4 | `httpsrn…`, leading `nttps`/`nhttps`/`nttp`, `httplynw…`/`httpyl…` |
//! | 5 | `wvvw`/`vvvw`/`wwvw`/`wvw`/`ww`/`vvv`/`vv` (and a dotless `www`) |
//! | 6 | scheme separator reassertion (`http:/x`, `https;//x`, `httpx`) |
//! | 7 | hyphens after `://`, `kww`, doubled `.`/`-` separators |
//! | 8 | `sagawra`, `.co/.or/.ne` + `ip`→`jp`, punctuation inside `.co.jp` |

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const URL_CHARSET: &str = ":/?#[]@!$&'()*+,;=._%-";

static TRAILING_NOISE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[)\]}>）］｝」』〉】。｡、…]+$").expect("valid trailing-noise regex"));

static SCHEME_RN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(https?)[:;]?/{0,2}rn").expect("valid scheme-rn regex"));

static LEADING_NTTPS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:nhttps|nttps)").expect("valid nttps regex"));

static LEADING_NTTP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^nttp").expect("valid nttp regex"));

static SCHEME_GARBLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(https?)[:;]?/{0,2}(?:lynw|lnw|yl)").expect("valid scheme-garble regex")
});

static WWW_CONFUSABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?)?[:;]?/{0,2}(?:wvvw|vvvw|wwvw|www|wvw|vvv|ww|vv)\.?")
        .expect("valid www-confusable regex")
});

static SCHEME_SEP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(https?)[:;]?/{0,2}").expect("valid scheme-sep regex"));

static POST_SCHEME_HYPHENS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"://-+").expect("valid post-scheme hyphen regex"));

static KWW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|://)kww\.?").expect("valid kww regex"));

static DOT_HYPHEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.-+|-+\.").expect("valid dot-hyphen regex"));

static REPEATED_DOTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.{2,}").expect("valid repeated-dots regex"));

static REPEATED_HYPHENS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-{2,}").expect("valid repeated-hyphens regex"));

static SAGAWA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)sagawra").expect("valid brand regex"));

static JP_TLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(co|or|ne)\.ip").expect("valid jp-tld regex"));

static CO_JP_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.co[.,;:'!\-]+jp").expect("valid co-jp punct regex"));

/// Fold full-width separators to ASCII and drop all whitespace.
fn fold_separators(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '：' => ':',
            '／' => '/',
            '．' => '.',
            '\u{2010}' | '\u{2011}' | '\u{2013}' | '\u{2014}' | '\u{2015}' | '\u{2212}'
            | '\u{30FC}' | '\u{FF0D}' => '-',
            other => other,
        })
        .collect()
}

/// Keep only characters valid in a URL, then drop stray exclamation marks
/// (a common misread of punctuation around the scheme separator).
fn keep_url_charset(text: &str) -> String {
    text.chars()
        .filter(|c| (c.is_ascii_alphanumeric() || URL_CHARSET.contains(*c)) && *c != '!')
        .collect()
}

/// Best-effort repair of a recognized URL. Never fails; when no URL markers
/// are recoverable the partially cleaned string is returned as-is.
pub fn normalize_url(text: &str) -> String {
    // 1-3: separators, trailing noise, character set
    let mut url = fold_separators(text);
    url = TRAILING_NOISE_RE.replace(&url, "").into_owned();
    url = keep_url_charset(&url);

    // 4: scheme-separator misreads
    url = SCHEME_RN_RE
        .replace_all(&url, |caps: &Captures| scheme_sep(&caps[1]))
        .into_owned();
    url = LEADING_NTTPS_RE.replace(&url, "https").into_owned();
    url = LEADING_NTTP_RE.replace(&url, "http").into_owned();
    url = SCHEME_GARBLE_RE
        .replace_all(&url, |caps: &Captures| scheme_sep(&caps[1]))
        .into_owned();

    // 5: "www." misreads
    url = WWW_CONFUSABLE_RE
        .replace(&url, |caps: &Captures| match caps.get(1) {
            Some(scheme) => format!("{}www.", scheme_sep(scheme.as_str())),
            None => "www.".to_string(),
        })
        .into_owned();

    // 6: re-assert the scheme separator
    url = SCHEME_SEP_RE
        .replace(&url, |caps: &Captures| scheme_sep(&caps[1]))
        .into_owned();

    // 7: domain-level noise
    url = POST_SCHEME_HYPHENS_RE.replace_all(&url, "://").into_owned();
    url = KWW_RE
        .replace_all(&url, |caps: &Captures| format!("{}www.", &caps[1]))
        .into_owned();
    url = DOT_HYPHEN_RE.replace_all(&url, ".").into_owned();
    url = REPEATED_DOTS_RE.replace_all(&url, ".").into_owned();
    url = REPEATED_HYPHENS_RE.replace_all(&url, "-").into_owned();

    // 8: brand and TLD confusions
    url = SAGAWA_RE.replace_all(&url, "sagawa").into_owned();
    url = JP_TLD_RE
        .replace_all(&url, |caps: &Captures| {
            format!(".{}.jp", caps[1].to_lowercase())
        })
        .into_owned();
    url = CO_JP_PUNCT_RE.replace_all(&url, ".co.jp").into_owned();

    url
}

fn scheme_sep(scheme: &str) -> String {
    format!("{}://", scheme.to_lowercase())
}
