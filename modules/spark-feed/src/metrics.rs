use std::sync::OnceLock;

use regex::Regex;

/// Number with optional grouping commas, decimal point, and one magnitude
/// suffix, as it appears inside accessible labels ("1.5万件のいいね",
/// "155 likes"). Latin suffixes match either case.
fn label_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:,\d+)*(?:\.\d+)?(?:[KM]|万|億)?)").expect("valid regex")
    })
}

/// Parse an on-page engagement count. Prefers the element's visible text;
/// when that is empty, falls back to the first numeric run in the accessible
/// label. Anything unparseable degrades to 0, never an error.
///
/// Suffix multipliers: K→10^3, M→10^6, 万→10^4, 億→10^8.
pub fn parse_metric(raw_text: &str, aria_label: &str) -> u64 {
    let mut raw = raw_text.trim().to_string();
    if raw.is_empty() {
        if let Some(captures) = label_number_re().captures(aria_label) {
            raw = captures[1].to_string();
        }
    }
    if raw.is_empty() {
        return 0;
    }

    let upper = raw.to_uppercase();
    let mut multiplier = 1.0f64;
    if upper.contains('K') {
        multiplier = 1_000.0;
    }
    if upper.contains('M') {
        multiplier = 1_000_000.0;
    }
    if raw.contains('万') {
        multiplier = 10_000.0;
    }
    if raw.contains('億') {
        multiplier = 100_000_000.0;
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | 'K' | 'k' | 'M' | 'm' | '万' | '億'))
        .collect();

    match leading_number(cleaned.trim()) {
        Some(value) => (value * multiplier).floor() as u64,
        None => 0,
    }
}

/// Longest numeric prefix of `s` as f64 (digits with at most one decimal
/// point), or None when the string does not start with a number.
fn leading_number(s: &str) -> Option<f64> {
    let mut end = 0usize;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '.' if !seen_dot => {
                seen_dot = true;
                end = i + 1;
            }
            _ => break,
        }
    }
    s[..end].parse::<f64>().ok()
}
