// src/slug.rs
use deunicode::deunicode;

/// URL-safe identifier: lowercase ASCII words joined by single hyphens.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode(text).to_ascii_lowercase();
    let mut out = String::with_capacity(ascii.len());
    let mut pending_sep = false;

    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_sep = true;
        }
    }
    out
}

/// Lowercase, accent-free form used for keyword and token comparisons.
/// Punctuation is kept; whitespace runs collapse to one space.
pub fn fold(text: &str) -> String {
    deunicode(text)
        .to_ascii_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cuts `s` to at most `max` bytes of a slug and drops a dangling hyphen.
pub fn truncate_slug(s: &str, max: usize) -> String {
    let cut = if s.len() > max { &s[..max] } else { s };
    cut.trim_end_matches('-').to_string()
}
