//! Pipeline stages.
//!
//! Each stage is a struct with a `run` method: a primary model-backed path
//! plus a private deterministic fallback used whenever the model call fails
//! or returns unusable output. Fallbacks never error, so a stage always
//! yields a well-formed result of its documented shape.

pub mod analyst;
pub mod critic;
pub mod researcher;
pub mod writer;

/// Clip a string to at most `max_chars` characters, on a char boundary.
pub(crate) fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
