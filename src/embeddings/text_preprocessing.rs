//! Text cleanup applied before embedding
//!
//! The stored chunk text is kept verbatim; only the text sent to the
//! embedding provider is normalized.

/// Normalize text for an embedding request.
///
/// Returns `None` when nothing but whitespace or control characters remain.
#[must_use]
pub fn prepare_for_embedding(text: &str) -> Option<String> {
    let cleaned = normalize_whitespace(&sanitize_text(text));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Collapse any run of whitespace (including newlines and tabs) to one space
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Replace control characters with spaces
fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}
