//! Helpers for keeping diagnostics a reasonable size.

/// Truncates to at most `max_chars` characters (not bytes).
pub fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Truncates and folds onto a single line, for engine output going into
/// log lines.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    truncate(text, max_chars).replace(['\r', '\n'], " ").trim().to_string()
}
