//! Message content sanitization.
//!
//! Content is HTML-escaped before it reaches the store, so the escaped
//! form is what both live broadcast and history replay carry. Raw markup
//! never round-trips through the hub.

/// Escape HTML entities.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
