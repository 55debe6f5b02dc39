//! Citation windows: bounded context snippets around a match.

/// Characters of context kept on each side of a match.
pub const CITATION_WINDOW: usize = 50;

/// The citation snippet for a match spanning `start..end` byte offsets.
///
/// The window is `max(0, start - W)..min(len, end + W)`, clamped to UTF-8
/// character boundaries and trimmed. It always contains the matched
/// substring; near the text edges it is truncated, never padded.
pub fn citation_window(text: &str, start: usize, end: usize) -> &str {
    debug_assert!(start <= end && end <= text.len());

    let mut from = start.saturating_sub(CITATION_WINDOW);
    while !text.is_char_boundary(from) {
        from -= 1;
    }

    let mut to = end.saturating_add(CITATION_WINDOW).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }

    text[from..to].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_contains_match() {
        let text = "aaaa Cap Rate: 6.5% bbbb";
        let start = text.find("Cap").unwrap();
        let end = start + "Cap Rate: 6.5%".len();
        let snippet = citation_window(text, start, end);
        assert!(snippet.contains("Cap Rate: 6.5%"));
    }

    #[test]
    fn test_window_truncates_at_text_start() {
        let text = "NOI: $100";
        let snippet = citation_window(text, 0, text.len());
        assert_eq!(snippet, "NOI: $100");
    }

    #[test]
    fn test_window_is_bounded() {
        let filler = "x".repeat(500);
        let text = format!("{filler} MATCH {filler}");
        let start = text.find("MATCH").unwrap();
        let end = start + "MATCH".len();
        let snippet = citation_window(&text, start, end);
        assert!(snippet.len() <= "MATCH".len() + 2 * CITATION_WINDOW);
        assert!(snippet.contains("MATCH"));
    }

    #[test]
    fn test_window_respects_char_boundaries() {
        // Multibyte characters straddling both window edges.
        let text = "ééééééééééééééééééééééééééééé VALUE ééééééééééééééééééééééééééééé";
        let start = text.find("VALUE").unwrap();
        let end = start + "VALUE".len();
        let snippet = citation_window(text, start, end);
        assert!(snippet.contains("VALUE"));
    }
}
