//! Case-insensitive matching and context snippets.

use crate::query::TextMatch;

/// Characters of context kept on each side of a match.
pub const CONTEXT_CHARS: usize = 50;

/// Prefix of snippets produced by an attachment-name match.
pub const ATTACHMENT_MARKER: &str = "📎";

const ELLIPSIS: &str = "...";

/// Find `needle` in `text` ignoring case.
///
/// Offsets refer to `text` and always fall on character boundaries, even when
/// lower-casing changes the byte length of a character.
pub fn find_case_insensitive(text: &str, needle: &str) -> Option<TextMatch> {
    if needle.is_empty() {
        return None;
    }

    let needle: String = needle.chars().flat_map(char::to_lowercase).collect();

    // origin[i] is the byte offset in `text` of the char that produced lowered byte i
    let mut lowered = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    for (offset, ch) in text.char_indices() {
        for lc in ch.to_lowercase() {
            lowered.push(lc);
            origin.extend(std::iter::repeat(offset).take(lc.len_utf8()));
        }
    }

    let pos = lowered.find(&needle)?;
    let start = origin[pos];
    let last = origin[pos + needle.len() - 1];
    let end = last + text[last..].chars().next().map_or(0, char::len_utf8);
    Some(TextMatch { start, end })
}

/// Cut a window of context around a match.
///
/// Keeps up to [`CONTEXT_CHARS`] characters on each side and marks truncated
/// sides with `...`.
pub fn context_snippet(text: &str, m: TextMatch) -> String {
    let start = text[..m.start]
        .char_indices()
        .rev()
        .nth(CONTEXT_CHARS - 1)
        .map_or(0, |(i, _)| i);
    let end = text[m.end..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map_or(text.len(), |(i, _)| m.end + i);

    let mut snippet = String::with_capacity(end - start + 2 * ELLIPSIS.len());
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.push_str(&text[start..end]);
    if end < text.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

/// Snippet for an attachment whose name matched.
pub fn attachment_snippet(filename: &str) -> String {
    format!("{ATTACHMENT_MARKER} {filename}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_find_ascii() {
        let m = find_case_insensitive("Hello World", "WORLD").unwrap();
        assert_eq!((m.start, m.end), (6, 11));
        assert!(find_case_insensitive("Hello", "bye").is_none());
        assert!(find_case_insensitive("Hello", "").is_none());
    }

    #[test]
    fn test_find_multibyte() {
        let text = "Über den Fluß gehen";
        let m = find_case_insensitive(text, "über").unwrap();
        assert_eq!(&text[m.start..m.end], "Über");

        let m = find_case_insensitive(text, "FLUSS");
        assert!(m.is_none());

        let m = find_case_insensitive(text, "fluß").unwrap();
        assert_eq!(&text[m.start..m.end], "Fluß");
    }

    #[test]
    fn test_find_when_lowercase_changes_length() {
        // 'İ' lowercases to two chars ("i" + combining dot)
        let text = "İstanbul trip";
        let m = find_case_insensitive(text, "trip").unwrap();
        assert_eq!(&text[m.start..m.end], "trip");
    }

    #[test]
    fn test_short_text_is_not_truncated() {
        let text = "an apple a day";
        let m = find_case_insensitive(text, "apple").unwrap();
        assert_eq!(context_snippet(text, m), text);
    }

    #[test]
    fn test_long_text_is_truncated_on_both_sides() {
        let before = "a".repeat(80);
        let after = "b".repeat(80);
        let text = format!("{before}needle{after}");
        let m = find_case_insensitive(&text, "needle").unwrap();

        let snippet = context_snippet(&text, m);
        assert_eq!(
            snippet,
            format!("...{}needle{}...", "a".repeat(50), "b".repeat(50))
        );
    }

    #[test]
    fn test_exact_window_has_no_ellipsis() {
        let text = format!("{}x{}", "a".repeat(50), "b".repeat(50));
        let m = find_case_insensitive(&text, "x").unwrap();
        assert_eq!(context_snippet(&text, m), text);
    }

    #[test]
    fn test_attachment_snippet() {
        assert_eq!(attachment_snippet("beach.jpg"), "📎 beach.jpg");
    }

    proptest! {
        #[test]
        fn prop_snippet_contains_match(
            before in "\\PC{0,120}",
            needle in "[a-zA-Z]{1,8}",
            after in "\\PC{0,120}",
        ) {
            let text = format!("{before}{needle}{after}");
            let m = find_case_insensitive(&text, &needle).unwrap();
            let snippet = context_snippet(&text, m);
            prop_assert!(snippet.contains(&text[m.start..m.end]));
            prop_assert!(snippet.chars().count() <= 2 * CONTEXT_CHARS + (m.end - m.start) + 6);
        }
    }
}
