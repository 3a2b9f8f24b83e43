//! Query classification and text matching.
//!
//! The mode is chosen from the literal syntax of the query, in order:
//! a quoted phrase, then `|` alternatives, then space-separated terms, then a
//! plain substring.

use crate::error::{Result, SearchError};
use crate::snippet::find_case_insensitive;

/// How a query is matched against entry text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchMode {
    /// `"..."`: case-sensitive substring of the inner text.
    Phrase(String),
    /// `a|b`: case-insensitive, any alternative.
    AnyOf(Vec<String>),
    /// `a b`: case-insensitive, every term.
    AllOf(Vec<String>),
    /// Case-insensitive substring.
    Plain(String),
}

/// A classified search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    mode: MatchMode,
}

/// Where a query matched inside a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMatch {
    /// Byte offset of the match start.
    pub start: usize,
    /// Byte offset one past the match end.
    pub end: usize,
}

impl SearchQuery {
    /// Classify a raw query string.
    ///
    /// Blank alternatives and terms are dropped, so `apple|` searches for
    /// `apple` alone rather than matching every entry.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let mode = if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
            let inner = &raw[1..raw.len() - 1];
            if inner.is_empty() {
                return Err(SearchError::EmptyQuery);
            }
            MatchMode::Phrase(inner.to_string())
        } else if raw.contains('|') {
            MatchMode::AnyOf(split_terms(raw, '|'))
        } else if raw.contains(' ') {
            MatchMode::AllOf(split_terms(raw, ' '))
        } else {
            MatchMode::Plain(raw.to_string())
        };

        // A query like "|" or " | " has no usable terms.
        match &mode {
            MatchMode::AnyOf(terms) | MatchMode::AllOf(terms) if terms.is_empty() => {
                Err(SearchError::EmptyQuery)
            }
            _ => Ok(Self {
                raw: raw.to_string(),
                mode,
            }),
        }
    }

    /// The query as submitted.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn mode(&self) -> &MatchMode {
        &self.mode
    }

    /// Match entry text, returning the span the snippet is anchored on.
    pub fn match_text(&self, text: &str) -> Option<TextMatch> {
        match &self.mode {
            MatchMode::Phrase(phrase) => text.find(phrase.as_str()).map(|start| TextMatch {
                start,
                end: start + phrase.len(),
            }),
            MatchMode::AnyOf(terms) => terms
                .iter()
                .find_map(|term| find_case_insensitive(text, term)),
            MatchMode::AllOf(terms) => {
                let mut anchor = None;
                for term in terms {
                    let found = find_case_insensitive(text, term)?;
                    anchor.get_or_insert(found);
                }
                anchor
            }
            MatchMode::Plain(needle) => find_case_insensitive(text, needle),
        }
    }

    /// Match a decrypted attachment name against the raw query.
    pub fn match_filename(&self, name: &str) -> bool {
        find_case_insensitive(name, &self.raw).is_some()
    }
}

fn split_terms(raw: &str, sep: char) -> Vec<String> {
    raw.split(sep)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_precedence() {
        assert_eq!(
            SearchQuery::parse("\"a|b c\"").unwrap().mode(),
            &MatchMode::Phrase("a|b c".into())
        );
        assert_eq!(
            SearchQuery::parse("apple | banana split").unwrap().mode(),
            &MatchMode::AnyOf(vec!["apple".into(), "banana split".into()])
        );
        assert_eq!(
            SearchQuery::parse("red  apple").unwrap().mode(),
            &MatchMode::AllOf(vec!["red".into(), "apple".into()])
        );
        assert_eq!(
            SearchQuery::parse("apple").unwrap().mode(),
            &MatchMode::Plain("apple".into())
        );
    }

    #[test]
    fn test_single_quote_is_plain() {
        assert_eq!(
            SearchQuery::parse("\"").unwrap().mode(),
            &MatchMode::Plain("\"".into())
        );
    }

    #[test]
    fn test_empty_queries_rejected() {
        for raw in ["", "   ", "\"\"", "|", " | ", "||"] {
            assert!(
                matches!(SearchQuery::parse(raw), Err(SearchError::EmptyQuery)),
                "{raw:?} accepted"
            );
        }
    }

    #[test]
    fn test_blank_alternatives_dropped() {
        let q = SearchQuery::parse("apple|").unwrap();
        assert_eq!(q.mode(), &MatchMode::AnyOf(vec!["apple".into()]));
        assert!(q.match_text("banana bread").is_none());

        assert_eq!(
            SearchQuery::parse("apple banana ").unwrap().mode(),
            &MatchMode::AllOf(vec!["apple".into(), "banana".into()])
        );
    }

    #[test]
    fn test_phrase_is_case_sensitive() {
        let q = SearchQuery::parse("\"apple pie\"").unwrap();
        assert!(q.match_text("I baked apple pie").is_some());
        assert!(q.match_text("I baked Apple Pie").is_none());
    }

    #[test]
    fn test_any_of_first_alternative_wins() {
        let q = SearchQuery::parse("banana|apple").unwrap();
        let text = "apple then banana";
        let m = q.match_text(text).unwrap();
        assert_eq!(&text[m.start..m.end], "banana");
        assert!(q.match_text("cherry").is_none());
    }

    #[test]
    fn test_all_of_requires_every_term_and_anchors_on_first() {
        let q = SearchQuery::parse("pie APPLE").unwrap();
        let text = "Apple pie";
        let m = q.match_text(text).unwrap();
        assert_eq!(&text[m.start..m.end], "pie");
        assert!(q.match_text("apple sauce").is_none());
    }

    #[test]
    fn test_plain_is_case_insensitive() {
        let q = SearchQuery::parse("APPLE").unwrap();
        let text = "an apple a day";
        let m = q.match_text(text).unwrap();
        assert_eq!(&text[m.start..m.end], "apple");
    }

    #[test]
    fn test_filename_uses_raw_query() {
        let q = SearchQuery::parse("beach|pool").unwrap();
        assert!(!q.match_filename("beach.jpg"));
        assert!(q.match_filename("BEACH|POOL.txt"));

        let q = SearchQuery::parse("Beach").unwrap();
        assert!(q.match_filename("my-beach.JPG"));
    }
}
