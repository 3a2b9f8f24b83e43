//! Language negotiation for outbound verification mail.

use serde::{Deserialize, Serialize};

/// Languages the verification mail is available in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailLanguage {
    #[default]
    En,
    Nl,
}

impl EmailLanguage {
    /// Map a locale tag or an `Accept-Language` value to a mail language.
    ///
    /// Only the first listed language is considered, with any quality
    /// parameter stripped. Anything that does not start with `nl` is English.
    pub fn from_tag(tag: &str) -> Self {
        let lowered = tag.trim().to_lowercase();
        let first = lowered.split(',').next().unwrap_or_default();
        let first = first.split(';').next().unwrap_or_default().trim();
        if first.starts_with("nl") {
            Self::Nl
        } else {
            Self::En
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Nl => "nl",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dutch_tags() {
        assert_eq!(EmailLanguage::from_tag("nl"), EmailLanguage::Nl);
        assert_eq!(EmailLanguage::from_tag("nl-BE"), EmailLanguage::Nl);
        assert_eq!(EmailLanguage::from_tag("NL-nl,en;q=0.8"), EmailLanguage::Nl);
        assert_eq!(EmailLanguage::from_tag(" nl;q=0.9"), EmailLanguage::Nl);
    }

    #[test]
    fn test_everything_else_is_english() {
        assert_eq!(EmailLanguage::from_tag(""), EmailLanguage::En);
        assert_eq!(EmailLanguage::from_tag("de-DE"), EmailLanguage::En);
        assert_eq!(EmailLanguage::from_tag("en-US,nl;q=0.9"), EmailLanguage::En);
    }
}
