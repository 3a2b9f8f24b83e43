//! Email address normalization, validation and the per-owner allow-list.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Lower-case and trim an address. Every comparison goes through this.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Syntactic check for a bare `local@domain` address.
///
/// Both parts must be dot-separated runs of RFC 5322 atom characters. Display
/// names, angle brackets, comments and quoted local parts are rejected.
pub fn is_valid_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    is_dot_atom(local) && is_dot_atom(domain)
}

fn is_dot_atom(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(|atom| !atom.is_empty() && atom.chars().all(is_atext))
}

fn is_atext(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '/' | '=' | '?' | '^' | '_'
                | '`' | '{' | '|' | '}' | '~'
        )
}

/// A normalized, syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Normalize and validate.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = normalize_email(raw);
        if !is_valid_email(&normalized) {
            return Err(CoreError::InvalidEmail(raw.trim().to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// The set of addresses an owner allows to receive verification codes.
///
/// Iteration order is the order in which the owner first listed each address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAllowlist(Vec<EmailAddress>);

impl EmailAllowlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from owner input.
    ///
    /// Entries are normalized, blank entries are dropped, duplicates keep their
    /// first position. Any remaining invalid entry rejects the whole list.
    pub fn from_input<I, T>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut list = Self::new();
        for entry in entries {
            let normalized = normalize_email(entry.as_ref());
            if normalized.is_empty() {
                continue;
            }
            list.insert(EmailAddress::parse(&normalized)?);
        }
        Ok(list)
    }

    /// Add an address; returns false if it was already present.
    pub fn insert(&mut self, email: EmailAddress) -> bool {
        if self.0.contains(&email) {
            return false;
        }
        self.0.push(email);
        true
    }

    pub fn contains(&self, email: &EmailAddress) -> bool {
        self.0.contains(email)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmailAddress> {
        self.0.iter()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|e| e.to_string()).collect()
    }
}

impl FromIterator<EmailAddress> for EmailAllowlist {
    fn from_iter<I: IntoIterator<Item = EmailAddress>>(iter: I) -> Self {
        let mut list = Self::new();
        for email in iter {
            list.insert(email);
        }
        list
    }
}
