//! Persisted records: the share capability and access-log events.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{OwnerId, TokenHash};

/// The stored half of a share link.
///
/// `wrapped_key` is the owner's derived key sealed under the raw token, in the
/// envelope format of the permissions crate. At most one capability exists
/// per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareCapability {
    pub owner: OwnerId,
    pub token_hash: TokenHash,
    pub wrapped_key: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// What a viewer did with a share link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessEventKind {
    CodeRequested,
    Verified,
    Access,
}

impl AccessEventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CodeRequested => "code_requested",
            Self::Verified => "verified",
            Self::Access => "access",
        }
    }
}

impl fmt::Display for AccessEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessEventKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code_requested" => Ok(Self::CodeRequested),
            "verified" => Ok(Self::Verified),
            "access" => Ok(Self::Access),
            other => Err(CoreError::DecodingError(format!(
                "unknown access event: {}",
                other
            ))),
        }
    }
}

/// One entry of an owner's append-only access log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    pub owner: OwnerId,
    /// Verified viewer email, empty when verification is not required.
    pub email: String,
    pub client_ip: String,
    pub event: AccessEventKind,
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

impl AccessEvent {
    pub fn new(
        owner: OwnerId,
        event: AccessEventKind,
        email: impl Into<String>,
        client_ip: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            owner,
            email: email.into(),
            client_ip: client_ip.into(),
            event,
            path: path.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names() {
        for kind in [
            AccessEventKind::CodeRequested,
            AccessEventKind::Verified,
            AccessEventKind::Access,
        ] {
            assert_eq!(kind.as_str().parse::<AccessEventKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!("viewed".parse::<AccessEventKind>().is_err());
    }

    #[test]
    fn test_access_event_json_shape() {
        let event = AccessEvent::new(
            OwnerId(9),
            AccessEventKind::Verified,
            "v@example.com",
            "203.0.113.5",
            "/share/verify",
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["owner"], 9);
        assert_eq!(value["event"], "verified");
        assert_eq!(value["client_ip"], "203.0.113.5");
    }
}
