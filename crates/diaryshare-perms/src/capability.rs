//! Issuing and opening share capabilities.
//!
//! Issuing mints a fresh token, keeps only its hash, and seals the owner's
//! derived key under the token. Opening reverses the seal for a presented
//! token; storage lookup by hash happens in the caller.

use chrono::Utc;
use diaryshare_core::{DerivedKey, OwnerId, RawToken, ShareCapability};

use crate::envelope::WrappedKey;
use crate::error::{PermsError, Result};

/// A freshly minted capability together with the token that opens it.
///
/// The token is handed to the owner exactly once and never stored.
#[derive(Debug)]
pub struct IssuedCapability {
    pub token: RawToken,
    pub capability: ShareCapability,
}

/// Mint a new capability for `owner`.
pub fn issue_capability(owner: OwnerId, derived: &DerivedKey) -> Result<IssuedCapability> {
    let token = RawToken::generate();
    let wrapped = WrappedKey::seal(derived, &token)?;

    let capability = ShareCapability {
        owner,
        token_hash: token.hash(),
        wrapped_key: wrapped.to_bytes()?,
        created_at: Utc::now(),
    };

    Ok(IssuedCapability { token, capability })
}

/// Recover the derived key stored in `capability` using `token`.
///
/// A corrupt envelope and a wrong token both come back as
/// [`PermsError::KeyUnwrapFailed`].
pub fn open_capability(capability: &ShareCapability, token: &RawToken) -> Result<DerivedKey> {
    let wrapped = WrappedKey::from_bytes(&capability.wrapped_key)
        .map_err(|_| PermsError::KeyUnwrapFailed)?;
    wrapped.open(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_then_open() {
        let derived = DerivedKey::from_bytes(b"k".repeat(32));
        let issued = issue_capability(OwnerId(1), &derived).unwrap();

        assert_eq!(issued.capability.owner, OwnerId(1));
        assert_eq!(issued.capability.token_hash, issued.token.hash());
        assert_eq!(
            open_capability(&issued.capability, &issued.token).unwrap(),
            derived
        );
    }

    #[test]
    fn test_capability_does_not_contain_token() {
        let issued = issue_capability(OwnerId(1), &DerivedKey::from_bytes(vec![0; 32])).unwrap();
        let token = issued.token.as_bytes();
        let stored = &issued.capability.wrapped_key;
        assert!(!stored.windows(token.len()).any(|w| w == token));
    }

    #[test]
    fn test_each_issue_mints_new_token() {
        let derived = DerivedKey::from_bytes(vec![3; 32]);
        let a = issue_capability(OwnerId(1), &derived).unwrap();
        let b = issue_capability(OwnerId(1), &derived).unwrap();
        assert_ne!(a.capability.token_hash, b.capability.token_hash);
        assert!(matches!(
            open_capability(&b.capability, &a.token),
            Err(PermsError::KeyUnwrapFailed)
        ));
    }

    #[test]
    fn test_corrupt_envelope_is_unwrap_failure() {
        let mut issued =
            issue_capability(OwnerId(1), &DerivedKey::from_bytes(vec![3; 32])).unwrap();
        issued.capability.wrapped_key = vec![0xff, 0x00];
        assert!(matches!(
            open_capability(&issued.capability, &issued.token),
            Err(PermsError::KeyUnwrapFailed)
        ));
    }
}
