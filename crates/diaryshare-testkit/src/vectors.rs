//! Golden test vectors for share tokens and session cookies.
//!
//! Existing share links and outstanding cookies must keep working across
//! implementations, so these encodings are fixed byte for byte.

use chrono::{DateTime, Utc};
use diaryshare_core::{EmailAddress, RawToken, SessionSigner};
use diaryshare_perms::CredentialCodec;

/// A share token and its lookup hash.
#[derive(Debug, Clone)]
pub struct TokenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Raw token bytes.
    pub token: [u8; 32],
    /// Expected link encoding (URL-safe base64, padded).
    pub expected_token: &'static str,
    /// Expected hash encoding.
    pub expected_hash: &'static str,
    /// Expected hash as hex.
    pub expected_hash_hex: &'static str,
}

/// A session cookie value.
#[derive(Debug, Clone)]
pub struct CookieVector {
    pub name: &'static str,
    pub secret: &'static str,
    /// Bytes of the token the cookie is bound to.
    pub token: [u8; 32],
    pub email: &'static str,
    /// Expiry, unix seconds.
    pub exp: i64,
    /// Version at issuance; 0 produces the legacy versionless payload.
    pub version: u64,
    pub expected_value: &'static str,
}

fn counting_bytes() -> [u8; 32] {
    let mut bytes = [0u8; 32];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = i as u8;
    }
    bytes
}

/// Get all token vectors.
pub fn all_token_vectors() -> Vec<TokenVector> {
    vec![
        TokenVector {
            name: "counting bytes",
            token: counting_bytes(),
            expected_token: "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=",
            expected_hash: "Yw3NKWbEM2aRElRIu7JbT_QSpJxzLbLIq8G4WBvXEN0=",
            expected_hash_hex: "630dcd2966c4336691125448bbb25b4ff412a49c732db2c8abc1b8581bd710dd",
        },
        TokenVector {
            name: "repeated 0x42",
            token: [0x42; 32],
            expected_token: "QkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkI=",
            expected_hash: "Ql7U5KNrMOohuQ4hxxLGSeghTCm36vaAidEDnG5VOEw=",
            expected_hash_hex: "",
        },
        TokenVector {
            name: "all ones exercises the URL-safe alphabet",
            token: [0xff; 32],
            expected_token: "__________________________________________8=",
            expected_hash: "r5YTdg9yY1-9tEpaCmPDnxKvMPlQpu5clxvhiOicQFE=",
            expected_hash_hex: "",
        },
    ]
}

/// Get all cookie vectors.
pub fn all_cookie_vectors() -> Vec<CookieVector> {
    vec![
        CookieVector {
            name: "versioned credential",
            secret: "golden-secret",
            token: counting_bytes(),
            email: "viewer@example.com",
            exp: 1_900_000_000,
            version: 3,
            expected_value: "eyJ0b2tlbl9oYXNoIjoiWXczTktXYkVNMmFSRWxSSXU3SmJUX1FTcEp4ekxiTElxOEc0V0J2WEVOMD0iLCJlbWFpbCI6InZpZXdlckBleGFtcGxlLmNvbSIsImV4cCI6MTkwMDAwMDAwMCwidmVyc2lvbiI6M30.GnVpDgusoJr-PPwOL45KsYqzflymPwD_lnvIav1jPKA",
        },
        CookieVector {
            name: "legacy credential without version",
            secret: "golden-secret",
            token: counting_bytes(),
            email: "viewer@example.com",
            exp: 1_900_000_000,
            version: 0,
            expected_value: "eyJ0b2tlbl9oYXNoIjoiWXczTktXYkVNMmFSRWxSSXU3SmJUX1FTcEp4ekxiTElxOEc0V0J2WEVOMD0iLCJlbWFpbCI6InZpZXdlckBleGFtcGxlLmNvbSIsImV4cCI6MTkwMDAwMDAwMH0.jlWq3Fim_qcMgjkQEf_ifjlu757xMO7TY3AzgbHPylc",
        },
    ]
}

fn codec_for(v: &CookieVector) -> CredentialCodec {
    CredentialCodec::new(SessionSigner::new(v.secret).expect("vector secret is not empty"))
}

/// Build the cookie value a vector describes.
pub fn build_cookie_from_vector(v: &CookieVector) -> String {
    let email = EmailAddress::parse(v.email).expect("vector email is valid");
    let expires = DateTime::<Utc>::from_timestamp(v.exp, 0).expect("vector expiry in range");
    codec_for(v)
        .build(RawToken::from_bytes(v.token).hash(), &email, expires, v.version)
        .expect("credential serializes")
}

/// Verify all golden vectors.
///
/// Returns `(name, matches, produced)` for each vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let tokens = all_token_vectors().into_iter().map(|v| {
        let token = RawToken::from_bytes(v.token);
        let got = format!("{} {}", token.encode(), token.hash().encode());
        let hex_ok = v.expected_hash_hex.is_empty()
            || hex::encode(token.hash().as_bytes()) == v.expected_hash_hex;
        let ok = token.encode() == v.expected_token
            && token.hash().encode() == v.expected_hash
            && hex_ok;
        (v.name.to_string(), ok, got)
    });

    let cookies = all_cookie_vectors().into_iter().map(|v| {
        let got = build_cookie_from_vector(&v);
        (v.name.to_string(), got == v.expected_value, got)
    });

    tokens.chain(cookies).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, ok, got) in verify_all_vectors() {
            assert!(ok, "vector '{}' produced {}", name, got);
        }
    }

    #[test]
    fn test_token_vectors_parse_back() {
        for v in all_token_vectors() {
            let parsed = RawToken::parse(v.expected_token).unwrap();
            assert_eq!(parsed.as_bytes(), &v.token, "vector '{}'", v.name);

            let unpadded = v.expected_token.trim_end_matches('=');
            assert_eq!(RawToken::parse(unpadded).unwrap().as_bytes(), &v.token);
        }
    }

    #[test]
    fn test_cookie_vectors_parse() {
        let before_expiry = DateTime::<Utc>::from_timestamp(1_800_000_000, 0).unwrap();

        for v in all_cookie_vectors() {
            let codec = codec_for(&v);
            let hash = RawToken::from_bytes(v.token).hash();
            let current = v.version.max(1);

            let credential = codec
                .parse(v.expected_value, &hash, current, before_expiry)
                .unwrap_or_else(|e| panic!("vector '{}' rejected: {}", v.name, e));
            assert_eq!(credential.email.as_str(), v.email);
            assert_eq!(credential.exp, v.exp);
            assert_eq!(credential.effective_version(), current);
        }
    }

    #[test]
    fn test_cookie_vectors_reject_other_secret() {
        let before_expiry = DateTime::<Utc>::from_timestamp(1_800_000_000, 0).unwrap();
        let other = CredentialCodec::new(SessionSigner::new("another-secret").unwrap());

        for v in all_cookie_vectors() {
            let hash = RawToken::from_bytes(v.token).hash();
            assert!(other
                .parse(v.expected_value, &hash, v.version.max(1), before_expiry)
                .is_err());
        }
    }
}
