//! Proptest generators for property-based testing.

use proptest::prelude::*;

use diaryshare_core::{DerivedKey, EmailAddress, OwnerId, RawToken};

/// Generate a random share token.
pub fn raw_token() -> impl Strategy<Value = RawToken> {
    any::<[u8; 32]>().prop_map(RawToken::from_bytes)
}

/// Generate derived key material of a realistic length.
pub fn derived_key() -> impl Strategy<Value = DerivedKey> {
    prop::collection::vec(any::<u8>(), 16..=64).prop_map(DerivedKey::from_bytes)
}

/// Generate a positive owner id.
pub fn owner() -> impl Strategy<Value = OwnerId> {
    (1i64..=i64::MAX).prop_map(OwnerId::new)
}

/// Generate a syntactically valid address, in mixed case.
pub fn email() -> impl Strategy<Value = String> {
    ("[a-zA-Z0-9]{1,12}(\\.[a-z0-9]{1,6})?", "[a-z0-9]{1,10}", "[a-z]{2,6}")
        .prop_map(|(local, domain, tld)| format!("{local}@{domain}.{tld}"))
}

/// Generate a normalized, validated address.
pub fn email_address() -> impl Strategy<Value = EmailAddress> {
    email().prop_filter_map("valid address", |raw| EmailAddress::parse(&raw).ok())
}

/// Generate a six-digit verification code.
pub fn code() -> impl Strategy<Value = String> {
    (0u32..1_000_000).prop_map(|n| format!("{n:06}"))
}

/// Generate free text of bounded length, including multi-byte characters.
pub fn diary_text(max_chars: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just('a'),
            Just('Z'),
            Just(' '),
            Just('\n'),
            Just('é'),
            Just('ß'),
            Just('日'),
            Just('🍎'),
            prop::char::range('a', 'z'),
        ],
        0..=max_chars,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn token_encoding_roundtrips(token in raw_token()) {
            let encoded = token.encode();
            let parsed = RawToken::parse(&encoded).unwrap();
            prop_assert_eq!(parsed.hash(), token.hash());

            // Padding is optional on the way in.
            let parsed = RawToken::parse(encoded.trim_end_matches('=')).unwrap();
            prop_assert_eq!(parsed.hash(), token.hash());
        }

        #[test]
        fn generated_emails_parse(raw in email()) {
            let parsed = EmailAddress::parse(&raw).unwrap();
            prop_assert_eq!(parsed.as_str(), raw.to_lowercase());
        }

        #[test]
        fn test_cipher_roundtrips_text(key in derived_key(), text in diary_text(200)) {
            use diaryshare_search::DiaryCipher;
            use crate::fixtures::TestCipher;

            let content_key = TestCipher::content_key_for(&key);
            let sealed = TestCipher::encrypt_text(&text, &content_key);
            prop_assert_eq!(TestCipher.decrypt_text(&sealed, &content_key).unwrap(), text);
        }

        #[test]
        fn codes_are_six_digits(c in code()) {
            prop_assert_eq!(c.len(), 6);
            prop_assert!(c.chars().all(|ch| ch.is_ascii_digit()));
        }
    }
}
