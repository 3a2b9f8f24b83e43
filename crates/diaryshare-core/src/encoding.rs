//! Base64 engines shared across the workspace.

use base64::alphabet;
use base64::engine::general_purpose;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// URL-safe alphabet, padded on encode, padding optional on decode.
///
/// Used for raw tokens and token hashes.
pub const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// URL-safe alphabet without padding, used for session credential segments.
pub const CREDENTIAL_ENGINE: GeneralPurpose = general_purpose::URL_SAFE_NO_PAD;
