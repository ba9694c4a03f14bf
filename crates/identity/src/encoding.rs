use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::{IdentityError, IdentityResult};

/// URL-safe decoder that tolerates missing padding and stray trailing bits.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode base64url text. Stations emit both alphabets, so `+` and `/` are
/// folded into their URL-safe counterparts first.
pub(crate) fn decode_b64url(field: &'static str, text: &str) -> IdentityResult<Vec<u8>> {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    URL_SAFE_LENIENT
        .decode(normalized)
        .map_err(|e| IdentityError::decode(field, e))
}

/// Decode a fixed-width hex field.
pub(crate) fn decode_hex_exact<const N: usize>(
    field: &'static str,
    text: &str,
) -> IdentityResult<[u8; N]> {
    let mut out = [0u8; N];
    hex::decode_to_slice(text, &mut out).map_err(|e| IdentityError::decode(field, e))?;
    Ok(out)
}
