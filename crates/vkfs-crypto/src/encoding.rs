//! Text encodings: base-32 ciphertext names and base64 key file fields

use base64::{engine::general_purpose::STANDARD, Engine};
use data_encoding::{BASE32, BASE32_NOPAD};

use crate::{CryptoError, CryptoResult, SchemeVariant};

/// Encode raw AES-SIV output as a filesystem-safe name.
///
/// RFC 4648 base-32 alphabet (`A-Z2-7`): no `/`, and no two symbols that
/// differ only by case.
pub fn encode_name(ciphertext: &[u8], variant: SchemeVariant) -> String {
    if variant.pads_names() {
        BASE32.encode(ciphertext)
    } else {
        BASE32_NOPAD.encode(ciphertext)
    }
}

/// Decode a ciphertext name produced by either scheme.
///
/// Trailing `=` padding is stripped first. Decoding is otherwise strict:
/// lowercase symbols and non-zero trailing bits are rejected so that an
/// altered name cannot decode to the same bytes.
pub fn decode_name(name: &str) -> CryptoResult<Vec<u8>> {
    let unpadded = name.trim_end_matches('=');
    BASE32_NOPAD
        .decode(unpadded.as_bytes())
        .map_err(|e| CryptoError::Encoding(e.to_string()))
}

/// Decode a base64 key file field that must have exactly `N` bytes.
pub fn decode_fixed<const N: usize>(field: &str, value: &str) -> CryptoResult<[u8; N]> {
    let bytes = decode_field(field, value)?;
    bytes.as_slice().try_into().map_err(|_| {
        CryptoError::MalformedRecord(format!(
            "{field}: expected {N} bytes, got {}",
            bytes.len()
        ))
    })
}

/// Decode a variable-length base64 key file field.
pub fn decode_field(field: &str, value: &str) -> CryptoResult<Vec<u8>> {
    STANDARD
        .decode(value.trim())
        .map_err(|e| CryptoError::MalformedRecord(format!("{field}: invalid base64: {e}")))
}

pub fn encode_field(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
