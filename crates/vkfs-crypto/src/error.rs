use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Failures of the unlock and filename operations.
///
/// No variant carries key material, passwords or derived bytes. Messages
/// only describe lengths, parameters and field names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A key record field is missing, undecodable or has the wrong length.
    #[error("malformed key record: {0}")]
    MalformedRecord(String),

    /// scrypt could not run within the configured bounds.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// RFC 3394 integrity check failed: wrong password or corrupted key file.
    #[error("key unwrap failed: wrong password or corrupted key file")]
    UnwrapIntegrity,

    /// HMAC over the format version did not match the key file.
    #[error("version MAC mismatch: key file version field was altered")]
    VersionMacMismatch,

    /// AES-SIV open failed: wrong keys, wrong parent directory or tampered name.
    #[error("filename authentication failed")]
    NameAuthentication,

    /// AES-SIV refused to seal: more associated data elements than S2V allows.
    #[error("filename encryption failed: {0}")]
    NameSeal(String),

    /// Ciphertext name is not valid base-32.
    #[error("invalid base-32 name: {0}")]
    Encoding(String),
}
