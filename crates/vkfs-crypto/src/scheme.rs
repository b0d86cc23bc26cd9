//! Scheme variants found in existing vaults
//!
//! Two incompatible generations of key files exist. They differ in the KEK
//! length handed to AES key wrap and in whether base-32 names carry `=`
//! padding. The variant is resolved once per key record and threaded through
//! every operation instead of being re-decided at each call site.

use vkfs_core::SchemePreference;

use crate::{CryptoError, CryptoResult};

/// First key file format version using the 256-bit KEK.
pub const FIRST_STANDARD_VERSION: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeVariant {
    /// AES-128 key wrap, padded base-32 names
    Legacy,
    /// AES-256 key wrap, unpadded base-32 names
    Standard,
}

impl SchemeVariant {
    /// Map a key file's `version` field to its scheme.
    pub fn from_format_version(version: u32) -> CryptoResult<Self> {
        match version {
            0 => Err(CryptoError::MalformedRecord(
                "format version must be at least 1".into(),
            )),
            v if v < FIRST_STANDARD_VERSION => Ok(Self::Legacy),
            _ => Ok(Self::Standard),
        }
    }

    /// Apply a configured preference, falling back to the format version on `Auto`.
    pub fn resolve(preference: SchemePreference, format_version: u32) -> CryptoResult<Self> {
        match preference {
            SchemePreference::Auto => Self::from_format_version(format_version),
            SchemePreference::Legacy => Ok(Self::Legacy),
            SchemePreference::Standard => Ok(Self::Standard),
        }
    }

    /// KEK length in bytes; also the scrypt output length.
    pub fn kek_len(self) -> usize {
        match self {
            Self::Legacy => 16,
            Self::Standard => 32,
        }
    }

    /// Whether emitted ciphertext names carry `=` padding.
    pub fn pads_names(self) -> bool {
        matches!(self, Self::Legacy)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Standard => "standard",
        }
    }
}

impl std::fmt::Display for SchemeVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
