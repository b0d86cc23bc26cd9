//! Key derivation: scrypt password → key-encryption key

use secrecy::{ExposeSecret, SecretSlice, SecretString};
use zeroize::Zeroize;

use crate::{CryptoError, CryptoResult};

/// scrypt parallelization; fixed by the key file format.
pub const SCRYPT_PARALLELISM: u32 = 1;

/// Default ceiling on scrypt working memory (1 GiB).
pub const DEFAULT_MAX_KDF_MEMORY: u64 = 1024 * 1024 * 1024;

/// A vault password as raw bytes.
///
/// Text passwords are used as their UTF-8 bytes, without normalisation.
pub struct Password(SecretSlice<u8>);

impl Password {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(SecretSlice::from(bytes))
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.0.expose_secret()
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self::from_bytes(s.into_bytes())
    }
}

impl From<&SecretString> for Password {
    fn from(s: &SecretString) -> Self {
        Self::from(s.expose_secret())
    }
}

impl From<Vec<u8>> for Password {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// A key-encryption key. Only lives for the duration of one unlock.
///
/// Zeroized on drop to prevent secrets lingering in memory.
pub struct Kek {
    bytes: Vec<u8>,
}

impl Kek {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for Kek {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for Kek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kek")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// scrypt cost parameters taken from a key record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptCost {
    /// N (must be a power of two)
    pub cost: u64,
    /// r
    pub block_size: u32,
}

impl ScryptCost {
    /// Bytes of working memory scrypt needs at this cost: `128 * N * r * 2`.
    pub fn required_memory(&self) -> Option<u64> {
        128u64
            .checked_mul(self.cost)?
            .checked_mul(u64::from(self.block_size))?
            .checked_mul(2)
    }
}

/// Resource bounds for the KDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfLimits {
    pub max_memory_bytes: u64,
}

impl Default for KdfLimits {
    fn default() -> Self {
        Self {
            max_memory_bytes: DEFAULT_MAX_KDF_MEMORY,
        }
    }
}

impl From<&vkfs_core::CryptoConfig> for KdfLimits {
    fn from(config: &vkfs_core::CryptoConfig) -> Self {
        Self {
            max_memory_bytes: config.max_kdf_memory_bytes(),
        }
    }
}

/// Password-based KDF producing a KEK of a requested length.
pub trait PasswordKdf: Send + Sync {
    fn derive_kek(
        &self,
        password: &Password,
        salt: &[u8],
        cost: ScryptCost,
        kek_len: usize,
    ) -> CryptoResult<Kek>;
}

/// scrypt (RFC 7914) with p = 1 and a memory ceiling.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScryptKdf {
    limits: KdfLimits,
}

impl ScryptKdf {
    pub fn new(limits: KdfLimits) -> Self {
        Self { limits }
    }
}

impl PasswordKdf for ScryptKdf {
    fn derive_kek(
        &self,
        password: &Password,
        salt: &[u8],
        cost: ScryptCost,
        kek_len: usize,
    ) -> CryptoResult<Kek> {
        if cost.cost < 2 || !cost.cost.is_power_of_two() {
            return Err(CryptoError::KeyDerivation(format!(
                "scrypt N = {} is not a power of two greater than 1",
                cost.cost
            )));
        }

        let required = cost.required_memory().ok_or_else(|| {
            CryptoError::KeyDerivation("scrypt memory requirement overflows".into())
        })?;
        if required > self.limits.max_memory_bytes {
            return Err(CryptoError::KeyDerivation(format!(
                "scrypt needs {required} bytes at N={} r={}, ceiling is {} bytes",
                cost.cost, cost.block_size, self.limits.max_memory_bytes
            )));
        }

        let log_n = cost.cost.trailing_zeros() as u8;
        let params = scrypt::Params::new(log_n, cost.block_size, SCRYPT_PARALLELISM, kek_len)
            .map_err(|e| CryptoError::KeyDerivation(format!("invalid scrypt params: {e}")))?;

        tracing::debug!(
            n = cost.cost,
            r = cost.block_size,
            kek_len,
            required_memory = required,
            "deriving key-encryption key"
        );

        let mut kek = vec![0u8; kek_len];
        scrypt::scrypt(password.expose(), salt, &params, &mut kek)
            .map_err(|e| CryptoError::KeyDerivation(format!("scrypt failed: {e}")))?;

        Ok(Kek::from_bytes(kek))
    }
}
