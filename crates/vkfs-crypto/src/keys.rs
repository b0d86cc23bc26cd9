//! Master keys and RFC 3394 AES key wrapping

use aes_kw::{KekAes128, KekAes192, KekAes256};
use zeroize::Zeroize;

use crate::{CryptoError, CryptoResult, KEY_SIZE, SIV_KEY_SIZE, WRAP_OVERHEAD};

/// The two 256-bit vault master keys. Zeroized on drop.
#[derive(Clone)]
pub struct VaultKeys {
    encryption_master_key: [u8; KEY_SIZE],
    mac_master_key: [u8; KEY_SIZE],
}

impl VaultKeys {
    pub fn from_bytes(encryption_master_key: [u8; KEY_SIZE], mac_master_key: [u8; KEY_SIZE]) -> Self {
        Self {
            encryption_master_key,
            mac_master_key,
        }
    }

    pub fn encryption_master_key(&self) -> &[u8; KEY_SIZE] {
        &self.encryption_master_key
    }

    pub fn mac_master_key(&self) -> &[u8; KEY_SIZE] {
        &self.mac_master_key
    }

    /// `encryption_master_key || mac_master_key`, the AES-SIV key.
    ///
    /// The caller owns the returned buffer and should zeroize it.
    pub(crate) fn siv_key(&self) -> [u8; SIV_KEY_SIZE] {
        let mut key = [0u8; SIV_KEY_SIZE];
        key[..KEY_SIZE].copy_from_slice(&self.encryption_master_key);
        key[KEY_SIZE..].copy_from_slice(&self.mac_master_key);
        key
    }
}

impl Drop for VaultKeys {
    fn drop(&mut self) {
        self.encryption_master_key.zeroize();
        self.mac_master_key.zeroize();
    }
}

impl std::fmt::Debug for VaultKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKeys")
            .field("encryption_master_key", &"[REDACTED]")
            .field("mac_master_key", &"[REDACTED]")
            .finish()
    }
}

/// Deterministic, self-authenticating key wrap.
pub trait KeyWrap: Send + Sync {
    /// Wrap `key` under `kek`. `out` must be `key.len() + 8` bytes.
    fn wrap_key(&self, kek: &[u8], key: &[u8], out: &mut [u8]) -> CryptoResult<()>;

    /// Unwrap `wrapped` under `kek`. `out` must be `wrapped.len() - 8` bytes.
    ///
    /// An integrity mismatch is [`CryptoError::UnwrapIntegrity`]; `out` is
    /// zeroized in that case.
    fn unwrap_key(&self, kek: &[u8], wrapped: &[u8], out: &mut [u8]) -> CryptoResult<()>;
}

/// RFC 3394 AES key wrap (default IV) over AES-128/192/256, chosen by KEK length.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc3394KeyWrap;

const SEMIBLOCK: usize = 8;

enum AnyKek {
    Aes128(KekAes128),
    Aes192(KekAes192),
    Aes256(KekAes256),
}

impl AnyKek {
    fn new(kek: &[u8]) -> CryptoResult<Self> {
        match kek.len() {
            16 => {
                let mut bytes = <[u8; 16]>::try_from(kek).map_err(|_| invalid_kek_len(16))?;
                let kek = KekAes128::from(bytes);
                bytes.zeroize();
                Ok(Self::Aes128(kek))
            }
            24 => {
                let mut bytes = <[u8; 24]>::try_from(kek).map_err(|_| invalid_kek_len(24))?;
                let kek = KekAes192::from(bytes);
                bytes.zeroize();
                Ok(Self::Aes192(kek))
            }
            32 => {
                let mut bytes = <[u8; 32]>::try_from(kek).map_err(|_| invalid_kek_len(32))?;
                let kek = KekAes256::from(bytes);
                bytes.zeroize();
                Ok(Self::Aes256(kek))
            }
            n => Err(invalid_kek_len(n)),
        }
    }

    fn wrap(&self, key: &[u8], out: &mut [u8]) -> Result<(), aes_kw::Error> {
        match self {
            Self::Aes128(k) => k.wrap(key, out),
            Self::Aes192(k) => k.wrap(key, out),
            Self::Aes256(k) => k.wrap(key, out),
        }
    }

    fn unwrap(&self, wrapped: &[u8], out: &mut [u8]) -> Result<(), aes_kw::Error> {
        match self {
            Self::Aes128(k) => k.unwrap(wrapped, out),
            Self::Aes192(k) => k.unwrap(wrapped, out),
            Self::Aes256(k) => k.unwrap(wrapped, out),
        }
    }
}

impl KeyWrap for Rfc3394KeyWrap {
    fn wrap_key(&self, kek: &[u8], key: &[u8], out: &mut [u8]) -> CryptoResult<()> {
        if key.len() < 2 * SEMIBLOCK || key.len() % SEMIBLOCK != 0 {
            return Err(CryptoError::MalformedRecord(format!(
                "key to wrap must be a multiple of 8 bytes and at least 16, got {}",
                key.len()
            )));
        }
        check_output_len(out.len(), key.len() + WRAP_OVERHEAD)?;

        AnyKek::new(kek)?.wrap(key, out).map_err(wrap_err)
    }

    fn unwrap_key(&self, kek: &[u8], wrapped: &[u8], out: &mut [u8]) -> CryptoResult<()> {
        if wrapped.len() < 3 * SEMIBLOCK || wrapped.len() % SEMIBLOCK != 0 {
            return Err(CryptoError::MalformedRecord(format!(
                "wrapped key must be a multiple of 8 bytes and at least 24, got {}",
                wrapped.len()
            )));
        }
        check_output_len(out.len(), wrapped.len() - WRAP_OVERHEAD)?;

        AnyKek::new(kek)?.unwrap(wrapped, out).map_err(|e| {
            out.zeroize();
            wrap_err(e)
        })
    }
}

fn check_output_len(actual: usize, expected: usize) -> CryptoResult<()> {
    if actual != expected {
        return Err(CryptoError::MalformedRecord(format!(
            "key wrap output buffer is {actual} bytes, expected {expected}"
        )));
    }
    Ok(())
}

fn invalid_kek_len(len: usize) -> CryptoError {
    CryptoError::KeyDerivation(format!("KEK must be 16, 24 or 32 bytes, got {len}"))
}

fn wrap_err(e: aes_kw::Error) -> CryptoError {
    match e {
        aes_kw::Error::IntegrityCheckFailed => CryptoError::UnwrapIntegrity,
        other => CryptoError::MalformedRecord(format!("key wrap: {other}")),
    }
}
