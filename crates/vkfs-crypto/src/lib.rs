//! vkfs-crypto: client-side vault key and filename cryptography
//!
//! Unlock pipeline: key file → scrypt KEK → RFC 3394 unwrap → master keys
//!
//! Key hierarchy:
//! ```text
//! Password
//!   └── KEK = scrypt(password, salt, N, r, p=1)        (16 or 32 bytes, per scheme)
//!       ├── Encryption Master Key (256-bit, AES key wrap under KEK)
//!       └── MAC Master Key        (256-bit, AES key wrap under KEK)
//!           └── Filename AEAD: AES-SIV (key = enc || mac, AD = [parent dir id])
//! ```

pub mod encoding;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod names;
pub mod record;
pub mod scheme;
pub mod unlock;

pub use error::{CryptoError, CryptoResult};
pub use kdf::{KdfLimits, Kek, Password, PasswordKdf, ScryptCost, ScryptKdf};
pub use keys::{KeyWrap, Rfc3394KeyWrap, VaultKeys};
pub use names::{decrypt_name, encrypt_name, AesSiv, FilenameCipher, SivAead};
pub use record::{KeyFile, KeyRecord};
pub use scheme::SchemeVariant;
pub use unlock::{derive_master_keys, verify_version_mac, version_mac, MasterKeyUnwrapper};

/// Size of each master key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of the RFC 3394 integrity block prepended to a wrapped key
pub const WRAP_OVERHEAD: usize = 8;

/// Size of a wrapped master key as stored in the key file
pub const WRAPPED_KEY_SIZE: usize = KEY_SIZE + WRAP_OVERHEAD;

/// AES-SIV takes two 256-bit sub-keys
pub const SIV_KEY_SIZE: usize = 2 * KEY_SIZE;

/// Size of the AES-SIV synthetic tag
pub const TAG_SIZE: usize = 16;

/// Size of the key file's HMAC-SHA256 version MAC
pub const VERSION_MAC_SIZE: usize = 32;
