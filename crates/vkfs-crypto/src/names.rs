//! AES-SIV filename encryption
//!
//! Deterministic encryption (same name + same parent directory + key = same
//! ciphertext) is required for filenames: the vault looks entries up by their
//! encrypted name, so there is no room to store a nonce. AES-SIV provides this
//! with authentication (SIV = Synthetic Initialization Vector).
//!
//! The parent directory id is bound as associated data, so a ciphertext name
//! copied into another directory no longer opens.

use aes_siv::{aead::generic_array::GenericArray, siv::Aes256Siv, KeyInit};
use zeroize::Zeroize;

use crate::encoding::{decode_name, encode_name};
use crate::{CryptoError, CryptoResult, SchemeVariant, VaultKeys, SIV_KEY_SIZE};

/// Deterministic AEAD over a list of associated-data elements.
pub trait SivAead: Send + Sync {
    /// Returns `tag || ciphertext`.
    fn seal(
        &self,
        key: &[u8; SIV_KEY_SIZE],
        associated_data: &[&[u8]],
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>>;

    /// Fails with [`CryptoError::NameAuthentication`] on any tag mismatch.
    fn open(
        &self,
        key: &[u8; SIV_KEY_SIZE],
        associated_data: &[&[u8]],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>>;
}

/// RFC 5297 AES-SIV with two 256-bit sub-keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesSiv;

impl SivAead for AesSiv {
    fn seal(
        &self,
        key: &[u8; SIV_KEY_SIZE],
        associated_data: &[&[u8]],
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let mut cipher = Aes256Siv::new(GenericArray::from_slice(key));
        // Only fails when the header count exceeds the S2V limit (126)
        cipher
            .encrypt(associated_data, plaintext)
            .map_err(|e| CryptoError::NameSeal(e.to_string()))
    }

    fn open(
        &self,
        key: &[u8; SIV_KEY_SIZE],
        associated_data: &[&[u8]],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let mut cipher = Aes256Siv::new(GenericArray::from_slice(key));
        cipher
            .decrypt(associated_data, ciphertext)
            .map_err(|_| CryptoError::NameAuthentication)
    }
}

/// Filename encryptor/decryptor bound to one vault's master keys.
///
/// Immutable after construction; share it freely across threads.
pub struct FilenameCipher<A: SivAead = AesSiv> {
    key: [u8; SIV_KEY_SIZE],
    variant: SchemeVariant,
    aead: A,
}

impl FilenameCipher<AesSiv> {
    pub fn new(keys: &VaultKeys, variant: SchemeVariant) -> Self {
        Self::with_aead(keys, variant, AesSiv)
    }
}

impl<A: SivAead> FilenameCipher<A> {
    pub fn with_aead(keys: &VaultKeys, variant: SchemeVariant, aead: A) -> Self {
        Self {
            key: keys.siv_key(),
            variant,
            aead,
        }
    }

    /// Encrypt a cleartext entry name under its parent directory id.
    ///
    /// The empty directory id denotes the vault root.
    pub fn encrypt_name(&self, plaintext: &[u8], parent_dir_id: &[u8]) -> CryptoResult<String> {
        let sealed = self.aead.seal(&self.key, &[parent_dir_id], plaintext)?;
        Ok(encode_name(&sealed, self.variant))
    }

    /// Decrypt a ciphertext entry name produced by [`Self::encrypt_name`].
    pub fn decrypt_name(&self, ciphertext: &str, parent_dir_id: &[u8]) -> CryptoResult<Vec<u8>> {
        let sealed = decode_name(ciphertext)?;
        self.aead.open(&self.key, &[parent_dir_id], &sealed)
    }
}

impl<A: SivAead> Drop for FilenameCipher<A> {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl<A: SivAead> std::fmt::Debug for FilenameCipher<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilenameCipher")
            .field("key", &"[REDACTED]")
            .field("variant", &self.variant)
            .finish()
    }
}

/// Encrypt one name without keeping a [`FilenameCipher`] around.
pub fn encrypt_name(
    keys: &VaultKeys,
    variant: SchemeVariant,
    plaintext: &[u8],
    parent_dir_id: &[u8],
) -> CryptoResult<String> {
    FilenameCipher::new(keys, variant).encrypt_name(plaintext, parent_dir_id)
}

/// Decrypt one name without keeping a [`FilenameCipher`] around.
pub fn decrypt_name(
    keys: &VaultKeys,
    variant: SchemeVariant,
    ciphertext: &str,
    parent_dir_id: &[u8],
) -> CryptoResult<Vec<u8>> {
    FilenameCipher::new(keys, variant).decrypt_name(ciphertext, parent_dir_id)
}
