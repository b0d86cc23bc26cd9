//! Vault key file: JSON schema and the validated key record

use serde::{Deserialize, Serialize};

use crate::encoding::{decode_field, decode_fixed, encode_field};
use crate::{CryptoError, CryptoResult, SchemeVariant, VERSION_MAC_SIZE, WRAPPED_KEY_SIZE};

/// On-disk key file, field for field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFile {
    pub version: u32,
    pub scrypt_salt: String,
    pub scrypt_cost_param: u64,
    pub scrypt_block_size: u32,
    pub primary_master_key: String,
    pub hmac_master_key: String,
    pub version_mac: String,
}

/// A decoded and validated key record.
///
/// Construction checks every field, so holding a `KeyRecord` means the
/// cryptographic steps can run without further input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    kdf_salt: Vec<u8>,
    kdf_cost: u64,
    kdf_block_size: u32,
    wrapped_encryption_key: [u8; WRAPPED_KEY_SIZE],
    wrapped_mac_key: [u8; WRAPPED_KEY_SIZE],
    integrity_mac: [u8; VERSION_MAC_SIZE],
    format_version: u32,
}

impl KeyRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kdf_salt: Vec<u8>,
        kdf_cost: u64,
        kdf_block_size: u32,
        wrapped_encryption_key: [u8; WRAPPED_KEY_SIZE],
        wrapped_mac_key: [u8; WRAPPED_KEY_SIZE],
        integrity_mac: [u8; VERSION_MAC_SIZE],
        format_version: u32,
    ) -> CryptoResult<Self> {
        if kdf_salt.is_empty() {
            return Err(CryptoError::MalformedRecord("scryptSalt: empty".into()));
        }
        if kdf_cost < 2 || !kdf_cost.is_power_of_two() {
            return Err(CryptoError::MalformedRecord(format!(
                "scryptCostParam: {kdf_cost} is not a power of two greater than 1"
            )));
        }
        if kdf_block_size == 0 {
            return Err(CryptoError::MalformedRecord(
                "scryptBlockSize: must be positive".into(),
            ));
        }
        if format_version == 0 {
            return Err(CryptoError::MalformedRecord("version: must be positive".into()));
        }

        Ok(Self {
            kdf_salt,
            kdf_cost,
            kdf_block_size,
            wrapped_encryption_key,
            wrapped_mac_key,
            integrity_mac,
            format_version,
        })
    }

    /// Parse and validate a key file's JSON text.
    pub fn from_json(json: &str) -> CryptoResult<Self> {
        let file: KeyFile = serde_json::from_str(json)
            .map_err(|e| CryptoError::MalformedRecord(format!("invalid key file JSON: {e}")))?;
        Self::try_from(&file)
    }

    /// Serialize back to the on-disk representation.
    pub fn to_key_file(&self) -> KeyFile {
        KeyFile {
            version: self.format_version,
            scrypt_salt: encode_field(&self.kdf_salt),
            scrypt_cost_param: self.kdf_cost,
            scrypt_block_size: self.kdf_block_size,
            primary_master_key: encode_field(&self.wrapped_encryption_key),
            hmac_master_key: encode_field(&self.wrapped_mac_key),
            version_mac: encode_field(&self.integrity_mac),
        }
    }

    pub fn kdf_salt(&self) -> &[u8] {
        &self.kdf_salt
    }

    /// scrypt N
    pub fn kdf_cost(&self) -> u64 {
        self.kdf_cost
    }

    /// scrypt r
    pub fn kdf_block_size(&self) -> u32 {
        self.kdf_block_size
    }

    pub fn wrapped_encryption_key(&self) -> &[u8; WRAPPED_KEY_SIZE] {
        &self.wrapped_encryption_key
    }

    pub fn wrapped_mac_key(&self) -> &[u8; WRAPPED_KEY_SIZE] {
        &self.wrapped_mac_key
    }

    pub fn integrity_mac(&self) -> &[u8; VERSION_MAC_SIZE] {
        &self.integrity_mac
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    pub fn scheme_variant(&self) -> CryptoResult<SchemeVariant> {
        SchemeVariant::from_format_version(self.format_version)
    }
}

impl TryFrom<&KeyFile> for KeyRecord {
    type Error = CryptoError;

    fn try_from(file: &KeyFile) -> CryptoResult<Self> {
        Self::new(
            decode_field("scryptSalt", &file.scrypt_salt)?,
            file.scrypt_cost_param,
            file.scrypt_block_size,
            decode_fixed("primaryMasterKey", &file.primary_master_key)?,
            decode_fixed("hmacMasterKey", &file.hmac_master_key)?,
            decode_fixed("versionMac", &file.version_mac)?,
            file.version,
        )
    }
}

impl TryFrom<KeyFile> for KeyRecord {
    type Error = CryptoError;

    fn try_from(file: KeyFile) -> CryptoResult<Self> {
        Self::try_from(&file)
    }
}
