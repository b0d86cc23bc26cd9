//! Vault unlock: password + key record → master keys

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::kdf::{KdfLimits, Password, PasswordKdf, ScryptCost, ScryptKdf};
use crate::keys::{KeyWrap, Rfc3394KeyWrap, VaultKeys};
use crate::{CryptoError, CryptoResult, KeyRecord, SchemeVariant, KEY_SIZE, VERSION_MAC_SIZE};

/// Derives the KEK and unwraps both master keys.
///
/// The KDF and key-wrap implementations are injected so callers can swap
/// in instrumented or reduced-cost providers without global state.
#[derive(Debug, Clone, Default)]
pub struct MasterKeyUnwrapper<K = ScryptKdf, W = Rfc3394KeyWrap> {
    kdf: K,
    wrap: W,
}

impl MasterKeyUnwrapper {
    /// Default providers with a custom scrypt memory ceiling.
    pub fn with_limits(limits: KdfLimits) -> Self {
        Self::new(ScryptKdf::new(limits), Rfc3394KeyWrap)
    }
}

impl<K: PasswordKdf, W: KeyWrap> MasterKeyUnwrapper<K, W> {
    pub fn new(kdf: K, wrap: W) -> Self {
        Self { kdf, wrap }
    }

    /// Unlock with the scheme implied by the record's format version.
    pub fn derive_master_keys(&self, record: &KeyRecord, password: &Password) -> CryptoResult<VaultKeys> {
        let variant = record.scheme_variant()?;
        self.derive_master_keys_with(record, password, variant)
    }

    /// Unlock with an explicitly chosen scheme.
    pub fn derive_master_keys_with(
        &self,
        record: &KeyRecord,
        password: &Password,
        variant: SchemeVariant,
    ) -> CryptoResult<VaultKeys> {
        let cost = ScryptCost {
            cost: record.kdf_cost(),
            block_size: record.kdf_block_size(),
        };
        tracing::debug!(
            version = record.format_version(),
            variant = %variant,
            "unlocking vault master keys"
        );

        let kek = self
            .kdf
            .derive_kek(password, record.kdf_salt(), cost, variant.kek_len())?;

        let mut encryption_master_key = [0u8; KEY_SIZE];
        let mut mac_master_key = [0u8; KEY_SIZE];

        let unwrapped = self
            .wrap
            .unwrap_key(kek.as_bytes(), record.wrapped_encryption_key(), &mut encryption_master_key)
            .and_then(|()| {
                self.wrap
                    .unwrap_key(kek.as_bytes(), record.wrapped_mac_key(), &mut mac_master_key)
            });

        if let Err(e) = unwrapped {
            encryption_master_key.zeroize();
            mac_master_key.zeroize();
            tracing::debug!(error = %e, "master key unwrap failed");
            return Err(e);
        }

        let keys = VaultKeys::from_bytes(encryption_master_key, mac_master_key);
        encryption_master_key.zeroize();
        mac_master_key.zeroize();
        Ok(keys)
    }
}

#[cfg(feature = "tokio")]
impl<K, W> MasterKeyUnwrapper<K, W>
where
    K: PasswordKdf + Clone + 'static,
    W: KeyWrap + Clone + 'static,
{
    /// Run [`Self::derive_master_keys_with`] on tokio's blocking pool.
    ///
    /// scrypt occupies a thread for its full cost; this keeps it off the
    /// async executor. The derivation is not cancellable once started.
    pub async fn derive_master_keys_async(
        &self,
        record: KeyRecord,
        password: Password,
        variant: SchemeVariant,
    ) -> CryptoResult<VaultKeys> {
        let unwrapper = self.clone();
        tokio::task::spawn_blocking(move || {
            unwrapper.derive_master_keys_with(&record, &password, variant)
        })
        .await
        .map_err(|e| CryptoError::KeyDerivation(format!("KDF task did not complete: {e}")))?
    }
}

/// Unlock with default providers and limits.
pub fn derive_master_keys(record: &KeyRecord, password: &Password) -> CryptoResult<VaultKeys> {
    MasterKeyUnwrapper::with_limits(KdfLimits::default()).derive_master_keys(record, password)
}

/// Check the key file's version MAC: `HMAC-SHA256(mac_master_key, version as u32 BE)`.
///
/// Detects a key file whose `version` field was edited to force a different
/// scheme.
pub fn verify_version_mac(keys: &VaultKeys, record: &KeyRecord) -> CryptoResult<()> {
    version_hmac(keys, record.format_version())?
        .verify_slice(record.integrity_mac())
        .map_err(|_| CryptoError::VersionMacMismatch)
}

/// Compute the version MAC for a format version.
pub fn version_mac(keys: &VaultKeys, format_version: u32) -> CryptoResult<[u8; VERSION_MAC_SIZE]> {
    Ok(version_hmac(keys, format_version)?.finalize().into_bytes().into())
}

fn version_hmac(keys: &VaultKeys, format_version: u32) -> CryptoResult<Hmac<Sha256>> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(keys.mac_master_key())
        .map_err(|_| CryptoError::VersionMacMismatch)?;
    mac.update(&format_version.to_be_bytes());
    Ok(mac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WRAPPED_KEY_SIZE;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const FAST_COST: u64 = 1024;

    /// Build a key record for `password` with cheap scrypt parameters.
    fn make_record(password: &str, keys: &VaultKeys, version: u32) -> KeyRecord {
        let variant = SchemeVariant::from_format_version(version).unwrap();
        let salt = b"saltsalt".to_vec();
        let kek = ScryptKdf::default()
            .derive_kek(
                &Password::from(password),
                &salt,
                ScryptCost {
                    cost: FAST_COST,
                    block_size: 8,
                },
                variant.kek_len(),
            )
            .unwrap();

        let mut wrapped_enc = [0u8; WRAPPED_KEY_SIZE];
        let mut wrapped_mac = [0u8; WRAPPED_KEY_SIZE];
        Rfc3394KeyWrap
            .wrap_key(kek.as_bytes(), keys.encryption_master_key(), &mut wrapped_enc)
            .unwrap();
        Rfc3394KeyWrap
            .wrap_key(kek.as_bytes(), keys.mac_master_key(), &mut wrapped_mac)
            .unwrap();

        KeyRecord::new(
            salt,
            FAST_COST,
            8,
            wrapped_enc,
            wrapped_mac,
            version_mac(keys, version).unwrap(),
            version,
        )
        .unwrap()
    }

    fn sample_keys() -> VaultKeys {
        VaultKeys::from_bytes([0x3Cu8; KEY_SIZE], [0xC3u8; KEY_SIZE])
    }

    #[test]
    fn test_unlock_standard_scheme() {
        let keys = sample_keys();
        let record = make_record("correct horse", &keys, 999);

        let unlocked = derive_master_keys(&record, &Password::from("correct horse")).unwrap();
        assert_eq!(unlocked.encryption_master_key(), keys.encryption_master_key());
        assert_eq!(unlocked.mac_master_key(), keys.mac_master_key());
    }

    #[test]
    fn test_unlock_legacy_scheme() {
        let keys = sample_keys();
        let record = make_record("correct horse", &keys, 2);

        let unlocked = derive_master_keys(&record, &Password::from("correct horse")).unwrap();
        assert_eq!(unlocked.mac_master_key(), keys.mac_master_key());

        // The legacy record does not open as a standard one
        let result = MasterKeyUnwrapper::with_limits(KdfLimits::default()).derive_master_keys_with(
            &record,
            &Password::from("correct horse"),
            SchemeVariant::Standard,
        );
        assert!(matches!(result, Err(CryptoError::UnwrapIntegrity)));
    }

    #[test]
    fn test_wrong_password_is_integrity_error() {
        let record = make_record("correct horse", &sample_keys(), 7);
        let result = derive_master_keys(&record, &Password::from("battery staple"));
        assert!(matches!(result, Err(CryptoError::UnwrapIntegrity)));
    }

    #[test]
    fn test_corrupted_mac_key_detected() {
        let record = make_record("pw", &sample_keys(), 7);
        let mut file = record.to_key_file();
        let mut wrapped = crate::encoding::decode_field("hmacMasterKey", &file.hmac_master_key).unwrap();
        wrapped[20] ^= 0x80;
        file.hmac_master_key = crate::encoding::encode_field(&wrapped);
        let tampered = KeyRecord::try_from(file).unwrap();

        let result = derive_master_keys(&tampered, &Password::from("pw"));
        assert!(matches!(result, Err(CryptoError::UnwrapIntegrity)));
    }

    #[test]
    fn test_memory_ceiling_fails_fast() {
        let record = make_record("pw", &sample_keys(), 7);
        let unwrapper = MasterKeyUnwrapper::with_limits(KdfLimits {
            max_memory_bytes: 1024,
        });
        let result = unwrapper.derive_master_keys(&record, &Password::from("pw"));
        assert!(matches!(result, Err(CryptoError::KeyDerivation(_))));
    }

    #[test]
    fn test_error_messages_carry_no_secrets() {
        let record = make_record("pw", &sample_keys(), 7);
        let err = derive_master_keys(&record, &Password::from("s3cr3t-pa55")).unwrap_err();
        let msg = err.to_string();
        assert!(!msg.contains("s3cr3t-pa55"));
        assert_eq!(msg, "key unwrap failed: wrong password or corrupted key file");
    }

    #[test]
    fn test_version_mac_verifies() {
        let keys = sample_keys();
        let record = make_record("pw", &keys, 7);
        verify_version_mac(&keys, &record).unwrap();
    }

    #[test]
    fn test_version_mac_known_value() {
        // versionMac of the all-zero-key reference vault at version 3
        let zero = VaultKeys::from_bytes([0u8; KEY_SIZE], [0u8; KEY_SIZE]);
        let expected: [u8; VERSION_MAC_SIZE] = crate::encoding::decode_fixed(
            "versionMac",
            "iUmRRHITuyJsJbVNqGNw+82YQ4A3Rma7j/y1v0DCVLA=",
        )
        .unwrap();
        assert_eq!(version_mac(&zero, 3).unwrap(), expected);
    }

    #[test]
    fn test_edited_version_detected() {
        let keys = sample_keys();
        let record = make_record("pw", &keys, 7);
        let mut file = record.to_key_file();
        file.version = 2;
        let edited = KeyRecord::try_from(file).unwrap();

        assert_eq!(
            verify_version_mac(&keys, &edited),
            Err(CryptoError::VersionMacMismatch)
        );
    }

    /// Records the KEK length requested and delegates to scrypt.
    #[derive(Clone, Default)]
    struct RecordingKdf {
        calls: Arc<AtomicUsize>,
        last_len: Arc<AtomicUsize>,
    }

    impl PasswordKdf for RecordingKdf {
        fn derive_kek(
            &self,
            password: &Password,
            salt: &[u8],
            cost: ScryptCost,
            kek_len: usize,
        ) -> CryptoResult<crate::Kek> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_len.store(kek_len, Ordering::SeqCst);
            ScryptKdf::default().derive_kek(password, salt, cost, kek_len)
        }
    }

    #[test]
    fn test_injected_kdf_sees_variant_length() {
        let kdf = RecordingKdf::default();
        let unwrapper = MasterKeyUnwrapper::new(kdf.clone(), Rfc3394KeyWrap);

        let record = make_record("pw", &sample_keys(), 1);
        unwrapper.derive_master_keys(&record, &Password::from("pw")).unwrap();

        assert_eq!(kdf.calls.load(Ordering::SeqCst), 1);
        assert_eq!(kdf.last_len.load(Ordering::SeqCst), 16);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn test_async_unlock() {
        let keys = sample_keys();
        let record = make_record("pw", &keys, 999);

        let unlocked = MasterKeyUnwrapper::with_limits(KdfLimits::default())
            .derive_master_keys_async(record, Password::from("pw"), SchemeVariant::Standard)
            .await
            .unwrap();
        assert_eq!(unlocked.encryption_master_key(), keys.encryption_master_key());
    }
}
