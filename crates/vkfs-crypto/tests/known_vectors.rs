//! Known-answer tests against reference vault material.
//!
//! The scrypt cost here is the production default (N = 2^15, r = 8), so these
//! are slower than the unit tests.

use vkfs_crypto::{
    derive_master_keys, verify_version_mac, CryptoError, FilenameCipher, KeyRecord, Password,
    SchemeVariant,
};

const WRAPPED_ZERO_KEY: &str = "bOuDTfSpTHJrM4G321gts1QL+TFAZ3I6S/QHwim39pz+t+/K9IYy6g==";

fn reference_key_file() -> String {
    format!(
        r#"{{
            "version": 3,
            "scryptSalt": "AAAAAAAAAAA=",
            "scryptCostParam": 32768,
            "scryptBlockSize": 8,
            "primaryMasterKey": "{WRAPPED_ZERO_KEY}",
            "hmacMasterKey": "{WRAPPED_ZERO_KEY}",
            "versionMac": "iUmRRHITuyJsJbVNqGNw+82YQ4A3Rma7j/y1v0DCVLA="
        }}"#
    )
}

#[test]
fn reference_vault_unlocks_to_zero_keys() {
    let record = KeyRecord::from_json(&reference_key_file()).expect("valid key file");
    let keys = derive_master_keys(&record, &Password::from("asd")).expect("unlock");

    assert_eq!(keys.encryption_master_key(), &[0u8; 32]);
    assert_eq!(keys.mac_master_key(), &[0u8; 32]);
    verify_version_mac(&keys, &record).expect("version MAC matches");
}

#[test]
fn reference_vault_rejects_wrong_password() {
    let record = KeyRecord::from_json(&reference_key_file()).unwrap();
    let result = derive_master_keys(&record, &Password::from("asdf"));
    assert!(matches!(result, Err(CryptoError::UnwrapIntegrity)));
}

#[test]
fn reference_vault_with_legacy_kek_fails_integrity() {
    let record = KeyRecord::from_json(&reference_key_file()).unwrap();
    let result = vkfs_crypto::MasterKeyUnwrapper::with_limits(Default::default())
        .derive_master_keys_with(&record, &Password::from("asd"), SchemeVariant::Legacy);
    assert!(matches!(result, Err(CryptoError::UnwrapIntegrity)));
}

#[test]
fn reference_vault_names_roundtrip() {
    let record = KeyRecord::from_json(&reference_key_file()).unwrap();
    let keys = derive_master_keys(&record, &Password::from("asd")).unwrap();
    let cipher = FilenameCipher::new(&keys, record.scheme_variant().unwrap());

    let encrypted = cipher.encrypt_name(b"notes.md", b"").unwrap();
    assert_eq!(encrypted, "F4PCDUOXTMMGLM2RH2QTKSEMZ5P5EVSAJR7XR7I");
    assert_eq!(cipher.decrypt_name(&encrypted, b"").unwrap(), b"notes.md");
}

/// Decrypts a name from a real vault.
///
/// Needs the vault's key file, so it only runs when pointed at one:
///
/// ```text
/// VKFS_E2E_KEY_FILE=test-vault/masterkey.json \
/// VKFS_E2E_PLAINTEXT=<recorded entry name> \
///     cargo test -p vkfs-crypto -- --ignored
/// ```
#[test]
#[ignore = "requires VKFS_E2E_KEY_FILE and VKFS_E2E_PLAINTEXT"]
fn real_vault_root_entry_decrypts() {
    let key_file = std::env::var("VKFS_E2E_KEY_FILE").expect("VKFS_E2E_KEY_FILE");
    let expected = std::env::var("VKFS_E2E_PLAINTEXT").expect("VKFS_E2E_PLAINTEXT");

    let json = std::fs::read_to_string(key_file).unwrap();
    let record = KeyRecord::from_json(&json).unwrap();
    let keys = derive_master_keys(&record, &Password::from("testpassword123")).unwrap();
    let cipher = FilenameCipher::new(&keys, record.scheme_variant().unwrap());

    let name = cipher
        .decrypt_name("4SNFVJAW3FPDXMTAJNRMWX67FWHWT36VFOGMJMMCPPVGKEEJMEUJNOI", b"")
        .unwrap();
    assert_eq!(name, expected.as_bytes());
}
