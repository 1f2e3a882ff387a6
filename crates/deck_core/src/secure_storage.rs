use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use anyhow::{Context, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use std::fs;
use std::path::Path;

const NONCE_LEN: usize = 12;
const SALT_LEN: usize = 16;

/// File name of the persisted salt inside the dropdeck base directory.
pub const SALT_FILENAME: &str = "storage.salt";

/// Encrypts backend API keys before they touch disk.
///
/// The AES-256-GCM key is derived with Argon2id from the local user identity
/// and a random salt that is created once and then reused, so keys sealed in
/// one run can be opened in the next.
pub struct SecureStorage {
    cipher: Aes256Gcm,
}

impl SecureStorage {
    /// Open (or initialise) the storage whose salt lives at `salt_path`.
    pub fn with_salt_path(salt_path: &Path) -> Result<Self> {
        let salt = read_or_init_salt(salt_path)?;
        let secret = format!(
            "dropdeck-keys-v1:{}:{}",
            whoami::username(),
            dirs::home_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        );
        let key = derive(secret.as_bytes(), &salt)?;
        Ok(Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
        })
    }

    /// Seal `plaintext`, returning `hex(nonce || ciphertext)`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce: [u8; NONCE_LEN] = rand::random();
        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| anyhow::anyhow!("Encryption failed: {e}"))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(hex::encode(out))
    }

    /// Open a value produced by [`SecureStorage::encrypt`].
    pub fn decrypt(&self, sealed_hex: &str) -> Result<String> {
        let raw = hex::decode(sealed_hex).context("Sealed value is not hex")?;
        if raw.len() < NONCE_LEN {
            anyhow::bail!("Sealed value too short");
        }
        let (nonce, body) = raw.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|e| anyhow::anyhow!("Decryption failed: {e}"))?;
        String::from_utf8(plain).context("Decrypted value is not UTF-8")
    }
}

fn read_or_init_salt(path: &Path) -> Result<[u8; SALT_LEN]> {
    if let Ok(bytes) = fs::read(path) {
        if let Ok(salt) = <[u8; SALT_LEN]>::try_from(bytes.as_slice()) {
            return Ok(salt);
        }
    }

    let salt: [u8; SALT_LEN] = rand::random();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, salt)
        .with_context(|| format!("Failed to write salt file {}", path.display()))?;
    Ok(salt)
}

// Argon2id, m=19456 KiB, t=2, p=1.
fn derive(secret: &[u8], salt: &[u8; SALT_LEN]) -> Result<[u8; 32]> {
    let params = Params::new(19_456, 2, 1, Some(32))
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let mut key = [0u8; 32];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(secret, salt, &mut key)
        .map_err(|e| anyhow::anyhow!("Argon2 key derivation failed: {e}"))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> SecureStorage {
        SecureStorage::with_salt_path(&dir.path().join(SALT_FILENAME)).unwrap()
    }

    #[test]
    fn api_key_survives_seal_and_open() {
        let tmp = TempDir::new().unwrap();
        let s = storage(&tmp);
        let sealed = s.encrypt("admin-key-0001").unwrap();
        assert!(hex::decode(&sealed).is_ok());
        assert_eq!(s.decrypt(&sealed).unwrap(), "admin-key-0001");
    }

    #[test]
    fn nonces_differ_between_seals() {
        let tmp = TempDir::new().unwrap();
        let s = storage(&tmp);
        assert_ne!(s.encrypt("same").unwrap(), s.encrypt("same").unwrap());
    }

    #[test]
    fn garbage_input_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let s = storage(&tmp);
        assert!(s.decrypt("zz-not-hex").is_err());
        assert!(s.decrypt("aabb").is_err());

        let mut bytes = hex::decode(s.encrypt("secret").unwrap()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(s.decrypt(&hex::encode(bytes)).is_err());
    }

    #[test]
    fn salt_is_reused_across_opens() {
        let tmp = TempDir::new().unwrap();
        let sealed = storage(&tmp).encrypt("persisted").unwrap();
        assert_eq!(storage(&tmp).decrypt(&sealed).unwrap(), "persisted");
        assert_eq!(
            fs::read(tmp.path().join(SALT_FILENAME)).unwrap().len(),
            SALT_LEN
        );
    }

    #[test]
    fn short_salt_file_is_replaced() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join(SALT_FILENAME);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"short").unwrap();

        SecureStorage::with_salt_path(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), SALT_LEN);
    }

    #[test]
    fn separate_salts_cannot_cross_decrypt() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let sealed = storage(&a).encrypt("only a").unwrap();
        assert!(storage(&b).decrypt(&sealed).is_err());
    }
}
