#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

const VAULT_SCHEMA_VERSION: u8 = 1;
const MASTER_KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SecretId {
    GeminiApiKey,
}

impl SecretId {
    pub const ALL: [SecretId; 1] = [SecretId::GeminiApiKey];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GeminiApiKey => "gemini_api_key",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == raw.trim())
    }

    pub fn parse_strict(raw: &str) -> Result<Self, VaultError> {
        Self::parse(raw).ok_or_else(|| VaultError::UnknownSecretId(raw.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("unknown secret id: {0}")]
    UnknownSecretId(String),
    #[error("secret value must not be empty")]
    EmptySecret,
    #[error("unsupported vault schema version {0}")]
    SchemaVersion(u8),
    #[error("vault cryptographic operation failed")]
    Crypto,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("decode error: {0}")]
    Decode(#[from] base64::DecodeError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VaultDocument {
    schema_version: u8,
    entries: BTreeMap<String, SealedSecret>,
}

impl Default for VaultDocument {
    fn default() -> Self {
        Self {
            schema_version: VAULT_SCHEMA_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SealedSecret {
    nonce_b64: String,
    ciphertext_b64: String,
    updated_at_unix_ms: u64,
}

/// Secrets sealed with AES-256-GCM under a per-device master key kept in a
/// sibling file (mode 0600 on unix). The vault file only holds base64 nonces
/// and ciphertexts.
#[derive(Debug, Clone)]
pub struct DeviceVault {
    vault_path: PathBuf,
    key_path: PathBuf,
}

impl DeviceVault {
    /// `YTLEARN_DEVICE_VAULT_PATH`, else the per-user config directory.
    pub fn default_local() -> Self {
        let vault_path = env::var("YTLEARN_DEVICE_VAULT_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_vault_path);
        Self::at(vault_path)
    }

    /// Master key lives next to the vault as `<stem>.master.key`.
    pub fn at(vault_path: impl Into<PathBuf>) -> Self {
        let vault_path = vault_path.into();
        let mut key_path = vault_path.clone();
        key_path.set_extension("master.key");
        Self::for_paths(vault_path, key_path)
    }

    pub fn for_paths(vault_path: PathBuf, key_path: PathBuf) -> Self {
        Self {
            vault_path,
            key_path,
        }
    }

    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }

    pub fn set_secret(&self, id: SecretId, value: &str) -> Result<(), VaultError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(VaultError::EmptySecret);
        }
        let cipher = self.cipher()?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), value.as_bytes())
            .map_err(|_| VaultError::Crypto)?;

        let mut doc = self.read_document()?.unwrap_or_default();
        doc.entries.insert(
            id.as_str().to_string(),
            SealedSecret {
                nonce_b64: BASE64.encode(nonce_bytes),
                ciphertext_b64: BASE64.encode(ciphertext),
                updated_at_unix_ms: now_unix_ms(),
            },
        );
        self.write_document(&doc)
    }

    pub fn resolve_secret(&self, id: SecretId) -> Result<Option<String>, VaultError> {
        let Some(doc) = self.read_document()? else {
            return Ok(None);
        };
        let Some(sealed) = doc.entries.get(id.as_str()) else {
            return Ok(None);
        };
        let nonce = BASE64.decode(sealed.nonce_b64.as_bytes())?;
        if nonce.len() != NONCE_LEN {
            return Err(VaultError::Crypto);
        }
        let ciphertext = BASE64.decode(sealed.ciphertext_b64.as_bytes())?;
        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
            .map_err(|_| VaultError::Crypto)?;
        let secret = String::from_utf8(plaintext).map_err(|_| VaultError::Crypto)?;
        Ok(Some(secret).filter(|s| !s.trim().is_empty()))
    }

    pub fn has_secret(&self, id: SecretId) -> Result<bool, VaultError> {
        Ok(self.resolve_secret(id)?.is_some())
    }

    /// `Ok(false)` when nothing was stored under `id`.
    pub fn delete_secret(&self, id: SecretId) -> Result<bool, VaultError> {
        let Some(mut doc) = self.read_document()? else {
            return Ok(false);
        };
        if doc.entries.remove(id.as_str()).is_none() {
            return Ok(false);
        }
        self.write_document(&doc)?;
        Ok(true)
    }

    fn cipher(&self) -> Result<Aes256Gcm, VaultError> {
        let key = self.load_or_create_master_key()?;
        Aes256Gcm::new_from_slice(&key).map_err(|_| VaultError::Crypto)
    }

    fn read_document(&self) -> Result<Option<VaultDocument>, VaultError> {
        if !self.vault_path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.vault_path)?;
        if raw.trim().is_empty() {
            return Ok(Some(VaultDocument::default()));
        }
        let doc = serde_json::from_str::<VaultDocument>(&raw)?;
        if doc.schema_version != VAULT_SCHEMA_VERSION {
            return Err(VaultError::SchemaVersion(doc.schema_version));
        }
        Ok(Some(doc))
    }

    fn write_document(&self, doc: &VaultDocument) -> Result<(), VaultError> {
        ensure_parent_dir(&self.vault_path)?;
        atomic_write(&self.vault_path, &serde_json::to_vec_pretty(doc)?)
    }

    fn load_or_create_master_key(&self) -> Result<[u8; MASTER_KEY_LEN], VaultError> {
        let mut key = [0u8; MASTER_KEY_LEN];
        if self.key_path.exists() {
            let decoded = BASE64.decode(fs::read_to_string(&self.key_path)?.trim().as_bytes())?;
            if decoded.len() != MASTER_KEY_LEN {
                return Err(VaultError::Crypto);
            }
            key.copy_from_slice(&decoded);
            return Ok(key);
        }
        ensure_parent_dir(&self.key_path)?;
        OsRng.fill_bytes(&mut key);
        write_new_file_restricted(&self.key_path, BASE64.encode(key).as_bytes())?;
        Ok(key)
    }
}

/// Environment variable first, then the default local vault.
pub fn resolve_gemini_api_key() -> Option<String> {
    if let Some(key) = env::var("GEMINI_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
    {
        return Some(key);
    }
    match DeviceVault::default_local().resolve_secret(SecretId::GeminiApiKey) {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(error = %err, "device vault unreadable; no api key resolved");
            None
        }
    }
}

pub fn default_vault_path() -> PathBuf {
    if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg_config_home)
            .join("ytlearn")
            .join("device_vault.json");
    }
    if let Ok(home) = env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("ytlearn")
            .join("device_vault.json");
    }
    PathBuf::from(".ytlearn").join("device_vault.json")
}

fn ensure_parent_dir(path: &Path) -> Result<(), VaultError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(1)
        .max(1)
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), VaultError> {
    let mut tmp = path.to_path_buf();
    tmp.set_extension("tmp");
    fs::write(&tmp, data)?;
    fs::rename(tmp, path)?;
    Ok(())
}

fn write_new_file_restricted(path: &Path, data: &[u8]) -> Result<(), VaultError> {
    let mut file = OpenOptions::new().create_new(true).write(true).open(path)?;
    file.write_all(data)?;
    file.flush()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault_in(dir: &tempfile::TempDir) -> DeviceVault {
        DeviceVault::at(dir.path().join("nested").join("device_vault.json"))
    }

    #[test]
    fn at_vault_01_roundtrip_keeps_plaintext_out_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);
        let sentinel = "AIza-TOP-SECRET-SENTINEL";

        vault.set_secret(SecretId::GeminiApiKey, sentinel).unwrap();
        assert_eq!(
            vault.resolve_secret(SecretId::GeminiApiKey).unwrap().as_deref(),
            Some(sentinel)
        );
        let raw = fs::read_to_string(vault.vault_path()).unwrap();
        assert!(!raw.contains(sentinel));
        assert!(raw.contains("gemini_api_key"));
        assert!(dir.path().join("nested").join("device_vault.master.key").exists());
    }

    #[test]
    fn at_vault_02_has_and_delete_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);
        assert!(!vault.has_secret(SecretId::GeminiApiKey).unwrap());
        assert!(!vault.delete_secret(SecretId::GeminiApiKey).unwrap());
        vault.set_secret(SecretId::GeminiApiKey, "  k-1  ").unwrap();
        assert_eq!(
            vault.resolve_secret(SecretId::GeminiApiKey).unwrap().as_deref(),
            Some("k-1")
        );
        assert!(vault.delete_secret(SecretId::GeminiApiKey).unwrap());
        assert!(!vault.has_secret(SecretId::GeminiApiKey).unwrap());
    }

    #[test]
    fn at_vault_03_unknown_ids_and_blank_values_are_rejected() {
        assert_eq!(SecretId::parse(" gemini_api_key "), Some(SecretId::GeminiApiKey));
        assert_eq!(SecretId::parse("openai_api_key"), None);
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);
        assert!(matches!(
            vault.set_secret(SecretId::GeminiApiKey, "   "),
            Err(VaultError::EmptySecret)
        ));
        assert!(!vault.vault_path().exists());
    }

    #[test]
    fn at_vault_04_foreign_master_key_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);
        vault.set_secret(SecretId::GeminiApiKey, "secret").unwrap();
        let other_key = dir.path().join("other.master.key");
        let foreign = DeviceVault::for_paths(vault.vault_path().to_path_buf(), other_key);
        assert!(matches!(
            foreign.resolve_secret(SecretId::GeminiApiKey),
            Err(VaultError::Crypto)
        ));
    }
}
