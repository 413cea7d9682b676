//! Identity loading for the local long-lived key
//!
//! The CLI never stores keys. A secret is read per invocation from, in order:
//! - the key file given by `--identity-file` or `[identity] key_path`
//! - the `VEIL_SECRET_KEY` environment variable
//!
//! A key file holds the 64-character hex secret, optionally followed by a
//! newline.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use zeroize::Zeroizing;

use veil_crypto::{Identity, InvalidKeyError, PublicKey};

/// Environment variable holding a hex secret key
pub const SECRET_KEY_ENV: &str = "VEIL_SECRET_KEY";

/// Identity loading errors
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("No identity configured: pass --identity-file or set VEIL_SECRET_KEY")]
    NotConfigured,

    #[error("Failed to read key file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid key data: {0}")]
    InvalidKeyData(#[from] InvalidKeyError),
}

/// Where the identity was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    File(PathBuf),
    Env,
    Generated,
}

impl std::fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Env => write!(f, "${SECRET_KEY_ENV}"),
            Self::Generated => write!(f, "freshly generated"),
        }
    }
}

/// Identity information for display
#[derive(Debug, Clone, Serialize)]
pub struct IdentityInfo {
    /// x-only public key, hex
    pub public_key: String,
    pub source: String,
    /// Only populated right after generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

/// An identity plus where it came from
pub struct IdentityManager {
    identity: Identity,
    source: IdentitySource,
}

impl IdentityManager {
    /// Read the hex secret in `path`.
    pub fn load_file(path: &Path) -> Result<Self, IdentityError> {
        let contents = Zeroizing::new(fs::read_to_string(path).map_err(|source| IdentityError::Io {
            path: path.to_path_buf(),
            source,
        })?);
        let identity = Identity::from_hex(contents.trim())?;

        tracing::debug!(public_key = %identity.public_key(), path = %path.display(), "Loaded identity");

        Ok(Self {
            identity,
            source: IdentitySource::File(path.to_path_buf()),
        })
    }

    /// Parse a hex secret taken from the environment.
    pub fn from_env_value(value: &str) -> Result<Self, IdentityError> {
        Ok(Self {
            identity: Identity::from_hex(value)?,
            source: IdentitySource::Env,
        })
    }

    /// Key file if one is configured, else `VEIL_SECRET_KEY`.
    pub fn resolve(key_path: Option<&Path>) -> Result<Self, IdentityError> {
        if let Some(path) = key_path {
            return Self::load_file(path);
        }
        match std::env::var(SECRET_KEY_ENV) {
            Ok(value) => Self::from_env_value(&Zeroizing::new(value)),
            Err(_) => Err(IdentityError::NotConfigured),
        }
    }

    /// A new random identity, held in memory only.
    pub fn generate() -> Self {
        let identity = Identity::generate();
        tracing::info!(public_key = %identity.public_key(), "Generated new identity");
        Self {
            identity,
            source: IdentitySource::Generated,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn public_key(&self) -> &PublicKey {
        self.identity.public_key()
    }

    pub fn source(&self) -> &IdentitySource {
        &self.source
    }

    /// Public details; the secret is included only for a generated identity.
    pub fn display_info(&self) -> IdentityInfo {
        IdentityInfo {
            public_key: self.public_key().to_hex(),
            source: self.source.to_string(),
            secret_key: (self.source == IdentitySource::Generated)
                .then(|| self.identity.secret_hex().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alice.key");
        let generated = IdentityManager::generate();
        let secret = generated.display_info().secret_key.unwrap();
        std::fs::write(&path, format!("{secret}\n")).unwrap();

        let loaded = IdentityManager::load_file(&path).unwrap();
        assert_eq!(loaded.public_key(), generated.public_key());
        assert_eq!(loaded.source(), &IdentitySource::File(path));
        assert!(loaded.display_info().secret_key.is_none());
    }

    #[test]
    fn test_env_value() {
        let generated = IdentityManager::generate();
        let secret = generated.identity().secret_hex();

        let loaded = IdentityManager::from_env_value(&secret).unwrap();
        assert_eq!(loaded.public_key(), generated.public_key());
        assert_eq!(loaded.source(), &IdentitySource::Env);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            IdentityManager::load_file(&temp_dir.path().join("nope.key")),
            Err(IdentityError::Io { .. })
        ));
    }

    #[test]
    fn test_load_rejects_bad_key() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.key");
        std::fs::write(&path, "00").unwrap();

        assert!(matches!(
            IdentityManager::load_file(&path),
            Err(IdentityError::InvalidKeyData(InvalidKeyError::InvalidKeyLength { .. }))
        ));
    }

    #[test]
    fn test_generate_shows_secret_once() {
        let info = IdentityManager::generate().display_info();
        assert_eq!(info.public_key.len(), 64);
        assert_eq!(info.secret_key.map(|s| s.len()), Some(64));
    }
}
