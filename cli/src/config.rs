//! Configuration file handling for the CLI.
//!
//! Everything lives in one TOML file, by default
//! `$XDG_CONFIG_HOME/keyhole/config.toml`:
//!
//! - `[login]`: overrides for the login core (lockout, latency, accounts)
//! - `[storage]`: the key/value entries the login form persists; today that
//!   is only the remembered email

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use keyhole_business::{Error as CoreError, KeyValueStore, LoginConfig};
use serde::{Deserialize, Serialize};

/// CLI configuration stored on disk
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub login: LoginConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub storage: BTreeMap<String, String>,
}

impl Config {
    /// `$XDG_CONFIG_HOME/keyhole/config.toml` on Linux, the platform
    /// equivalent elsewhere.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to determine config directory")?;
        Ok(config_dir.join("keyhole").join("config.toml"))
    }

    /// Returns the default configuration if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Creates the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

/// [`KeyValueStore`] backed by the `[storage]` table of the config file.
///
/// Every write rewrites the whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    config: Config,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = Config::load(&path)?;
        Ok(Self { path, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, key: &str) -> keyhole_business::Result<()> {
        self.config
            .save(&self.path)
            .map_err(|e| CoreError::storage(key, format!("{e:#}")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> keyhole_business::Result<Option<String>> {
        Ok(self.config.storage.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> keyhole_business::Result<()> {
        self.config.storage.insert(key.to_owned(), value.to_owned());
        self.persist(key)
    }

    fn remove(&mut self, key: &str) -> keyhole_business::Result<()> {
        if self.config.storage.remove(key).is_some() {
            self.persist(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use keyhole_business::{DemoAccount, REMEMBERED_EMAIL_KEY, RememberedEmail};

    use super::*;

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");

        let config = Config::load(&dir.path().join("absent.toml")).expect("load");

        assert_eq!(config.login, LoginConfig::default());
        assert!(config.storage.is_empty());
    }

    #[test]
    fn test_partial_login_section() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[login]
lockout_threshold = 3

[[login.accounts]]
email = "a@b.com"
password = "pw1"
"#,
        )
        .expect("write");

        let config = Config::load(&path).expect("load");

        assert_eq!(config.login.lockout_threshold, 3);
        assert_eq!(config.login.lockout_window_secs, 30);
        assert_eq!(
            config.login.accounts,
            vec![DemoAccount::new("a@b.com", "pw1")]
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "login = [").expect("write");

        let err = Config::load(&path).expect_err("malformed");

        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("keyhole").join("config.toml");

        Config::default().save(&path).expect("save");

        assert!(path.exists());
    }

    #[test]
    fn test_file_store_persists_remembered_email() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        let mut remembered = RememberedEmail::new(FileStore::open(&path).expect("open"));
        remembered.sync(true, "a@b.com").expect("sync");

        let reopened = FileStore::open(&path).expect("reopen");
        assert_eq!(
            reopened.get(REMEMBERED_EMAIL_KEY).expect("get").as_deref(),
            Some("a@b.com")
        );
        assert_eq!(
            RememberedEmail::new(reopened).load().expect("load").as_deref(),
            Some("a@b.com")
        );
    }

    #[test]
    fn test_file_store_remove_keeps_login_section() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[login]\nlockout_threshold = 2\n").expect("write");

        let mut store = FileStore::open(&path).expect("open");
        store.set(REMEMBERED_EMAIL_KEY, "a@b.com").expect("set");
        store.remove(REMEMBERED_EMAIL_KEY).expect("remove");

        let config = Config::load(&path).expect("load");
        assert!(config.storage.is_empty());
        assert_eq!(config.login.lockout_threshold, 2);
    }

    #[test]
    fn test_remove_missing_key_does_not_create_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        let mut store = FileStore::open(&path).expect("open");
        store.remove(REMEMBERED_EMAIL_KEY).expect("remove");

        assert!(!path.exists());
    }
}
