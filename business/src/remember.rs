//! "Remember me" persistence of the last email.
//!
//! The only thing the login core ever persists is one email string under
//! [`REMEMBERED_EMAIL_KEY`]. Where it lives is up to the host, which provides
//! a [`KeyValueStore`].

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::Result;
use crate::validation::is_valid_email;

pub const REMEMBERED_EMAIL_KEY: &str = "keyhole.remembered_email";

/// Host-provided durable string storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Volatile store, for tests and hosts without durable storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// What [`RememberedEmail::sync`] did to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RememberChange {
    Saved,
    Cleared,
    Unchanged,
}

#[derive(Debug)]
pub struct RememberedEmail<S> {
    store: S,
}

impl<S: KeyValueStore> RememberedEmail<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Reads the stored email at startup. A value that is no longer a valid
    /// email is ignored.
    pub fn load(&self) -> Result<Option<String>> {
        let stored = self.store.get(REMEMBERED_EMAIL_KEY)?;
        Ok(stored.filter(|email| {
            let valid = is_valid_email(email);
            if !valid {
                warn!("RememberedEmail: ignoring malformed stored email");
            }
            valid
        }))
    }

    /// Brings storage in line with the form's remember-me preference.
    ///
    /// With the preference on, a syntactically valid email is written and an
    /// invalid one leaves storage as it was. With the preference off, the key
    /// is cleared.
    pub fn sync(&mut self, remember_me: bool, email: &str) -> Result<RememberChange> {
        if !remember_me {
            self.store.remove(REMEMBERED_EMAIL_KEY)?;
            debug!("RememberedEmail: cleared");
            return Ok(RememberChange::Cleared);
        }

        let email = email.trim();
        if !is_valid_email(email) {
            debug!("RememberedEmail: not saving invalid email");
            return Ok(RememberChange::Unchanged);
        }

        self.store.set(REMEMBERED_EMAIL_KEY, email)?;
        debug!("RememberedEmail: saved");
        Ok(RememberChange::Saved)
    }

    pub fn forget(&mut self) -> Result<()> {
        self.store.remove(REMEMBERED_EMAIL_KEY)
    }
}
