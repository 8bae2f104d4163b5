//! The fixed table of demo accounts credentials are checked against.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ustr::Ustr;

/// One demo account, as listed in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoAccount {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DemoAccount {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Accounts available when no directory is configured.
pub fn builtin_accounts() -> Vec<DemoAccount> {
    vec![
        DemoAccount::new("demo@keyhole.dev", "Demo1234!").with_name("Demo User"),
        DemoAccount::new("admin@keyhole.dev", "Adm1n-Secret").with_name("Administrator"),
        DemoAccount::new("jane.doe@example.com", "correct horse battery staple")
            .with_name("Jane Doe"),
    ]
}

/// Read-only lookup from lower-cased email to expected password.
#[derive(Debug, Default, Clone)]
pub struct CredentialDirectory {
    entries: HashMap<Ustr, DemoAccount>,
}

impl CredentialDirectory {
    pub fn new(accounts: impl IntoIterator<Item = DemoAccount>) -> Self {
        let entries = accounts
            .into_iter()
            .map(|account| (Ustr::from(&normalize_email(&account.email)), account))
            .collect();
        Self { entries }
    }

    /// Directory populated with [`builtin_accounts`].
    pub fn builtin() -> Self {
        Self::new(builtin_accounts())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks a credential pair.
    ///
    /// The email is matched case-insensitively; the password must match
    /// exactly.
    pub fn verify(&self, email: &str, password: &str) -> bool {
        self.lookup(email)
            .is_some_and(|account| account.password == password)
    }

    /// Finds the account for an email, ignoring case.
    pub fn lookup(&self, email: &str) -> Option<&DemoAccount> {
        // An email nobody registered was never interned, so this avoids
        // growing the interner with arbitrary user input.
        let key = Ustr::from_existing(&normalize_email(email))?;
        self.entries.get(&key)
    }

    /// Accounts sorted by normalized email.
    pub fn accounts(&self) -> Vec<&DemoAccount> {
        let mut accounts: Vec<_> = self.entries.iter().collect();
        accounts.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
        accounts.into_iter().map(|(_, account)| account).collect()
    }
}

/// Lower-cases an email for use as a lookup key.
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}
