//! Forget the remembered email command.

use std::path::Path;

use anyhow::{Context as _, Result};
use keyhole_business::{KeyValueStore, REMEMBERED_EMAIL_KEY, RememberedEmail};
use tracing::{info, instrument};

use crate::config::FileStore;
use crate::output::Output;

/// Clears the remembered email and returns what was stored, if anything.
fn forget<S: KeyValueStore>(remembered: &mut RememberedEmail<S>) -> Result<Option<String>> {
    let previous = remembered
        .store()
        .get(REMEMBERED_EMAIL_KEY)
        .context("Failed to read remembered email")?;
    if previous.is_some() {
        remembered
            .forget()
            .context("Failed to clear remembered email")?;
    }
    Ok(previous)
}

#[instrument(skip_all, name = "forget")]
pub fn run_forget(config_path: &Path) -> Result<()> {
    let out = Output::new();
    let mut remembered = RememberedEmail::new(FileStore::open(config_path)?);

    match forget(&mut remembered)? {
        Some(email) => {
            info!("Cleared remembered email");
            out.success(format!("Forgot {email}"));
        }
        None => out.dim("No email is remembered."),
    }
    Ok(())
}
