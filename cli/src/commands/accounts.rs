//! List demo accounts command.

use keyhole_business::{CredentialDirectory, DemoAccount};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::instrument;

use crate::output::Output;

const HIDDEN_PASSWORD: &str = "••••••••";

#[derive(Debug, Tabled)]
struct AccountRow {
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Password")]
    password: String,
}

impl AccountRow {
    fn new(account: &DemoAccount, show_password: bool) -> Self {
        Self {
            email: account.email.clone(),
            name: account.name.clone().unwrap_or_else(|| "-".to_owned()),
            password: if show_password {
                account.password.clone()
            } else {
                HIDDEN_PASSWORD.to_owned()
            },
        }
    }
}

fn rows(directory: &CredentialDirectory, show_passwords: bool) -> Vec<AccountRow> {
    directory
        .accounts()
        .into_iter()
        .map(|account| AccountRow::new(account, show_passwords))
        .collect()
}

#[instrument(skip_all, name = "accounts", fields(show_passwords))]
pub fn run_accounts(directory: &CredentialDirectory, show_passwords: bool) {
    let out = Output::new();

    if directory.is_empty() {
        out.dim("No accounts configured.");
        return;
    }

    let mut table = Table::new(rows(directory, show_passwords));
    table.with(Style::rounded());
    out.print(table);
    out.newline();
    out.dim(format!("{} account(s)", directory.len()));
    if !show_passwords {
        out.dim("Use --show-passwords to reveal the demo passwords.");
    }
}
