//! Command implementations for the Keyhole CLI.
//!
//! Each subcommand is implemented in its own module.

pub mod accounts;
pub mod demo;
pub mod forget;
pub mod login;

pub use accounts::run_accounts;
pub use demo::run_demo;
pub use forget::run_forget;
pub use login::run_login;
