use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "keyhole")]
#[command(about = "Terminal front end for the Keyhole login demo", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "KEYHOLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in interactively (the default)
    Login {
        /// Pre-fill the email prompt
        #[arg(long, short = 'e')]
        email: Option<String>,

        /// Start with the password visible while typing
        #[arg(long)]
        show_password: bool,
    },
    /// List the demo accounts the directory accepts
    Accounts {
        /// Print passwords instead of masking them
        #[arg(long)]
        show_passwords: bool,
    },
    /// Clear the remembered email
    Forget,
    /// Replay the lockout scenario against a simulated clock
    Demo,
}

impl Default for Commands {
    fn default() -> Self {
        Self::Login {
            email: None,
            show_password: false,
        }
    }
}
