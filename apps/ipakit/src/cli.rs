//! Command line interface definition

use clap::{Args, Parser, Subcommand, ValueEnum};
use ipakit_types::{ColorChoice, DeviceFamily};
use std::path::PathBuf;

/// ipakit - App Store package retrieval tool
#[derive(Parser)]
#[command(name = "ipakit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Download and patch iOS app packages from the App Store")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output format for command results
    #[arg(long, global = true, value_enum)]
    pub format: Option<FormatArg>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Never prompt; fail when interactive input would be needed
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Output format accepted by `--format`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Human readable output
    Text,
    /// One JSON object per command
    Json,
}

/// Store front arguments shared by the catalog-backed commands
#[derive(Args)]
pub struct CatalogArgs {
    /// Two-letter country code of the store front
    #[arg(short, long, value_name = "CC")]
    pub country: Option<String>,

    /// Device family for catalog queries
    #[arg(short, long, value_enum)]
    pub device_family: Option<DeviceFamily>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Manage the App Store session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Search the catalog for apps
    Search {
        /// Search term
        term: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 5)]
        limit: u32,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Look up one app by bundle identifier
    Lookup {
        /// Bundle identifier of the target app
        bundle_id: String,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Obtain a license for a zero-cost app
    Purchase {
        /// Bundle identifier of the target app
        bundle_id: String,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Download a signed package and patch it for installation
    #[command(alias = "dl")]
    Download {
        /// Bundle identifier of the target app
        bundle_id: String,

        /// Destination path of the downloaded package
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Acquire a license if needed (free items only)
        #[arg(long)]
        purchase: bool,

        #[command(flatten)]
        catalog: CatalogArgs,
    },
}

/// Session subcommands
#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in and store the session in the credential store
    Login {
        /// Apple ID email address
        #[arg(short, long, env = "IPAKIT_EMAIL")]
        email: String,

        /// Apple ID password (prompted when omitted)
        #[arg(short, long, env = "IPAKIT_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// 2FA verification code
        #[arg(long, env = "IPAKIT_AUTH_CODE")]
        auth_code: Option<String>,
    },

    /// Show the stored session
    Info,

    /// Delete the stored session
    Revoke,
}

impl Commands {
    /// Command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Auth { .. } => "auth",
            Commands::Search { .. } => "search",
            Commands::Lookup { .. } => "lookup",
            Commands::Purchase { .. } => "purchase",
            Commands::Download { .. } => "download",
        }
    }
}
