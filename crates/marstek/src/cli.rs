//! Clap derive structures for the `marstek` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// marstek -- monitor Marstek home batteries from the command line
#[derive(Debug, Parser)]
#[command(
    name = "marstek",
    version,
    about = "Monitor Marstek home batteries via the vendor cloud",
    long_about = "Polls the Marstek Cloud API for battery telemetry.\n\n\
        The vendor endpoint is slow and rate limited, so all reads go\n\
        through a caching, circuit-breaking coordinator.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Marstek account email
    #[arg(long, short = 'e', env = "MARSTEK_EMAIL", global = true)]
    pub email: Option<String>,

    /// Vendor API base URL
    #[arg(long, env = "MARSTEK_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MARSTEK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch and display the current device list
    Devices(DevicesArgs),

    /// Poll continuously and stream updates
    Watch(WatchArgs),

    /// Manage the configuration file and stored credentials
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Bypass the cache and force a vendor call
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Base poll interval in seconds (10-3600)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the effective configuration (password redacted)
    Show,

    /// Write a starter config file
    Init {
        /// Marstek account email
        #[arg(long)]
        email: String,
    },

    /// Store the account password in the system keyring
    SetPassword {
        /// Account email the password belongs to
        #[arg(long)]
        email: Option<String>,

        /// Password value; read from MARSTEK_PASSWORD when omitted
        #[arg(long, env = "MARSTEK_PASSWORD", hide_env = true)]
        password: Option<String>,
    },
}
