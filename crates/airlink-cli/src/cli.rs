//! Clap derive structures for the `airlink` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// airlink -- Wi-Fi station management from the command line
#[derive(Debug, Parser)]
#[command(
    name = "airlink",
    version,
    about = "Manage the Wi-Fi station from the command line",
    long_about = "Diagnostic front end for the airlink Wi-Fi client stack.\n\n\
        Runs against the built-in simulator backend, so every command\n\
        works on a desk with no radio hardware attached.",
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
    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AIRLINK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show radio and link status
    Status,

    /// Scan and list found access points
    Scan(ScanArgs),

    /// Connect to a network
    Connect(ConnectArgs),

    /// Disconnect from the current network
    Disconnect,

    /// Watch state-change notifications as they arrive
    Monitor(MonitorArgs),
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Leave the radio off instead of activating it first
    #[arg(long)]
    pub no_activate: bool,
}

#[derive(Debug, Args)]
pub struct ConnectArgs {
    /// Network name
    pub essid: String,

    /// Pin the connection to a specific access point
    #[arg(long)]
    pub bssid: Option<String>,

    /// WPA passphrase
    #[arg(long, env = "AIRLINK_PASSPHRASE", hide_env = true)]
    pub passphrase: Option<String>,

    /// Pair via WPS instead of a stored passphrase
    #[arg(long, value_enum)]
    pub wps: Option<WpsArg>,

    /// WPS PIN (required with --wps pin)
    #[arg(long)]
    pub pin: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WpsArg {
    /// Push-button configuration
    Pbc,
    /// 8-digit PIN entry
    Pin,
}

#[derive(Debug, Args)]
pub struct MonitorArgs {
    /// Play a scripted demo sequence against the simulator while
    /// watching
    #[arg(long)]
    pub demo: bool,

    /// Stop after this many seconds
    #[arg(long, default_value_t = 10)]
    pub duration_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_parses() {
        Cli::try_parse_from(["airlink", "status"]).expect("status");
        Cli::try_parse_from(["airlink", "scan", "--no-activate"]).expect("scan");
        Cli::try_parse_from(["airlink", "connect", "corp-main", "--passphrase", "hunter2"])
            .expect("connect");
        Cli::try_parse_from([
            "airlink", "connect", "corp-main", "--wps", "pin", "--pin", "12345670",
        ])
        .expect("connect wps");
        Cli::try_parse_from(["airlink", "disconnect", "-o", "json"]).expect("disconnect");
        Cli::try_parse_from(["airlink", "monitor", "--demo", "--duration-secs", "3"])
            .expect("monitor");
    }

    #[test]
    fn bare_invocation_is_an_error() {
        assert!(Cli::try_parse_from(["airlink"]).is_err());
    }
}
