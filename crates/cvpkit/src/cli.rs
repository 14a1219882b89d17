//! Clap derive structures for the `cvpkit` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// cvpkit -- automation for Arista CloudVision Portal
#[derive(Debug, Parser)]
#[command(
    name = "cvpkit",
    version,
    about = "Automate Arista CloudVision Portal from the command line",
    long_about = "Inventory, compliance, fabric and configlet automation for \
        Arista CloudVision Portal (CVP).\n\n\
        Talks to the CVP portal REST API and the Analytics Engine, and to \
        switches over SSH or eAPI for change-control checks.",
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
    /// CVP profile to use
    #[arg(long, short = 'p', env = "CVP_PROFILE", global = true)]
    pub profile: Option<String>,

    /// CVP server URL or host (overrides profile)
    #[arg(long, short = 'c', env = "CVP_SERVER", global = true)]
    pub server: Option<String>,

    /// CVP username (overrides profile)
    #[arg(long, short = 'u', env = "CVP_USERNAME", global = true)]
    pub username: Option<String>,

    /// CVP password; prefer the environment or the keyring
    #[arg(long, env = "CVP_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CVP_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "CVP_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (default: profile, then 30)
    #[arg(long, env = "CVP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
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
    /// YAML
    Yaml,
    /// Plain text, one record per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Per-port inventory from the Analytics Engine
    #[command(alias = "inv")]
    Inventory(InventoryArgs),

    /// Provisioned devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Compliance reports and the periodic watcher
    Compliance(ComplianceArgs),

    /// Spine/leaf fabric generation
    Fabric(FabricArgs),

    /// Configlet listing, sync, export parsing and rendering
    #[command(alias = "cfg")]
    Configlets(ConfigletsArgs),

    /// Container snapshots
    Snapshot(SnapshotArgs),

    /// Change-control checks run against switches
    Checks(ChecksArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Where reports go. With none selected, reports are printed.
#[derive(Debug, Args)]
pub struct SinkArgs {
    /// Print reports to stdout
    #[arg(long)]
    pub print: bool,

    /// Mail reports using the [mail] config section
    #[arg(long)]
    pub mail: bool,

    /// Send reports to syslog using the [syslog] config section
    #[arg(long)]
    pub syslog: bool,
}

/// Waiting for CVP to come up.
#[derive(Debug, Args)]
pub struct RetryArgs {
    /// Seconds between connection attempts while CVP is unreachable
    #[arg(long, default_value = "60")]
    pub retry_delay: u64,

    /// Give up after this many failed attempts (default: retry forever)
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  INVENTORY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct InventoryArgs {
    #[command(subcommand)]
    pub command: InventoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum InventoryCommand {
    /// One row per switch port with its neighbor, VLANs and description
    Ports {
        /// Include the interface IP address
        #[arg(long)]
        ip: bool,

        /// Only this switch (serial number as the Analytics Engine knows it)
        #[arg(long, short = 's')]
        switch: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List provisioned devices
    #[command(alias = "ls")]
    List {
        /// Run a compliance check per device
        #[arg(long)]
        compliance: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLIANCE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ComplianceArgs {
    #[command(subcommand)]
    pub command: ComplianceCommand,
}

#[derive(Debug, Subcommand)]
pub enum ComplianceCommand {
    /// Check every device once and report the non-compliant ones
    Report {
        #[command(flatten)]
        sinks: SinkArgs,
    },

    /// Check periodically, reporting status changes (Ctrl-C stops)
    Watch {
        #[command(flatten)]
        sinks: SinkArgs,

        /// Time between checks, in seconds or as a duration like "30m"
        #[arg(long, short = 'i', default_value = "3600")]
        interval: String,

        /// Seconds to wait after a failed cycle
        #[arg(long, default_value = "60")]
        retry_delay: u64,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FABRIC
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FabricArgs {
    #[command(subcommand)]
    pub command: FabricCommand,
}

#[derive(Debug, Subcommand)]
pub enum FabricCommand {
    /// Plan addressing, render configlets, and push them to CVP
    Build(Box<FabricBuildArgs>),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DeploymentArg {
    /// Head-end replication
    Her,
    /// CVX VXLAN control service
    Cvx,
    /// BGP EVPN
    Evpn,
}

#[derive(Debug, Args)]
pub struct FabricBuildArgs {
    /// Data center name, e.g. "dc1"
    #[arg(long, short = 'n')]
    pub name: String,

    /// Number of spines
    #[arg(long, default_value = "2")]
    pub spines: u32,

    /// Number of leafs
    #[arg(long, default_value = "4")]
    pub leafs: u32,

    /// Pair leafs into MLAG domains
    #[arg(long)]
    pub mlag: bool,

    /// Prefix of the MLAG peer-link /31
    #[arg(long, default_value = "10.255.255.")]
    pub mlag_network: String,

    /// The two peer-link interfaces, comma separated
    #[arg(long, value_delimiter = ',', default_value = "Ethernet47,Ethernet48")]
    pub mlag_trunk: Vec<String>,

    /// Default gateway for the management network
    #[arg(long)]
    pub gateway: String,

    /// Management network prefix, e.g. "192.168.0."
    #[arg(long)]
    pub mgmt_network: String,

    /// Management network mask length
    #[arg(long, default_value = "24")]
    pub mgmt_mask: u8,

    /// VTEP loopback prefix
    #[arg(long, default_value = "10.0.200.")]
    pub vtep_network: String,

    /// Router-ID loopback prefix
    #[arg(long, default_value = "10.0.250.")]
    pub loopback_network: String,

    /// Spine/leaf point-to-point prefix
    #[arg(long, default_value = "10.0.1.")]
    pub link_network: String,

    /// Overlay type
    #[arg(long, short = 'd', default_value = "her")]
    pub deployment: DeploymentArg,

    /// CVX server address (cvx deployments)
    #[arg(long)]
    pub cvx_server: Option<String>,

    /// Print the plan and configlets instead of pushing them
    #[arg(long)]
    pub dry_run: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIGLETS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigletsArgs {
    #[command(subcommand)]
    pub command: ConfigletsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigletsCommand {
    /// List configlets
    #[command(alias = "ls")]
    List,

    /// Show one configlet
    Get {
        /// Configlet name (exact)
        name: String,
    },

    /// Sync configlet files from a Git repository or directory into CVP
    Sync(SyncArgs),

    /// Write the builder scripts of a configlet-builder export to disk
    ExportParse {
        /// Exported zip file
        file: PathBuf,

        /// Directory for the scripts
        #[arg(long, short = 'd', default_value = ".")]
        out_dir: PathBuf,
    },

    /// Render a device configlet from CSV tables and a template
    Render(RenderArgs),
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Git repository to clone (default: [sync] repo)
    #[arg(long, conflicts_with = "dir")]
    pub repo: Option<String>,

    /// Branch to clone (default: [sync] branch)
    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    /// Use an existing checkout instead of cloning
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Configlet directory inside the repository (default: [sync] path)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// File names to skip (repeatable; default: [sync] ignore)
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Report what would change without touching CVP
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub retry: RetryArgs,
}

#[derive(Debug, Args)]
#[command(group(clap::ArgGroup::new("device").required(true).args(["serial", "mac"])))]
pub struct RenderArgs {
    /// Device serial number
    #[arg(long)]
    pub serial: Option<String>,

    /// Device system MAC, looked up in the CVP inventory
    #[arg(long)]
    pub mac: Option<String>,

    /// Directory with mgmt_applicator.csv, bgpfile.csv and loopback.csv
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Directory with sw_template.j2 and as_template.j2
    #[arg(long, default_value = ".")]
    pub template_dir: PathBuf,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SNAPSHOT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Capture a snapshot of every device in a container
    Capture {
        /// Container name (exact)
        #[arg(long)]
        container: String,

        /// Snapshot template name (exact)
        #[arg(long)]
        template: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CHECKS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ChecksArgs {
    #[command(subcommand)]
    pub command: ChecksCommand,
}

#[derive(Debug, Subcommand)]
pub enum ChecksCommand {
    /// Ping targets from each device over SSH
    Ping(PingCheckArgs),

    /// Fetch a web page from each device over SSH
    Page(PageCheckArgs),

    /// Confirm a switch model over eAPI
    SwitchType(SwitchTypeCheckArgs),
}

#[derive(Debug, Args)]
pub struct PingCheckArgs {
    /// Change-control action file (YAML with name and args)
    #[arg(long, short = 'f')]
    pub args_file: Option<PathBuf>,

    /// Devices to ping from, comma separated
    #[arg(long, value_delimiter = ',', required_unless_present = "args_file")]
    pub devices: Vec<String>,

    /// Addresses to ping, comma separated
    #[arg(long, value_delimiter = ',', required_unless_present = "args_file")]
    pub targets: Vec<String>,

    /// Percentage of replies a test needs
    #[arg(long, default_value = "100")]
    pub passmark: u32,

    /// Failed tests tolerated, exclusive
    #[arg(long, default_value = "1")]
    pub fail_count: u32,

    /// Echo requests per test
    #[arg(long, default_value = "5")]
    pub count: u32,

    /// Seconds per test
    #[arg(long, default_value = "5")]
    pub ping_timeout: u32,
}

#[derive(Debug, Args)]
pub struct PageCheckArgs {
    /// Change-control action file (YAML with name and args)
    #[arg(long, short = 'f')]
    pub args_file: Option<PathBuf>,

    /// Page to fetch
    #[arg(long, required_unless_present = "args_file")]
    pub url: Option<String>,

    /// Devices to fetch from, comma separated
    #[arg(long, value_delimiter = ',', required_unless_present = "args_file")]
    pub devices: Vec<String>,

    /// Failed devices tolerated, exclusive
    #[arg(long, default_value = "1")]
    pub fail_count: u32,

    /// Seconds per fetch
    #[arg(long, default_value = "1")]
    pub page_timeout: u32,
}

#[derive(Debug, Args)]
pub struct SwitchTypeCheckArgs {
    /// Change-control action file (YAML with name and args)
    #[arg(long, short = 'f')]
    pub args_file: Option<PathBuf>,

    /// Expected model, e.g. "vEOS" or "7050"
    #[arg(long, required_unless_present = "args_file")]
    pub switch_type: Option<String>,

    /// Switch to ask (host or address)
    #[arg(long)]
    pub device: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SecretScope {
    /// The profile's CVP password
    Profile,
    /// The SMTP relay password
    Mail,
    /// The device SSH password
    Ssh,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,

    /// Set a profile value
    Set {
        /// Key: server, username, api_prefix, insecure, timeout, ca_cert
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Which password
        #[arg(long, default_value = "profile")]
        scope: SecretScope,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
