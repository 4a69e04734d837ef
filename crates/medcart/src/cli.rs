//! Clap derive structures for the `medcart` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use medcart_core::{OrderStatus, Role};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// medcart -- browse and manage the medcart pharmacy storefront
#[derive(Debug, Parser)]
#[command(
    name = "medcart",
    version,
    about = "Browse and manage the medcart pharmacy storefront",
    long_about = "Command-line front end for the medcart storefront backend.\n\n\
        Reads go through a stale-while-revalidate cache, writes revalidate\n\
        the collections they touch, and form input is validated locally\n\
        before anything is sent.",
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
    /// Backend profile to use
    #[arg(long, short = 'p', env = "MEDCART_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend base URL (overrides profile)
    #[arg(long, short = 'u', env = "MEDCART_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Bearer token (overrides keyring and profile)
    #[arg(long, env = "MEDCART_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MEDCART_OUTPUT",
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

    /// Accept invalid TLS certificates (local backends)
    #[arg(long, short = 'k', env = "MEDCART_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "MEDCART_TIMEOUT", global = true)]
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
    /// Plain text, one value per line (scripting)
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
    /// Browse and manage products
    #[command(alias = "prod", alias = "p")]
    Products(ProductsArgs),

    /// Browse and manage categories
    #[command(alias = "cat")]
    Categories(CategoriesArgs),

    /// Browse and manage pharmacies
    #[command(alias = "ph")]
    Pharmacies(PharmaciesArgs),

    /// Browse orders and move them through their lifecycle
    Orders(OrdersArgs),

    /// Follow a resource and print every new value
    Watch(WatchArgs),

    /// Sign in and keep the token in the system keyring
    Login(LoginArgs),

    /// Forget the stored token for the active profile
    Logout,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Products ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub command: ProductsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProductsCommand {
    /// List products
    #[command(alias = "ls")]
    List(PageArgs),

    /// Show one product
    Get {
        /// Product ID
        id: u64,
    },

    /// Create a product
    Create(ProductFields),

    /// Update a product
    Update {
        /// Product ID
        id: u64,
        #[command(flatten)]
        fields: ProductFields,
    },

    /// Delete a product
    #[command(alias = "rm")]
    Delete {
        /// Product ID
        id: u64,
    },
}

#[derive(Debug, Args)]
pub struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Only products in this category
    #[arg(long)]
    pub category: Option<u64>,
}

/// Raw product form fields, validated before sending.
#[derive(Debug, Args)]
pub struct ProductFields {
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Price in rupiah
    #[arg(long, default_value = "")]
    pub price: String,
    #[arg(long, default_value = "")]
    pub stock: String,
    /// Category ID
    #[arg(long, default_value = "")]
    pub category: String,
    /// Product is only sold against a prescription
    #[arg(long)]
    pub prescription: bool,
}

// ── Categories ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    pub command: CategoriesCommand,
}

#[derive(Debug, Subcommand)]
pub enum CategoriesCommand {
    /// List categories
    #[command(alias = "ls")]
    List,

    /// Create a category
    Create {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        image_url: Option<String>,
    },

    /// Delete a category
    #[command(alias = "rm")]
    Delete {
        /// Category ID
        id: u64,
    },
}

// ── Pharmacies ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PharmaciesArgs {
    #[command(subcommand)]
    pub command: PharmaciesCommand,
}

#[derive(Debug, Subcommand)]
pub enum PharmaciesCommand {
    /// List pharmacies
    #[command(alias = "ls")]
    List {
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Show one pharmacy
    Get {
        /// Pharmacy ID
        id: u64,
    },

    /// Create a pharmacy; unfinished input is kept as a draft
    Create(PharmacyFields),
}

#[derive(Debug, Args)]
pub struct PharmacyFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub pharmacist_name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// e.g. "08:00-21:00"
    #[arg(long)]
    pub operational_hours: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub latitude: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub longitude: Option<String>,
    /// Discard any saved draft before applying these fields
    #[arg(long)]
    pub fresh: bool,
}

// ── Orders ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: OrdersCommand,
}

#[derive(Debug, Subcommand)]
pub enum OrdersCommand {
    /// List orders
    #[command(alias = "ls")]
    List {
        /// Only orders in this status (e.g. waiting_confirmation)
        #[arg(long)]
        status: Option<OrderStatus>,
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Show one order
    Get {
        /// Order ID
        id: u64,
    },

    /// Move an order to a new status
    SetStatus {
        /// Order ID
        id: u64,
        /// New status (e.g. processed, shipped)
        status: OrderStatus,
    },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Resource key, e.g. "/v1/users?page=1"
    pub key: String,

    /// Refresh interval (e.g. "3s", "1m")
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub every: Duration,

    /// Stop after this many values
    #[arg(long)]
    pub count: Option<usize>,
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    let every = humantime::parse_duration(raw).map_err(|e| e.to_string())?;
    if every.is_zero() {
        return Err("interval must be greater than zero".into());
    }
    Ok(every)
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(long, default_value = "")]
    pub email: String,

    /// Account kind (user, doctor, pharmacy_admin, admin)
    #[arg(long, default_value = "user")]
    pub role: Role,

    /// Read the password from this environment variable instead of prompting
    #[arg(long)]
    pub password_env: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive profile setup
    Init,

    /// Show the loaded configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Key (base_url, token_env, insecure, timeout, ca_cert, drafts_dir, ...)
        key: String,
        value: String,
    },

    /// List profiles
    Profiles,

    /// Make a profile the default
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
