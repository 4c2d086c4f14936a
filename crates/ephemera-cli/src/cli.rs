use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Output format for CLI commands
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    #[allow(dead_code)]
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

#[derive(Parser)]
#[command(name = "ephemera")]
#[command(version, about = "Ephemera - Expiring secrets, users and rate limits on Redis")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.config/ephemera/config.toml)
    #[arg(long, global = true, env = "EPHEMERA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

/// Overrides for the `[redis]` section of the config file
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Redis host
    #[arg(long = "redis-host", global = true, env = "EPHEMERA_REDIS_HOST")]
    pub host: Option<String>,

    /// Redis port
    #[arg(long = "redis-port", global = true, env = "EPHEMERA_REDIS_PORT")]
    pub port: Option<u16>,

    /// Connect over TLS (true/false)
    #[arg(long = "redis-tls", global = true, env = "EPHEMERA_REDIS_TLS")]
    pub tls: Option<bool>,

    /// Redis ACL user
    #[arg(long = "redis-user", global = true, env = "EPHEMERA_REDIS_USER")]
    pub user: Option<String>,

    /// Redis password
    #[arg(
        long = "redis-password",
        global = true,
        env = "EPHEMERA_REDIS_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the Redis server answers PING
    Ping,

    /// Secret management
    Secret {
        #[command(subcommand)]
        command: SecretCommands,
    },

    /// User management
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Rate limiting
    RateLimit {
        #[command(subcommand)]
        command: RateLimitCommands,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SecretCommands {
    /// Store a new secret
    Create {
        /// Secret ID (a random UUID when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Secret payload
        #[arg(long)]
        secret: String,

        /// Password gating access to the secret
        #[arg(long)]
        password: Option<String>,

        /// Lifetime in seconds; invalid values fall back to one day
        #[arg(long)]
        ttl: Option<String>,
    },

    /// Show a secret
    Get { id: String },

    /// Delete a secret
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user, or replace it and issue a new token
    Create {
        username: String,

        #[arg(long)]
        password: String,
    },

    /// Show a user
    Get { username: String },

    /// Delete a user
    Delete { username: String },
}

#[derive(Subcommand)]
pub enum RateLimitCommands {
    /// Count one request from a client and report the decision
    Check { client: String },
}
