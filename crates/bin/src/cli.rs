//! CLI argument definitions for the Rolegate binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

/// Storage backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    /// SQLite database (default, production-ready)
    Sqlite,
    /// PostgreSQL database (for distributed deployments)
    Postgres,
    /// In-memory with JSON persistence (for development and ephemeral deployments)
    Inmemory,
}

/// Rolegate role-based access control server
#[derive(Parser, Debug)]
#[command(name = "rolegate")]
#[command(about = "Rolegate: role-based access control for business services")]
#[command(version)]
pub struct Cli {
    /// Output format for listing commands
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Rolegate API server
    Serve(ServeArgs),
    /// Check health of a running Rolegate server
    Health(HealthArgs),
    /// Create the default permissions and roles
    Seed(BackendArgs),
    /// Manage roles
    #[command(subcommand)]
    Roles(RolesCommand),
    /// Manage permissions
    #[command(subcommand)]
    Permissions(PermissionsCommand),
    /// Manage users
    #[command(subcommand)]
    Users(UsersCommand),
    /// Check whether a user holds a permission
    Check(CheckArgs),
}

/// Storage options shared by every command that opens the store
#[derive(clap::Args, Debug, Clone)]
pub struct BackendArgs {
    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "ROLEGATE_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores rolegate.db
    /// For InMemory: stores rolegate.json
    #[arg(short = 'D', long, env = "ROLEGATE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, env = "ROLEGATE_POSTGRES_URL")]
    pub postgres_url: Option<String>,
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "ROLEGATE_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "ROLEGATE_HOST")]
    pub host: String,

    #[command(flatten)]
    pub backend_config: BackendArgs,

    /// Session lifetime in seconds
    #[arg(long, default_value_t = rolegate::constants::DEFAULT_SESSION_TTL_SECS, env = "ROLEGATE_SESSION_TTL")]
    pub session_ttl: u64,

    /// Upper bound on each permission lookup, in milliseconds
    #[arg(long, env = "ROLEGATE_STORE_TIMEOUT_MS")]
    pub store_timeout_ms: Option<u64>,

    /// Skip creating the default permissions and roles on startup
    #[arg(long)]
    pub no_seed: bool,

    /// Username of an admin account to create on startup if missing
    #[arg(long, env = "ROLEGATE_ADMIN_USER", requires = "admin_password")]
    pub admin_user: Option<String>,

    /// Password for the bootstrap admin account
    #[arg(long, env = "ROLEGATE_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Base URL of the server to check
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum RolesCommand {
    /// List roles
    List(BackendArgs),
    /// Create a role
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[command(flatten)]
        backend_config: BackendArgs,
    },
    /// Delete a role along with its grants and assignments
    Delete {
        name: String,
        #[command(flatten)]
        backend_config: BackendArgs,
    },
    /// Grant a permission to a role
    Grant {
        role: String,
        permission: String,
        #[command(flatten)]
        backend_config: BackendArgs,
    },
    /// Revoke a permission from a role
    Revoke {
        role: String,
        permission: String,
        #[command(flatten)]
        backend_config: BackendArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum PermissionsCommand {
    /// List permissions
    List(BackendArgs),
    /// Create a custom permission
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[command(flatten)]
        backend_config: BackendArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List users and their roles
    List(BackendArgs),
    /// Create a user
    Create {
        username: String,
        #[arg(long, env = "ROLEGATE_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[command(flatten)]
        backend_config: BackendArgs,
    },
    /// Assign a role to a user
    Assign {
        username: String,
        role: String,
        #[command(flatten)]
        backend_config: BackendArgs,
    },
    /// Remove a role from a user
    Unassign {
        username: String,
        role: String,
        #[command(flatten)]
        backend_config: BackendArgs,
    },
}

/// Arguments for the check command
#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Username, or a raw principal id when no such user exists
    pub principal: String,
    /// Permission to check, e.g. `organization:read`
    pub permission: String,
    #[command(flatten)]
    pub backend_config: BackendArgs,
}
