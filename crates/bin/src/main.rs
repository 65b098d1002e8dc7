mod backend;
mod cli;
mod output;

mod commands {
    pub mod admin;
    pub mod check;
    pub mod health;
    pub mod serve;
}

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, PermissionsCommand, RolesCommand, UsersCommand};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so JSON output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rolegate=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let format = cli.format;
    let Some(command) = cli.command else {
        println!("No command given. Run `rolegate --help` for usage.");
        return Ok(());
    };

    match command {
        Commands::Serve(args) => commands::serve::run(&args).await,
        Commands::Health(args) => commands::health::run(&args).await,
        Commands::Seed(args) => commands::admin::seed(&args, format).await,
        Commands::Roles(command) => match command {
            RolesCommand::List(args) => commands::admin::list_roles(&args, format).await,
            RolesCommand::Create {
                name,
                description,
                backend_config,
            } => commands::admin::create_role(&backend_config, &name, &description).await,
            RolesCommand::Delete {
                name,
                backend_config,
            } => commands::admin::delete_role(&backend_config, &name).await,
            RolesCommand::Grant {
                role,
                permission,
                backend_config,
            } => commands::admin::grant(&backend_config, &role, &permission).await,
            RolesCommand::Revoke {
                role,
                permission,
                backend_config,
            } => commands::admin::revoke(&backend_config, &role, &permission).await,
        },
        Commands::Permissions(command) => match command {
            PermissionsCommand::List(args) => {
                commands::admin::list_permissions(&args, format).await
            }
            PermissionsCommand::Create {
                name,
                description,
                backend_config,
            } => commands::admin::create_permission(&backend_config, &name, &description).await,
        },
        Commands::Users(command) => match command {
            UsersCommand::List(args) => commands::admin::list_users(&args, format).await,
            UsersCommand::Create {
                username,
                password,
                backend_config,
            } => commands::admin::create_user(&backend_config, &username, &password).await,
            UsersCommand::Assign {
                username,
                role,
                backend_config,
            } => commands::admin::assign(&backend_config, &username, &role).await,
            UsersCommand::Unassign {
                username,
                role,
                backend_config,
            } => commands::admin::unassign(&backend_config, &username, &role).await,
        },
        Commands::Check(args) => commands::check::run(&args, format).await,
    }
}
