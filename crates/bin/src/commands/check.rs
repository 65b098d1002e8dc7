//! Check command - evaluates one permission check against the store.

use rolegate::rbac::{PermissionResolver, PrincipalId};
use rolegate::store::GrantReader;
use serde_json::json;

use crate::backend::create_store;
use crate::cli::CheckArgs;
use crate::output::{OutputFormat, print_json};

/// Run the `check` command
///
/// Exits with status 1 when the check is denied, so it can gate scripts.
pub async fn run(
    args: &CheckArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = create_store(&args.backend_config).await?;

    let principal = match store.find_user(&args.principal).await? {
        Some(user) => user.id,
        None => PrincipalId::new(args.principal.as_str()),
    };

    let reader: std::sync::Arc<dyn GrantReader> = store.clone();
    let resolver = PermissionResolver::new(reader);
    let decision = resolver
        .resolve(principal.as_str(), &args.permission)
        .await?;
    let effective = resolver.effective_permissions(&principal).await?;

    match format {
        OutputFormat::Human => {
            if decision.authorized {
                println!("allowed: {} may {}", args.principal, args.permission);
            } else if let Some(reason) = decision.reason {
                println!("denied: {} ({reason})", args.permission);
            }
            if effective.roles.is_empty() {
                println!("roles: (none)");
            } else {
                let roles: Vec<String> = effective.roles.iter().map(|r| r.to_string()).collect();
                println!("roles: {}", roles.join(", "));
            }
        }
        OutputFormat::Json => print_json(&json!({
            "principal": principal,
            "permission": args.permission,
            "decision": decision,
            "roles": effective.roles,
        }))?,
    }

    if !decision.authorized {
        std::process::exit(1);
    }
    Ok(())
}
