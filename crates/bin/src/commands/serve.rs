//! Serve command - runs the Rolegate API server.

use std::time::Duration;

use tokio::signal::unix::{SignalKind, signal};

use rolegate::api::{AppState, backend_name, router};
use rolegate::auth::{SessionStore, hash_password};
use rolegate::rbac::RoleName;
use rolegate::store::{RoleStore, seed_defaults};

use crate::backend::{create_store, persist};
use crate::cli::ServeArgs;

/// How often expired sessions are dropped.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Create the bootstrap admin account if it does not exist yet.
async fn ensure_admin(
    store: &dyn RoleStore,
    username: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if store.find_user(username).await?.is_some() {
        tracing::debug!(username, "Bootstrap admin already exists");
        return Ok(());
    }

    let admin = RoleName::admin();
    if !store.list_roles().await?.iter().any(|r| r.name == admin) {
        store.create_role(&admin, "Full access").await?;
    }

    let user = store.create_user(username, &hash_password(password)?).await?;
    store.assign_role(&user.id, &admin).await?;
    tracing::info!(username, principal = %user.id, "Created bootstrap admin user");
    Ok(())
}

/// Run the Rolegate server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = create_store(&args.backend_config).await?;

    if !args.no_seed {
        seed_defaults(store.as_ref()).await?;
    }
    if let (Some(username), Some(password)) = (&args.admin_user, &args.admin_password) {
        ensure_admin(store.as_ref(), username, password).await?;
    }

    let sessions = SessionStore::new(Duration::from_secs(args.session_ttl));
    let store_timeout = args.store_timeout_ms.map(Duration::from_millis);
    let state = AppState::new(store.clone(), sessions.clone(), store_timeout);
    let app = router(state);

    // Periodically drop expired sessions
    let purge_sessions = sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = purge_sessions.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "Purged expired sessions");
            }
        }
    });

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        %local_addr,
        backend = backend_name(store.as_ref()),
        "Rolegate server started"
    );
    println!("Rolegate API listening on http://{local_addr}");
    println!();
    println!("Available endpoints:");
    println!("  GET  /health                 - Health check");
    println!("  POST /api/auth/login         - Obtain a session token");
    println!("  POST /api/auth/logout        - End the current session");
    println!("  GET  /api/auth/me            - Roles and permissions of the caller");
    println!("  /api/roles, /api/permissions, /api/users - Administration");
    println!();
    println!("Press Ctrl+C to shutdown");

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
                _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
            }
        })
        .await?;

    // Save store on shutdown (only needed for the in-memory backend)
    if let Err(e) = persist(store.as_ref(), &args.backend_config).await {
        tracing::error!("Failed to save store: {e}");
        eprintln!("Failed to save store: {e}");
    }

    println!("Server shut down");
    Ok(())
}
