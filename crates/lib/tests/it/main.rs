/*! Integration tests for Rolegate.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - rbac: Permission resolution against a real store
 * - store: RoleStore behavior shared by every backend, plus persistence
 * - gate: The request gate driven through an axum router
 * - auth: Sessions and login
 * - api: The administration API end to end
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("rolegate=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod api;
mod gate;
mod helpers;
mod rbac;
mod store;
