//! SQL-based store implementation.
//!
//! [`SqlStore`] keeps roles, permissions, users and their join rows in a
//! relational database through sqlx's `AnyPool`.
//!
//! ## Available Databases
//!
//! - **SQLite** (feature: `sqlite`): Embedded database
//! - **PostgreSQL** (feature: `postgres`): PostgreSQL database
//!
//! The schema is created on connect; see [`schema`] for the migration
//! mechanism.

/// Schema definition and migration system.
pub mod schema;

use std::any::Any;
use std::collections::BTreeMap;
#[cfg(feature = "postgres")]
use std::time::Duration;

use async_trait::async_trait;
use sqlx::AnyPool;
#[cfg(feature = "postgres")]
use sqlx::Executor;
use sqlx::any::AnyPoolOptions;

use crate::Result;
use crate::rbac::{Permission, PermissionName, PrincipalId, Role, RoleGrant, RoleName, User};
use crate::store::{GrantReader, RoleStore, StoreError};

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Converts sqlx errors to `StoreError::SqlxError` with a context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to StoreError with context message.
    fn sql_context(self, context: &str) -> Result<T>;

    /// Like [`sql_context`](Self::sql_context), but a UNIQUE constraint
    /// violation becomes the error built by `conflict`.
    fn on_unique_violation(
        self,
        conflict: impl FnOnce() -> StoreError,
        context: &str,
    ) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            StoreError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }

    fn on_unique_violation(
        self,
        conflict: impl FnOnce() -> StoreError,
        context: &str,
    ) -> Result<T> {
        match self {
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(conflict().into()),
            other => other.sql_context(context),
        }
    }
}

/// Database kind for SQL dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// SQLite database
    Sqlite,
    /// PostgreSQL database
    Postgres,
}

/// Stored names are validated on the way in; a failure here means the
/// database was edited behind the store's back.
fn stored_role_name(name: String) -> Result<RoleName> {
    RoleName::new(name).map_err(|e| {
        StoreError::StateInconsistency {
            reason: e.to_string(),
        }
        .into()
    })
}

fn stored_permission_name(name: String) -> Result<PermissionName> {
    PermissionName::new(name).map_err(|e| {
        StoreError::StateInconsistency {
            reason: e.to_string(),
        }
        .into()
    })
}

/// SQL-backed [`RoleStore`].
///
/// `SqlStore` is `Send + Sync`; the underlying sqlx pool handles connection
/// pooling and thread safety.
pub struct SqlStore {
    pool: AnyPool,
    kind: DbKind,
}

impl SqlStore {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the database kind.
    pub fn kind(&self) -> DbKind {
        self.kind
    }

    pub fn is_sqlite(&self) -> bool {
        self.kind == DbKind::Sqlite
    }

    pub fn is_postgres(&self) -> bool {
        self.kind == DbKind::Postgres
    }

    /// Close the pool, waiting for connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn role_id(&self, name: &RoleName) -> Result<String> {
        let row: Option<(String,)> = sqlx::query_as("SELECT id FROM roles WHERE name = $1")
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await
            .sql_context("Failed to look up role")?;
        row.map(|(id,)| id).ok_or_else(|| {
            StoreError::RoleNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    async fn permission_id(&self, name: &PermissionName) -> Result<String> {
        let row: Option<(String,)> = sqlx::query_as("SELECT id FROM permissions WHERE name = $1")
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await
            .sql_context("Failed to look up permission")?;
        row.map(|(id,)| id).ok_or_else(|| {
            StoreError::PermissionNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }
}

// SQLite-specific implementations
#[cfg(feature = "sqlite")]
impl SqlStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// ```ignore
    /// use rolegate::store::SqlStore;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let store = SqlStore::open_sqlite("rolegate.db").await.unwrap();
    /// }
    /// ```
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url).await
    }

    /// Connect to a SQLite database using a connection URL.
    pub async fn connect_sqlite(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let is_in_memory = url.contains("mode=memory");

        // An in-memory SQLite database is destroyed when its last connection
        // closes, so keep one open for the lifetime of the pool.
        let pool = if is_in_memory {
            AnyPoolOptions::new()
                .max_connections(5)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url)
                .await
                .sql_context("Failed to connect to SQLite")?
        } else {
            AnyPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .sql_context("Failed to connect to SQLite")?
        };

        if is_in_memory {
            sqlx::query("PRAGMA busy_timeout = 5000;")
                .execute(&pool)
                .await
                .sql_context("Failed to configure SQLite")?;
        } else {
            sqlx::query(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )
            .execute(&pool)
            .await
            .sql_context("Failed to configure SQLite")?;
        }

        let store = Self {
            pool,
            kind: DbKind::Sqlite,
        };
        schema::initialize(&store).await?;
        Ok(store)
    }

    /// Create an in-memory SQLite database.
    ///
    /// Each call gets its own database, so tests do not share state.
    pub async fn sqlite_in_memory() -> Result<Self> {
        let unique_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:mem_{unique_id}?mode=memory&cache=shared");
        Self::connect_sqlite(&url).await
    }
}

// PostgreSQL-specific implementations
#[cfg(feature = "postgres")]
impl SqlStore {
    /// Connect to a PostgreSQL database using a connection URL.
    ///
    /// This connects to the default (public) schema. For test isolation,
    /// use `connect_postgres_isolated()` instead.
    pub async fn connect_postgres(url: &str) -> Result<Self> {
        Self::connect_postgres_with_schema(url, None).await
    }

    /// Connect to a PostgreSQL database with test isolation.
    ///
    /// Creates a unique schema for this store instance, ensuring tests
    /// don't interfere with each other when run in parallel.
    pub async fn connect_postgres_isolated(url: &str) -> Result<Self> {
        let schema = format!("rolegate_test_{}", uuid::Uuid::new_v4().simple());
        Self::connect_postgres_with_schema(url, Some(schema)).await
    }

    async fn connect_postgres_with_schema(url: &str, schema_name: Option<String>) -> Result<Self> {
        sqlx::any::install_default_drivers();

        if let Some(ref schema) = schema_name {
            let temp_pool = AnyPoolOptions::new()
                .max_connections(1)
                .connect(url)
                .await
                .sql_context("Failed to connect to PostgreSQL")?;

            let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {schema}");
            sqlx::query(&create_schema)
                .execute(&temp_pool)
                .await
                .sql_context(&format!("Failed to create schema {schema}"))?;

            temp_pool.close().await;
        }

        // Isolated (test) connections use a small pool so parallel tests do
        // not exhaust PostgreSQL's max_connections.
        let schema_for_hook = schema_name.clone();
        let mut pool_options = AnyPoolOptions::new();
        if schema_name.is_some() {
            pool_options = pool_options
                .max_connections(2)
                .acquire_timeout(Duration::from_secs(30));
        } else {
            pool_options = pool_options.max_connections(5);
        }

        let pool = pool_options
            .after_connect(move |conn, _meta| {
                let schema = schema_for_hook.clone();
                Box::pin(async move {
                    if let Some(ref s) = schema {
                        let set_path = format!("SET search_path TO {s}");
                        conn.execute(set_path.as_str()).await?;
                    }
                    Ok(())
                })
            })
            .connect(url)
            .await
            .sql_context("Failed to connect to PostgreSQL")?;

        let store = Self {
            pool,
            kind: DbKind::Postgres,
        };
        schema::initialize(&store).await?;
        Ok(store)
    }
}

#[async_trait]
impl GrantReader for SqlStore {
    async fn role_grants(&self, principal: &PrincipalId) -> Result<Vec<RoleGrant>> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            "SELECT r.name, p.name
             FROM role_assignments ra
             JOIN roles r ON r.id = ra.role_id
             LEFT JOIN role_permissions rp ON rp.role_id = r.id
             LEFT JOIN permissions p ON p.id = rp.permission_id
             WHERE ra.principal_id = $1
             ORDER BY r.name, p.name",
        )
        .bind(principal.as_str())
        .fetch_all(&self.pool)
        .await
        .sql_context("Failed to read role grants")?;

        let mut grouped: BTreeMap<String, Vec<PermissionName>> = BTreeMap::new();
        for (role, permission) in rows {
            let permissions = grouped.entry(role).or_default();
            if let Some(permission) = permission {
                permissions.push(stored_permission_name(permission)?);
            }
        }

        grouped
            .into_iter()
            .map(|(role, permissions)| Ok(RoleGrant::new(stored_role_name(role)?, permissions)))
            .collect()
    }
}

#[async_trait]
impl RoleStore for SqlStore {
    async fn create_role(&self, name: &RoleName, description: &str) -> Result<Role> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO roles (id, name, description) VALUES ($1, $2, $3)")
            .bind(id.as_str())
            .bind(name.as_str())
            .bind(description)
            .execute(&self.pool)
            .await
            .on_unique_violation(
                || StoreError::RoleAlreadyExists {
                    name: name.to_string(),
                },
                "Failed to create role",
            )?;
        Ok(Role {
            id,
            name: name.clone(),
            description: description.to_string(),
        })
    }

    async fn delete_role(&self, name: &RoleName) -> Result<()> {
        let id = self.role_id(name).await?;
        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete role grants")?;
        sqlx::query("DELETE FROM role_assignments WHERE role_id = $1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete role assignments")?;
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete role")?;
        tx.commit().await.sql_context("Failed to commit role deletion")
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT id, name, description FROM roles ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .sql_context("Failed to list roles")?;
        rows.into_iter()
            .map(|(id, name, description)| {
                Ok(Role {
                    id,
                    name: stored_role_name(name)?,
                    description,
                })
            })
            .collect()
    }

    async fn create_permission(
        &self,
        name: &PermissionName,
        description: &str,
    ) -> Result<Permission> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO permissions (id, name, description) VALUES ($1, $2, $3)")
            .bind(id.as_str())
            .bind(name.as_str())
            .bind(description)
            .execute(&self.pool)
            .await
            .on_unique_violation(
                || StoreError::PermissionAlreadyExists {
                    name: name.to_string(),
                },
                "Failed to create permission",
            )?;
        Ok(Permission {
            id,
            name: name.clone(),
            description: description.to_string(),
        })
    }

    async fn delete_permission(&self, name: &PermissionName) -> Result<()> {
        let id = self.permission_id(name).await?;
        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;
        sqlx::query("DELETE FROM role_permissions WHERE permission_id = $1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete permission grants")?;
        sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete permission")?;
        tx.commit()
            .await
            .sql_context("Failed to commit permission deletion")
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT id, name, description FROM permissions ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .sql_context("Failed to list permissions")?;
        rows.into_iter()
            .map(|(id, name, description)| {
                Ok(Permission {
                    id,
                    name: stored_permission_name(name)?,
                    description,
                })
            })
            .collect()
    }

    async fn grant_permission(&self, role: &RoleName, permission: &PermissionName) -> Result<()> {
        let role_id = self.role_id(role).await?;
        let permission_id = self.permission_id(permission).await?;
        sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(role_id.as_str())
        .bind(permission_id.as_str())
        .execute(&self.pool)
        .await
        .sql_context("Failed to grant permission")?;
        Ok(())
    }

    async fn revoke_permission(
        &self,
        role: &RoleName,
        permission: &PermissionName,
    ) -> Result<()> {
        let role_id = self.role_id(role).await?;
        sqlx::query(
            "DELETE FROM role_permissions
             WHERE role_id = $1
               AND permission_id IN (SELECT id FROM permissions WHERE name = $2)",
        )
        .bind(role_id.as_str())
        .bind(permission.as_str())
        .execute(&self.pool)
        .await
        .sql_context("Failed to revoke permission")?;
        Ok(())
    }

    async fn role_permissions(&self, role: &RoleName) -> Result<Vec<PermissionName>> {
        let role_id = self.role_id(role).await?;
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT p.name FROM role_permissions rp
             JOIN permissions p ON p.id = rp.permission_id
             WHERE rp.role_id = $1
             ORDER BY p.name",
        )
        .bind(role_id.as_str())
        .fetch_all(&self.pool)
        .await
        .sql_context("Failed to list role permissions")?;
        rows.into_iter()
            .map(|(name,)| stored_permission_name(name))
            .collect()
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let id = PrincipalId::generate();
        sqlx::query("INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3)")
            .bind(id.as_str())
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .on_unique_violation(
                || StoreError::UsernameAlreadyExists {
                    username: username.to_string(),
                },
                "Failed to create user",
            )?;
        Ok(User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .sql_context("Failed to look up user")?;
        Ok(row.map(|(id, username, password_hash)| User {
            id: PrincipalId::new(id),
            username,
            password_hash,
        }))
    }

    async fn get_user(&self, id: &PrincipalId) -> Result<Option<User>> {
        let row: Option<(String, String, String)> =
            sqlx::query_as("SELECT id, username, password_hash FROM users WHERE id = $1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .sql_context("Failed to look up user")?;
        Ok(row.map(|(id, username, password_hash)| User {
            id: PrincipalId::new(id),
            username,
            password_hash,
        }))
    }

    async fn delete_user(&self, id: &PrincipalId) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete user")?;
        if deleted.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(StoreError::UserNotFound {
                user: id.to_string(),
            }
            .into());
        }
        sqlx::query("DELETE FROM role_assignments WHERE principal_id = $1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete user role assignments")?;
        tx.commit().await.sql_context("Failed to commit user deletion")
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT id, username, password_hash FROM users ORDER BY username")
                .fetch_all(&self.pool)
                .await
                .sql_context("Failed to list users")?;
        Ok(rows
            .into_iter()
            .map(|(id, username, password_hash)| User {
                id: PrincipalId::new(id),
                username,
                password_hash,
            })
            .collect())
    }

    async fn assign_role(&self, principal: &PrincipalId, role: &RoleName) -> Result<()> {
        let role_id = self.role_id(role).await?;
        sqlx::query(
            "INSERT INTO role_assignments (principal_id, role_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(principal.as_str())
        .bind(role_id.as_str())
        .execute(&self.pool)
        .await
        .sql_context("Failed to assign role")?;
        Ok(())
    }

    async fn unassign_role(&self, principal: &PrincipalId, role: &RoleName) -> Result<()> {
        let role_id = self.role_id(role).await?;
        sqlx::query("DELETE FROM role_assignments WHERE principal_id = $1 AND role_id = $2")
            .bind(principal.as_str())
            .bind(role_id.as_str())
            .execute(&self.pool)
            .await
            .sql_context("Failed to unassign role")?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
