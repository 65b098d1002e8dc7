//! Request gate
//!
//! [`Gate`] turns the permission resolver into HTTP behavior. A request
//! passes through these states:
//!
//! ```text
//! Unauthenticated -> CredentialInvalid                     (401)
//!                 -> CredentialValid -> Denied             (403)
//!                                    -> ResolverError      (503)
//!                                    -> Allowed            (handler runs)
//! ```
//!
//! The resolver is only consulted once a credential has been verified, and
//! an allowed request reaches the wrapped handler unmodified apart from the
//! [`PrincipalId`] added to its extensions.
//!
//! # Example
//!
//! ```ignore
//! let router = Router::new()
//!     .route("/api/organizations", get(list_orgs))
//!     .route_layer(gate.require("organization:read"));
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{HeaderMap, Request};
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};

use crate::auth::{AuthError, CredentialError, CredentialVerifier, bearer_token};
use crate::rbac::{PermissionResolver, PrincipalId};

/// Authenticates requests and checks them against the resolver.
///
/// Cheap to clone; clones share the resolver and verifier.
#[derive(Clone)]
pub struct Gate {
    resolver: PermissionResolver,
    verifier: Arc<dyn CredentialVerifier>,
}

impl Gate {
    pub fn new(resolver: PermissionResolver, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { resolver, verifier }
    }

    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// Verify the bearer credential and return its principal.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<PrincipalId, AuthError> {
        let token = bearer_token(headers)?;
        self.verifier.verify(token).await.map_err(|e| {
            match e {
                CredentialError::UnknownToken => tracing::debug!("Rejected unknown token"),
                CredentialError::Expired => tracing::debug!("Rejected expired token"),
            }
            AuthError::AuthenticationInvalid
        })
    }

    /// Authenticate, then require `permission`.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        permission: &str,
    ) -> Result<PrincipalId, AuthError> {
        let principal = self.authenticate(headers).await?;
        let decision = self
            .resolver
            .resolve(principal.as_str(), permission)
            .await
            .map_err(|e| {
                tracing::error!(
                    principal = %principal,
                    permission,
                    error = %e,
                    "Permission check unavailable"
                );
                AuthError::ResolverUnavailable {
                    source: Box::new(e),
                }
            })?;

        if decision.authorized {
            Ok(principal)
        } else {
            Err(AuthError::AuthorizationDenied)
        }
    }

    /// Layer that only lets requests holding `permission` through.
    pub fn require(&self, permission: impl Into<String>) -> RequirePermission {
        RequirePermission {
            gate: self.clone(),
            permission: Arc::from(permission.into()),
        }
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

/// Route layer requiring one permission. Built by [`Gate::require`].
#[derive(Clone, Debug)]
pub struct RequirePermission {
    gate: Gate,
    permission: Arc<str>,
}

impl RequirePermission {
    pub fn permission(&self) -> &str {
        &self.permission
    }
}

impl<S> Layer<S> for RequirePermission {
    type Service = RequirePermissionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequirePermissionService {
            inner,
            gate: self.gate.clone(),
            permission: self.permission.clone(),
        }
    }
}

/// Service wrapper for [`RequirePermission`].
#[derive(Clone, Debug)]
pub struct RequirePermissionService<S> {
    inner: S,
    gate: Gate,
    permission: Arc<str>,
}

impl<S> Service<Request<Body>> for RequirePermissionService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        // Take the service that was polled ready and leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let gate = self.gate.clone();
        let permission = self.permission.clone();

        Box::pin(async move {
            match gate.authorize(request.headers(), &permission).await {
                Ok(principal) => {
                    request.extensions_mut().insert(principal);
                    inner.call(request).await
                }
                Err(err) => {
                    tracing::info!(
                        permission = &*permission,
                        status = err.status_code().as_u16(),
                        "Request rejected by gate"
                    );
                    Ok(err.into_response())
                }
            }
        })
    }
}
