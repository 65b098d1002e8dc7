//! Credentials for the request gate
//!
//! - [`bearer_token`] reads the `Authorization` header
//! - [`CredentialVerifier`] maps a token to a principal; [`SessionStore`] is
//!   the in-process implementation issued by the login endpoint
//! - [`hash_password`] / [`verify_password`] handle stored Argon2id hashes
//! - [`AuthError`] is the fixed set of gate outcomes and their HTTP responses

mod credentials;
pub mod errors;
mod password;
mod session;

pub use credentials::{CredentialError, CredentialVerifier, bearer_token};
pub use errors::AuthError;
pub use password::{hash_password, reject_unknown_user, verify_password};
pub use session::{Session, SessionStore};
