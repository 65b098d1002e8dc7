//! Request gate tests, driven through a small axum router.

mod require;
