//! Store tests.
//!
//! `role_store` runs against whichever backend TEST_BACKEND selects;
//! `persistence` is specific to the in-memory store's JSON files.

mod seed;
