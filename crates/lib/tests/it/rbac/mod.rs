//! Permission resolution tests.
