//! token-bridge HTTP server.
//!
//! Serves the two-step OAuth flow that stores a service provider token in
//! the cluster on behalf of a caller who proved cluster access first.

pub mod auth;
pub mod config;
pub mod error;
pub mod template;
