//! Cluster authorization checks for token-bridge.
//!
//! Before a provider login may begin, the caller's own cluster credential
//! must be allowed to submit token data in the target namespace. This crate
//! asks the API server that question with a `SelfSubjectAccessReview` issued
//! as the caller, and provides the impersonating client factory shared with
//! the storage layer.

mod client;
mod error;
mod types;

pub use client::{AccessGate, CredentialClients, KubeAccessGate};
pub use error::AuthzError;
pub use types::AccessDescriptor;
