//! Token persistence for token-bridge.
//!
//! This crate provides:
//! - [`TokenRecord`], the normalized shape a provider token is stored in
//! - [`ResourceFetcher`], which loads the target resource as the caller
//! - [`TokenPersister`], which writes the record against that resource
//!
//! Kubernetes implementations of both contracts live here as well, plus an
//! in-memory [`TokenPersister`] for local runs and tests.

pub mod error;
pub mod memory;
pub mod persister;
pub mod record;
pub mod resource;

pub use error::StorageError;
pub use memory::MemoryTokenPersister;
pub use persister::{SecretTokenPersister, TokenPersister};
pub use record::TokenRecord;
pub use resource::{KubeResourceFetcher, ResourceFetcher, ResourceKind, TargetResource};
