//! Per-browser session storage and flow correlation.
//!
//! This crate provides:
//! - The [`SessionStore`] contract and an in-memory, TTL-bound backend
//! - [`FlowCorrelator`], which maps flow keys to the cluster credential that
//!   started each pending login
//!
//! A single browser session may hold several pending flows at once (one per
//! tab or provider); each is addressed by its own flow key.

pub mod error;
pub mod flow;
pub mod session;
pub mod store;

pub use error::SessionError;
pub use flow::FlowCorrelator;
pub use session::SessionId;
pub use store::{MemorySessionStore, SessionStore, SessionUpdate};
