//! Core types shared by the token-bridge crates.
//!
//! This crate provides the identifiers that cross crate boundaries and the
//! `Result` alias every library crate uses for its rootcause reports.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{FlowKey, ParseIdError};
