//! OAuth `state` payloads and the codec that signs them.
//!
//! The state parameter round-trips through the browser and the service
//! provider, so it only needs to be tamper-evident. It never carries a
//! secret: the cluster credential stays in the server-side session and the
//! state only holds the [`FlowKey`](token_bridge_core::FlowKey) pointing at it.

mod codec;
mod error;
mod state;

pub use codec::StateCodec;
pub use error::StateError;
pub use state::{AnonymousState, KeyedState};
