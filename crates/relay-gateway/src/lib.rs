//! # relay-gateway
//!
//! The gateway client: high-level remote operations against a dynamically
//! discovered fleet of socket gateway hosts.
//!
//! The underlying RPC transport is consumed as a capability
//! ([`ChannelResolver`] / [`GatewayChannel`]) — connection establishment,
//! pooling, timeouts, and retries all live below that seam. This crate owns
//! what sits above it: per-operation target selection and failure policy
//! (single host, first-success, first-error-aborts, or best-effort parallel
//! fan-out), dual-format message pre-encoding, and post-call observation.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod memory;
pub mod observer;
pub mod transport;

pub use client::GatewayClient;
pub use errors::{GatewayError, TransportError};
pub use memory::{MemoryGateway, RecordedCall};
pub use observer::{CallObserver, LoggingObserver};
pub use transport::{
    ChannelResolver, ConnectionInfo, EncodedMessage, GatewayChannel, GroupMember, MessageTarget,
    ServiceSlot,
};
