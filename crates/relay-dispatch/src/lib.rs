//! # relay-dispatch
//!
//! The action table and the dispatch service.
//!
//! - [`ActionTable`]: concurrent map from numeric action ID to (action
//!   metadata, payload-structure factory, handler). Duplicate registration of
//!   a non-close ID fails loudly; close-sentinel registrations chain into an
//!   ordered teardown list instead
//! - [`TableProvider`]: one lazily-created table per channel, each with its
//!   own action-ID namespace
//! - [`Dispatcher`]: the RPC-facing entry point — resolve the action, decode
//!   the payload in the caller's wire format, invoke the handler, encode the
//!   reply, with the `NotFound` / `InvalidPayload` / `Internal` failure
//!   taxonomy

#![deny(unsafe_code)]

pub mod errors;
pub mod handler;
pub mod service;
pub mod table;

pub use errors::DispatchError;
pub use handler::{ActionHandler, ActionReply, HandlerRequest};
pub use service::{DispatchReply, Dispatcher, InboundCall};
pub use table::{ActionEntry, ActionTable, TableProvider};
