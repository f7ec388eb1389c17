//! # relay-core
//!
//! Foundation types for the relay routing layer.
//!
//! This crate provides the shared vocabulary that all other relay crates
//! depend on:
//!
//! - **Actions**: [`ActionId`] and [`Action`] — the numbered, named units of
//!   request/response behavior dispatched by ID
//! - **Roles**: [`SocketRole`] — the downstream gateway roles (tcp, wss, or a
//!   named business channel)
//! - **Identities**: [`BoundIdentity`] / [`BoundIdentitySet`] — external IDs
//!   associated with live gateway connections
//! - **Call context**: [`CallContext`] — call-scoped provenance (correlation
//!   ID) decoupled from host addressing

#![deny(unsafe_code)]

pub mod action;
pub mod context;
pub mod identity;
pub mod role;

pub use action::{Action, ActionId, CLOSE_ACTION_ID, ConnDescriptor};
pub use context::CallContext;
pub use identity::{BoundIdentity, BoundIdentitySet};
pub use role::SocketRole;
