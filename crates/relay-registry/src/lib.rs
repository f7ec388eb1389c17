//! # relay-registry
//!
//! Registry-facing side of the relay layer.
//!
//! The external coordination service is consumed through the [`Registry`]
//! capability (register with TTL, atomic unregister, prefix watch). On top of
//! it this crate builds:
//!
//! - [`HostSet`]: the live set of gateway hosts for one role — written only
//!   by its membership watcher, snapshot-read by any number of callers
//! - [`MembershipWatcher`]: subscribes to a role's key prefix and mutates the
//!   role's host set on add/remove notifications
//! - [`RegistrationPublisher`]: publishes every served action under
//!   `<prefix>/<handlerId>/<host>/<actionId>` at startup and withdraws the
//!   same keys at shutdown
//! - [`MemoryRegistry`]: in-process registry for tests and local development

#![deny(unsafe_code)]

pub mod errors;
pub mod hostset;
pub mod keys;
pub mod memory;
pub mod publisher;
pub mod registry;
pub mod watcher;

pub use errors::RegistryError;
pub use hostset::HostSet;
pub use memory::MemoryRegistry;
pub use publisher::RegistrationPublisher;
pub use registry::{Registry, WatchCallback, WatchEvent, WatchEventKind};
pub use watcher::{MembershipWatcher, WatcherState};
