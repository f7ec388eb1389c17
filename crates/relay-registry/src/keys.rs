//! Registry key layout.
//!
//! Action registrations live under
//! `<rolePrefix>/<handlerId>/<hostAddress>/<actionId>`; gateway membership
//! keys live under `gateways/<role>/<hostAddress>`. In both layouts the host
//! is the final path segment.

use relay_core::{Action, ActionId, SocketRole};

/// Build the registration key for one (handler-host, action) pair.
///
/// Leading slashes in the prefix are trimmed so keys are always relative.
#[must_use]
pub fn registration_key(prefix: &str, handler_id: &str, host: &str, action_id: ActionId) -> String {
    let key = format!("{prefix}/{handler_id}/{host}/{action_id}");
    key.trim_start_matches('/').to_owned()
}

/// Build the registration value for an action: `name` or `name|weight`.
#[must_use]
pub fn registration_value(action: &Action, balance_weight: Option<u32>) -> String {
    match balance_weight {
        Some(weight) if weight > 0 => format!("{}|{weight}", action.name),
        _ => action.name.clone(),
    }
}

/// The membership watch prefix for a gateway role.
#[must_use]
pub fn gateway_prefix(role: &SocketRole) -> String {
    format!("gateways/{role}/")
}

/// The host address encoded as the final segment of a key.
#[must_use]
pub fn host_from_key(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
