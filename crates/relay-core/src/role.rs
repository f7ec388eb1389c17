//! Downstream gateway roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A logical downstream gateway role.
///
/// A role names one fleet of gateway processes: the TCP socket gateways, the
/// WSS socket gateways, or a named business channel with its own fleet. The
/// role selects the registry key prefix to watch for membership and the
/// connection-pool key for outbound calls.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SocketRole {
    /// Plain TCP socket gateways.
    Tcp,
    /// WebSocket-secure gateways.
    Wss,
    /// A named business-channel gateway fleet.
    Custom(String),
}

impl SocketRole {
    /// The role's canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tcp => "tcp",
            Self::Wss => "wss",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for SocketRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for SocketRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "tcp" => Self::Tcp,
            "wss" => Self::Wss,
            _ => Self::Custom(value),
        }
    }
}

impl From<&str> for SocketRole {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<SocketRole> for String {
    fn from(role: SocketRole) -> Self {
        role.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_strings() {
        assert_eq!(SocketRole::Tcp.as_str(), "tcp");
        assert_eq!(SocketRole::Wss.as_str(), "wss");
        assert_eq!(SocketRole::Custom("uav".into()).as_str(), "uav");
    }

    #[test]
    fn parse_known_roles() {
        assert_eq!(SocketRole::from("tcp"), SocketRole::Tcp);
        assert_eq!(SocketRole::from("wss"), SocketRole::Wss);
        assert_eq!(SocketRole::from("billing"), SocketRole::Custom("billing".into()));
    }

    #[test]
    fn serde_roundtrip_as_string() {
        let json = serde_json::to_string(&SocketRole::Wss).unwrap();
        assert_eq!(json, "\"wss\"");
        let back: SocketRole = serde_json::from_str("\"uav\"").unwrap();
        assert_eq!(back, SocketRole::Custom("uav".into()));
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(SocketRole::Tcp.to_string(), "tcp");
    }
}
