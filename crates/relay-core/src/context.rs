//! Call-scoped context carried across the RPC boundary.
//!
//! Correlation IDs are plain call metadata here, decoupled from host
//! addressing. Some upstream callers still deliver the legacy form where the
//! correlation ID is embedded in the host argument (`<id>:@<host>`);
//! [`CallContext::split_tagged_host`] peels that apart. The tag never affects
//! routing.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Separator between an embedded correlation tag and the host address.
const HOST_TAG_SEPARATOR: &str = ":@";

/// Call-scoped provenance passed through to the RPC layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Optional request-correlation ID for cross-service log correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl CallContext {
    /// An empty context with no correlation ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context carrying the given correlation ID.
    #[must_use]
    pub fn with_correlation(id: impl Into<String>) -> Self {
        Self {
            correlation_id: Some(id.into()),
        }
    }

    /// A context with a freshly generated correlation ID (UUID v7, time-ordered).
    #[must_use]
    pub fn generated() -> Self {
        Self::with_correlation(Uuid::now_v7().to_string())
    }

    /// Split an optionally-tagged host argument into its correlation tag and
    /// the bare host.
    ///
    /// Accepts the legacy `<correlation-id>:@<host>` form; an untagged host is
    /// returned unchanged with no tag.
    #[must_use]
    pub fn split_tagged_host(host: &str) -> (Option<&str>, &str) {
        match host.split_once(HOST_TAG_SEPARATOR) {
            Some((tag, bare)) if !tag.is_empty() => (Some(tag), bare),
            Some((_, bare)) => (None, bare),
            None => (None, host),
        }
    }
}

impl fmt::Display for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.correlation_id {
            Some(id) => write!(f, "ctx[{id}]"),
            None => f.write_str("ctx[-]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_tagged_host() {
        let (tag, host) = CallContext::split_tagged_host("req-778:@10.0.0.2:9000");
        assert_eq!(tag, Some("req-778"));
        assert_eq!(host, "10.0.0.2:9000");
    }

    #[test]
    fn split_untagged_host() {
        let (tag, host) = CallContext::split_tagged_host("10.0.0.2:9000");
        assert!(tag.is_none());
        assert_eq!(host, "10.0.0.2:9000");
    }

    #[test]
    fn split_empty_tag_is_no_tag() {
        let (tag, host) = CallContext::split_tagged_host(":@10.0.0.2:9000");
        assert!(tag.is_none());
        assert_eq!(host, "10.0.0.2:9000");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = CallContext::generated();
        let b = CallContext::generated();
        assert_ne!(a.correlation_id, b.correlation_id);
        assert!(a.correlation_id.is_some());
    }

    #[test]
    fn serde_skips_absent_correlation() {
        let json = serde_json::to_string(&CallContext::new()).unwrap();
        assert_eq!(json, "{}");
        let json = serde_json::to_string(&CallContext::with_correlation("c-1")).unwrap();
        assert!(json.contains("c-1"));
    }

    #[test]
    fn display_forms() {
        assert_eq!(CallContext::new().to_string(), "ctx[-]");
        assert_eq!(CallContext::with_correlation("x").to_string(), "ctx[x]");
    }
}
