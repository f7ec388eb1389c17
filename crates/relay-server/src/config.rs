//! Handler configuration.
//!
//! Values load in two layers: compiled defaults, then `RELAY_*` environment
//! variable overrides. Override parsing is strict — integers must parse and
//! fall inside their documented range; invalid values are silently ignored in
//! favor of the default.

use serde::{Deserialize, Serialize};

use relay_core::SocketRole;

/// Configuration for one handler instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Business module (first half of the handler ID).
    pub module: String,
    /// Sub-module (second half of the handler ID).
    pub submodule: String,
    /// Human-readable handler name.
    pub name: String,
    /// Socket role whose gateways front this handler's clients.
    pub role: SocketRole,
    /// Advertised RPC address of this handler instance.
    pub host_addr: String,
    /// Role prefix for action registration keys.
    pub register_prefix: String,
    /// Registration time-to-live in seconds.
    pub register_ttl_secs: u64,
    /// Load-balance weight appended to registration values; `0` = unweighted.
    pub balance_weight: u32,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            module: "app".into(),
            submodule: "main".into(),
            name: "relay handler".into(),
            role: SocketRole::Tcp,
            host_addr: "127.0.0.1:8010".into(),
            register_prefix: "actions".into(),
            register_ttl_secs: 5,
            balance_weight: 0,
        }
    }
}

impl HandlerConfig {
    /// Load defaults with environment overrides applied.
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// The handler ID: `<module>-<submodule>`.
    #[must_use]
    pub fn handler_id(&self) -> String {
        format!("{}-{}", self.module, self.submodule)
    }

    /// Apply `RELAY_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = read_string(&get, "RELAY_MODULE") {
            self.module = v;
        }
        if let Some(v) = read_string(&get, "RELAY_SUBMODULE") {
            self.submodule = v;
        }
        if let Some(v) = read_string(&get, "RELAY_NAME") {
            self.name = v;
        }
        if let Some(v) = read_string(&get, "RELAY_ROLE") {
            self.role = SocketRole::from(v);
        }
        if let Some(v) = read_string(&get, "RELAY_HOST") {
            self.host_addr = v;
        }
        if let Some(v) = read_string(&get, "RELAY_REGISTER_PREFIX") {
            self.register_prefix = v;
        }
        if let Some(v) = read_u64(&get, "RELAY_REGISTER_TTL", 1, 3600) {
            self.register_ttl_secs = v;
        }
        if let Some(v) = read_u32(&get, "RELAY_BALANCE_WEIGHT", 0, 1_000_000) {
            self.balance_weight = v;
        }
    }
}

fn read_string(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    get(key).filter(|v| !v.is_empty())
}

fn read_u64(get: &impl Fn(&str) -> Option<String>, key: &str, min: u64, max: u64) -> Option<u64> {
    get(key)?.parse().ok().filter(|v| (min..=max).contains(v))
}

fn read_u32(get: &impl Fn(&str) -> Option<String>, key: &str, min: u32, max: u32) -> Option<u32> {
    get(key)?.parse().ok().filter(|v| (min..=max).contains(v))
}
