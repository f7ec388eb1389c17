//! Post-call observation of gateway RPC calls.

use tracing::{debug, error};

use relay_core::SocketRole;

use crate::errors::TransportError;

/// Hook invoked after every remote gateway call.
///
/// Observers compose: each registered observer sees each call, success or
/// failure. They must be cheap — they run inline on the calling task.
pub trait CallObserver: Send + Sync {
    /// Called after a remote call completes.
    fn after_call(
        &self,
        role: &SocketRole,
        host: &str,
        method: &str,
        error: Option<&TransportError>,
    );
}

/// Default observer: structured logs mirroring each call's outcome.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingObserver;

impl CallObserver for LoggingObserver {
    fn after_call(
        &self,
        role: &SocketRole,
        host: &str,
        method: &str,
        error: Option<&TransportError>,
    ) {
        match error {
            Some(err) => error!(role = %role, host, method, error = %err, "gateway call failed"),
            None => debug!(role = %role, host, method, "gateway call ok"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_observer_handles_both_outcomes() {
        let observer = LoggingObserver;
        observer.after_call(&SocketRole::Tcp, "h:1", "send_message", None);
        let err = TransportError::new("h:1", "send_message", "reset");
        observer.after_call(&SocketRole::Tcp, "h:1", "send_message", Some(&err));
    }
}
