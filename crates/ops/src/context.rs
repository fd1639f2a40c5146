//! Operations context for dependency injection

use cmirror_config::Config;
use cmirror_errors::{Error, OpsError};
use cmirror_events::{EventEmitter, EventSender};
use cmirror_index::{GitIndex, IndexRefresher};
use cmirror_net::{NetClient, NetConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Operations context providing access to all system components
pub struct OpsCtx {
    /// Network client shared by every fetch
    pub net: NetClient,
    /// Clones and refreshes index checkouts
    pub refresher: Arc<dyn IndexRefresher>,
    /// Event sender for progress reporting
    pub tx: EventSender,
    pub config: Config,
    /// Fires when the user interrupts the running command
    pub cancel: CancellationToken,
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

/// Builder for [`OpsCtx`]
///
/// Only the event sender is required. The network client is derived from
/// the configuration and index refreshes go through `git` unless replaced.
#[derive(Default)]
pub struct OpsContextBuilder {
    refresher: Option<Arc<dyn IndexRefresher>>,
    tx: Option<EventSender>,
    config: Option<Config>,
    cancel: Option<CancellationToken>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set index refresher
    #[must_use]
    pub fn with_refresher(mut self, refresher: Arc<dyn IndexRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the token that interrupts running operations
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if the event sender is missing or the network client
    /// cannot be created from the configuration.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let tx = self.tx.ok_or_else(|| OpsError::MissingComponent {
            component: "event_sender".to_string(),
        })?;

        let config = self.config.unwrap_or_default();

        let net = NetClient::new(NetConfig::from(&config.network))?;

        let refresher = self
            .refresher
            .unwrap_or_else(|| Arc::new(GitIndex::new()));

        Ok(OpsCtx {
            net,
            refresher,
            tx,
            config,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_event_sender() {
        let err = OpsContextBuilder::new().build().err().unwrap();
        assert!(matches!(
            err,
            Error::Ops(OpsError::MissingComponent { ref component }) if component == "event_sender"
        ));
    }

    #[test]
    fn test_builder_defaults() {
        let (tx, _rx) = cmirror_events::channel();
        let ctx = OpsContextBuilder::new().with_event_sender(tx).build().unwrap();
        assert_eq!(ctx.net.config().user_agent, "cargo");
        assert!(!ctx.cancel.is_cancelled());
    }
}
