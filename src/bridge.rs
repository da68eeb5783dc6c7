//! Process lifetime: wires brokers and listeners together and runs them.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::handlers::Outlets;
use crate::registry::HandlerRegistry;
use crate::transport::{ControlSurfaceLink, ExtensionHub};

// ============================================================================
// Bridge
// ============================================================================

/// Both brokers plus the listeners relaying between them.
pub struct Bridge {
    config: BridgeConfig,
    hub: Arc<ExtensionHub>,
    link: Arc<ControlSurfaceLink>,
    registry: HandlerRegistry,
}

impl Bridge {
    /// Builds the brokers and registers the standard listeners with both.
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        let hub = ExtensionHub::new();
        let link = ControlSurfaceLink::new();

        let outlets = Outlets::new(link.clone(), hub.clone());
        let registry = HandlerRegistry::standard(&outlets);
        registry.install(&hub, &link);

        Self {
            config,
            hub,
            link,
            registry,
        }
    }

    /// The browser-extension server.
    #[inline]
    #[must_use]
    pub fn hub(&self) -> &Arc<ExtensionHub> {
        &self.hub
    }

    /// The Stream Deck connection.
    #[inline]
    #[must_use]
    pub fn link(&self) -> &Arc<ControlSurfaceLink> {
        &self.link
    }

    /// Starts the browser server, then runs the Stream Deck link until it
    /// ends, then shuts the server down.
    ///
    /// # Errors
    ///
    /// Returns the bind error if the browser port is unavailable, otherwise
    /// whatever ended the Stream Deck link.
    pub async fn run(self) -> Result<()> {
        let addr = self.start_hub().await?;
        debug!(%addr, listeners = self.registry.len(), "Bridge ready");

        let outcome = self
            .link
            .start(
                self.config.stream_deck_port,
                &self.config.register_event,
                &self.config.plugin_uuid,
            )
            .await;

        self.hub.shutdown();
        info!(ok = outcome.is_ok(), "Bridge stopped");
        outcome
    }

    async fn start_hub(&self) -> Result<SocketAddr> {
        self.hub
            .start(self.config.browser_ip, self.config.browser_port)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
