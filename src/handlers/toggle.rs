//! Two-way toggle buttons (mic, camera, hand, ...).
//!
//! A toggle button shows the meeting's current state for one device and
//! flips it when pressed. The button never changes its own state on press:
//! the browser reports the new state back and that report drives the
//! button image.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::{ActionMatch, Outlets};
use crate::dispatch::Listener;
use crate::error::Result;
use crate::protocol::{BrowserCommand, Event, Origin, StreamDeckCommand, StreamDeckEventKind};

// ============================================================================
// ToggleState
// ============================================================================

/// Toggle button state indices, as laid out in the plugin manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ToggleState {
    /// No meeting to control.
    Disconnected = 0,
    /// Device muted / feature off.
    Muted = 1,
    /// Device live / feature on.
    Unmuted = 2,
}

impl ToggleState {
    /// Derives the state from a browser state-change notification.
    ///
    /// `disconnected` wins over `muted`.
    #[must_use]
    pub fn from_update(event: &Event) -> Self {
        if event.flag("disconnected") {
            Self::Disconnected
        } else if event.flag("muted") {
            Self::Muted
        } else {
            Self::Unmuted
        }
    }

    /// Manifest state index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }
}

// ============================================================================
// ToggleProfile
// ============================================================================

/// Everything that differs between toggle buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleProfile {
    /// Stream Deck action id.
    pub action: String,
    /// Browser command asking for the current state.
    pub request_event: String,
    /// Browser notification carrying a state change.
    pub update_event: String,
    /// Browser command flipping the state.
    pub toggle_event: String,
    /// Name for logs.
    pub friendly_name: String,
}

impl ToggleProfile {
    /// Creates a profile.
    #[must_use]
    pub fn new(
        action: impl Into<String>,
        request_event: impl Into<String>,
        update_event: impl Into<String>,
        toggle_event: impl Into<String>,
        friendly_name: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            request_event: request_event.into(),
            update_event: update_event.into(),
            toggle_event: toggle_event.into(),
            friendly_name: friendly_name.into(),
        }
    }
}

// ============================================================================
// ToggleListener
// ============================================================================

/// Listener for one toggle button type.
pub struct ToggleListener {
    profile: ToggleProfile,
    action: ActionMatch,
    outlets: Outlets,
    /// Visible button instances, in the order they appeared.
    contexts: Mutex<Vec<String>>,
}

impl ToggleListener {
    /// Creates a listener with no visible buttons.
    #[must_use]
    pub fn new(profile: ToggleProfile, outlets: Outlets) -> Self {
        Self {
            action: ActionMatch::Exact(profile.action.clone()),
            profile,
            outlets,
            contexts: Mutex::new(Vec::new()),
        }
    }

    /// Returns the tracked button contexts.
    #[must_use]
    pub fn contexts(&self) -> Vec<String> {
        self.contexts.lock().clone()
    }

    async fn on_stream_deck_event(&self, event: &Event) -> Result<()> {
        if !event.action().is_some_and(|a| self.action.matches(a)) {
            return Ok(());
        }

        match event.kind() {
            StreamDeckEventKind::KeyUp => self.key_up().await,
            StreamDeckEventKind::WillAppear => self.will_appear(event.context()).await,
            StreamDeckEventKind::WillDisappear => {
                self.will_disappear(event.context());
                Ok(())
            }
            StreamDeckEventKind::Other => Ok(()),
        }
    }

    async fn on_browser_event(&self, event: &Event) -> Result<()> {
        if event.name() != Some(self.profile.update_event.as_str()) {
            return Ok(());
        }
        self.set_state(ToggleState::from_update(event)).await
    }

    async fn key_up(&self) -> Result<()> {
        if self.outlets.browser.connection_count() == 0 {
            // Nothing to toggle; make sure the buttons say so.
            return self.set_state(ToggleState::Disconnected).await;
        }

        let toggle = BrowserCommand::simple(&self.profile.toggle_event).to_json()?;
        self.outlets.browser.broadcast(&toggle).await;
        Ok(())
    }

    async fn will_appear(&self, context: Option<&str>) -> Result<()> {
        if let Some(context) = context.filter(|c| !c.is_empty()) {
            let mut contexts = self.contexts.lock();
            if !contexts.iter().any(|c| c == context) {
                contexts.push(context.to_owned());
            }
            info!(
                context,
                active = contexts.len(),
                device = %self.profile.friendly_name,
                "Saved action context"
            );
        }

        // Assume there is no call until a browser tells us otherwise.
        // The state request goes out even if the button update failed.
        let reset = self.set_state(ToggleState::Disconnected).await;

        let request = BrowserCommand::simple(&self.profile.request_event).to_json()?;
        self.outlets.browser.broadcast(&request).await;
        reset
    }

    fn will_disappear(&self, context: Option<&str>) {
        let Some(context) = context else {
            return;
        };
        let mut contexts = self.contexts.lock();
        contexts.retain(|c| c != context);
        info!(
            context,
            active = contexts.len(),
            device = %self.profile.friendly_name,
            "Removed action context"
        );
    }

    /// Pushes `state` to every visible button, concurrently.
    ///
    /// Every button is attempted; the first failure is returned.
    async fn set_state(&self, state: ToggleState) -> Result<()> {
        let messages = self
            .contexts()
            .into_iter()
            .map(|context| StreamDeckCommand::set_state(context, state.index()).to_json())
            .collect::<Result<Vec<_>>>()?;

        debug!(
            device = %self.profile.friendly_name,
            ?state,
            buttons = messages.len(),
            "Setting toggle state"
        );

        let deck = &self.outlets.stream_deck;
        join_all(messages.iter().map(|m| deck.send_outbound_message(m)))
            .await
            .into_iter()
            .collect::<Result<Vec<()>>>()
            .map(|_| ())
    }
}

#[async_trait]
impl Listener for ToggleListener {
    fn name(&self) -> &str {
        &self.profile.action
    }

    async fn on_event(&self, event: &Event) -> Result<()> {
        match event.origin() {
            Origin::StreamDeck => self.on_stream_deck_event(event).await,
            Origin::Browser => self.on_browser_event(event).await,
        }
    }

    async fn on_all_peers_disconnected(&self) -> Result<()> {
        self.set_state(ToggleState::Disconnected).await
    }
}

// ============================================================================
// Tests
// ============================================================================
