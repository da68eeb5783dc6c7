//! Composition root for listeners.
//!
//! Builds one listener per button type from the action table below and
//! registers every one of them with both brokers. Each listener filters
//! events itself, so registering everywhere is harmless.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::info;

use crate::dispatch::Listener;
use crate::handlers::{
    BrowserCommandListener, EmojiReactListener, OpenUrlListener, Outlets, ToggleListener,
    ToggleProfile,
};
use crate::transport::{ControlSurfaceLink, ExtensionHub};

// ============================================================================
// Action Table
// ============================================================================

/// Namespace of every action id in the plugin manifest.
pub const ACTION_NAMESPACE: &str = "com.chrisregado.googlemeet";

/// Landing page opened by the "open Meet" button.
pub const MEET_LANDING_URL: &str = "https://meet.google.com/landing";

/// Toggle buttons: (action suffix, request, update, toggle, friendly name).
const TOGGLES: &[(&str, &str, &str, &str, &str)] = &[
    ("togglemic", "getMicState", "micMutedState", "toggleMic", "Mic"),
    ("togglecamera", "getCameraState", "cameraMutedState", "toggleCamera", "Camera"),
    ("togglehand", "getHandState", "handMutedState", "toggleHand", "Hand"),
    ("togglecaptions", "getCaptionsState", "captionsMutedState", "toggleCaptions", "Captions"),
    (
        "togglepinpresentation",
        "getPinPresentationState",
        "pinPresentationMutedState",
        "togglePinPresentation",
        "Pin Presentation",
    ),
];

/// Stateless buttons: (action suffix, browser command).
const COMMANDS: &[(&str, &str)] = &[
    ("togglechat", "toggleChat"),
    ("toggleparticipants", "toggleParticipants"),
    ("leavecall", "leaveCall"),
    ("mutemic", "muteMic"),
    ("unmutemic", "unmuteMic"),
    ("enablecamera", "enableCamera"),
    ("disablecamera", "disableCamera"),
    ("togglezenmode", "toggleZenMode"),
];

/// Builds a full action id from its suffix.
#[must_use]
pub fn action_id(suffix: &str) -> String {
    format!("{ACTION_NAMESPACE}.{suffix}")
}

// ============================================================================
// HandlerRegistry
// ============================================================================

/// Owns every listener for the lifetime of the process.
pub struct HandlerRegistry {
    listeners: Vec<Arc<dyn Listener>>,
}

impl HandlerRegistry {
    /// Builds the standard set of listeners around `outlets`.
    #[must_use]
    pub fn standard(outlets: &Outlets) -> Self {
        let mut listeners: Vec<Arc<dyn Listener>> = Vec::new();

        for &(suffix, request, update, toggle, name) in TOGGLES {
            let profile = ToggleProfile::new(action_id(suffix), request, update, toggle, name);
            listeners.push(Arc::new(ToggleListener::new(profile, outlets.clone())));
        }

        for &(suffix, command) in COMMANDS {
            listeners.push(Arc::new(BrowserCommandListener::new(
                action_id(suffix),
                command,
                outlets.clone(),
            )));
        }

        listeners.push(Arc::new(EmojiReactListener::new(
            format!("{}.", action_id("emojireact")),
            outlets.clone(),
        )));
        listeners.push(Arc::new(OpenUrlListener::new(
            action_id("openmeet"),
            MEET_LANDING_URL,
            outlets.clone(),
        )));

        Self { listeners }
    }

    /// Registers every listener with both brokers.
    pub fn install(&self, hub: &ExtensionHub, link: &ControlSurfaceLink) {
        for listener in &self.listeners {
            hub.register_listener(Arc::clone(listener));
            link.register_listener(Arc::clone(listener));
        }
        info!(listeners = self.listeners.len(), "Event handlers registered");
    }

    /// Number of listeners.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if the registry holds no listeners.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Listener names, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.listeners.iter().map(|l| l.name()).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::dispatch::ListenerSet;
    use crate::handlers::testing::{browser_event, deck_event, outlets};

    #[test]
    fn test_standard_registry_covers_every_button() {
        let (outlets, _deck, _hub) = outlets(0);
        let registry = HandlerRegistry::standard(&outlets);

        assert_eq!(registry.len(), TOGGLES.len() + COMMANDS.len() + 2);
        let names = registry.names();
        assert!(names.contains(&"com.chrisregado.googlemeet.togglemic"));
        assert!(names.contains(&"com.chrisregado.googlemeet.emojireact."));
        assert!(names.contains(&"com.chrisregado.googlemeet.openmeet"));
    }

    #[tokio::test]
    async fn test_only_the_matching_listener_reacts() {
        let (outlets, deck, hub) = outlets(1);
        let registry = HandlerRegistry::standard(&outlets);
        let set = ListenerSet::new();
        for listener in &registry.listeners {
            set.register(Arc::clone(listener));
        }

        set.dispatch(&deck_event("keyUp", &action_id("togglecamera"), "ctx1"))
            .await;

        assert_eq!(*hub.broadcasts.lock(), vec![json!({"event": "toggleCamera"})]);
        assert!(deck.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_mic_round_trip_through_registry() {
        let (outlets, deck, hub) = outlets(0);
        let registry = HandlerRegistry::standard(&outlets);
        let set = ListenerSet::new();
        for listener in &registry.listeners {
            set.register(Arc::clone(listener));
        }

        set.dispatch(&deck_event("willAppear", &action_id("togglemic"), "ctx1"))
            .await;
        set.dispatch(&browser_event(r#"{"event":"micMutedState","muted":true}"#))
            .await;

        assert_eq!(
            *deck.sent.lock(),
            vec![
                json!({"event": "setState", "context": "ctx1", "payload": {"state": 0}}),
                json!({"event": "setState", "context": "ctx1", "payload": {"state": 1}}),
            ]
        );
        assert_eq!(*hub.broadcasts.lock(), vec![json!({"event": "getMicState"})]);
    }
}
