//! Process configuration.
//!
//! The Stream Deck host launches plugins as
//!
//! ```text
//! plugin -port 28196 -pluginUUID 5A7B... -registerEvent registerPlugin -info {...}
//! ```
//!
//! i.e. with single-dash long flags. Those are rewritten to `--flag` form
//! before handing them to `clap`. Flags this build does not know are
//! dropped so a newer host can add arguments without breaking us.
//!
//! # Example
//!
//! ```ignore
//! use meet_deck_bridge::BridgeConfig;
//!
//! let config = BridgeConfig::from_args(std::env::args())?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::IpAddr;

use clap::Parser;

use crate::error::{Error, Result};
use crate::transport::{DEFAULT_BIND_IP, DEFAULT_BROWSER_PORT};

// ============================================================================
// Constants
// ============================================================================

/// Flags taking a value.
const VALUE_FLAGS: &[&str] = &["port", "pluginUUID", "registerEvent", "info", "browserPort"];

/// Flags without a value.
const SWITCH_FLAGS: &[&str] = &["debug", "help", "version"];

// ============================================================================
// Cli
// ============================================================================

/// Stream Deck Google Meet plugin.
#[derive(Debug, Parser)]
#[command(name = "meet-deck-bridge", version, about)]
struct Cli {
    /// Port of the Stream Deck host websocket.
    #[arg(long = "port")]
    port: u16,

    /// Plugin instance UUID, echoed back at registration.
    #[arg(long = "pluginUUID")]
    plugin_uuid: String,

    /// Event name to register with.
    #[arg(long = "registerEvent")]
    register_event: String,

    /// Host and device description (JSON), unused.
    #[arg(long = "info")]
    info: Option<String>,

    /// Port the browser extension connects to.
    #[arg(long = "browserPort", default_value_t = DEFAULT_BROWSER_PORT)]
    browser_port: u16,

    /// Verbose logging.
    #[arg(long = "debug")]
    debug: bool,
}

// ============================================================================
// BridgeConfig
// ============================================================================

/// Everything the bridge needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Address the browser server binds to.
    pub browser_ip: IpAddr,

    /// Port the browser server binds to.
    pub browser_port: u16,

    /// Port of the Stream Deck host on loopback.
    pub stream_deck_port: u16,

    /// Plugin instance UUID.
    pub plugin_uuid: String,

    /// Registration event name.
    pub register_event: String,

    /// Raw `-info` JSON, kept for diagnostics.
    pub info: Option<String>,

    /// Verbose logging requested.
    pub debug: bool,
}

impl BridgeConfig {
    /// Creates a config with the browser server on its default address.
    #[must_use]
    pub fn new(
        stream_deck_port: u16,
        plugin_uuid: impl Into<String>,
        register_event: impl Into<String>,
    ) -> Self {
        Self {
            browser_ip: DEFAULT_BIND_IP,
            browser_port: DEFAULT_BROWSER_PORT,
            stream_deck_port,
            plugin_uuid: plugin_uuid.into(),
            register_event: register_event.into(),
            info: None,
            debug: false,
        }
    }

    /// Parses process arguments (including the program name).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required flag is missing or a value
    /// does not parse. `--help` / `--version` also surface as errors whose
    /// message is the rendered text.
    pub fn from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let cli = Cli::try_parse_from(normalize_args(args))
            .map_err(|e| Error::config(e.to_string()))?;

        Ok(Self {
            browser_ip: DEFAULT_BIND_IP,
            browser_port: cli.browser_port,
            stream_deck_port: cli.port,
            plugin_uuid: cli.plugin_uuid,
            register_event: cli.register_event,
            info: cli.info,
            debug: cli.debug,
        })
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BridgeConfig {
    /// Sets the browser server port (0 for random).
    #[inline]
    #[must_use]
    pub fn with_browser_port(mut self, port: u16) -> Self {
        self.browser_port = port;
        self
    }

    /// Enables verbose logging.
    #[inline]
    #[must_use]
    pub fn with_debug(mut self) -> Self {
        self.debug = true;
        self
    }
}

// ============================================================================
// Argument Normalization
// ============================================================================

/// Rewrites `-flag` to `--flag` and drops unknown flags with their value.
///
/// The first argument (program name) is kept as-is.
fn normalize_args<I, T>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut out: Vec<String> = args.next().into_iter().collect();
    let mut args = args.peekable();

    while let Some(arg) = args.next() {
        let Some(name) = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) else {
            // Stray positional; let clap reject it.
            out.push(arg);
            continue;
        };

        if VALUE_FLAGS.contains(&name) {
            out.push(format!("--{name}"));
            if let Some(value) = args.next() {
                out.push(value);
            }
        } else if SWITCH_FLAGS.contains(&name) {
            out.push(format!("--{name}"));
        } else if args.peek().is_some_and(|next| !next.starts_with('-')) {
            args.next();
        }
    }

    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    const HOST_ARGS: &[&str] = &[
        "plugin",
        "-port",
        "28196",
        "-pluginUUID",
        "5A7B-UUID",
        "-registerEvent",
        "registerPlugin",
        "-info",
        r#"{"application":{"version":"6.0"}}"#,
    ];

    #[test]
    fn test_parse_stream_deck_launch_args() {
        let config = BridgeConfig::from_args(HOST_ARGS.iter().copied()).expect("parse");

        assert_eq!(config.stream_deck_port, 28196);
        assert_eq!(config.plugin_uuid, "5A7B-UUID");
        assert_eq!(config.register_event, "registerPlugin");
        assert_eq!(config.info.as_deref(), Some(r#"{"application":{"version":"6.0"}}"#));
        assert_eq!(config.browser_port, DEFAULT_BROWSER_PORT);
        assert_eq!(config.browser_ip, DEFAULT_BIND_IP);
        assert!(!config.debug);
    }

    #[test]
    fn test_unknown_flags_are_ignored() {
        let mut args: Vec<&str> = HOST_ARGS.to_vec();
        args.extend(["-futureFlag", "value", "-debug"]);

        let config = BridgeConfig::from_args(args).expect("parse");
        assert!(config.debug);
    }

    #[test]
    fn test_double_dash_also_accepted() {
        let config = BridgeConfig::from_args([
            "plugin",
            "--port",
            "1",
            "--pluginUUID",
            "u",
            "--registerEvent",
            "r",
            "--browserPort",
            "0",
        ])
        .expect("parse");

        assert_eq!(config.browser_port, 0);
        assert_eq!(config.info, None);
    }

    #[test]
    fn test_missing_required_flag() {
        let err = BridgeConfig::from_args(["plugin", "-port", "1"]).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_bad_port_value() {
        let err = BridgeConfig::from_args([
            "plugin",
            "-port",
            "not-a-port",
            "-pluginUUID",
            "u",
            "-registerEvent",
            "r",
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_builder_methods() {
        let config = BridgeConfig::new(1, "u", "r")
            .with_browser_port(0)
            .with_debug();
        assert_eq!(config.browser_port, 0);
        assert!(config.debug);
    }

    proptest! {
        #[test]
        fn normalized_known_flags_use_double_dash(port in 1u16.., uuid in "[A-Z0-9-]{1,36}") {
            let port = port.to_string();
            let out = normalize_args(["p", "-port", port.as_str(), "-pluginUUID", uuid.as_str()]);
            prop_assert_eq!(out, vec![
                "p".to_string(), "--port".to_string(), port.clone(),
                "--pluginUUID".to_string(), uuid.clone(),
            ]);
        }
    }
}
