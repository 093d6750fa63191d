//! Bridge configuration.

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables shared by the core and the language-service connector.
///
/// Every field has a default, so hosts only spell out what they change:
///
/// ```rust
/// use editor_bridge::BridgeConfig;
///
/// let config = BridgeConfig::from_json_str(r#"{ "handshakeDelayMs": 250 }"#).unwrap();
/// assert_eq!(config.handshake_delay_ms, 250);
/// assert_eq!(config.baseline_prefix, "original://");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Prefix placed in front of a model URI to name its baseline model.
    pub baseline_prefix: String,
    /// Owner id for markers the bridge itself manages.
    pub marker_owner: String,
    /// Compare lines ignoring leading/trailing whitespace when computing dirty diffs.
    pub ignore_trim_whitespace: bool,
    /// Wall-clock ceiling for a single diff computation.
    pub diff_time_budget_ms: u64,
    /// Wait between sending the handshake and starting the protocol client.
    pub handshake_delay_ms: u64,
    /// Socket read timeout used by the connector's I/O thread between outbound flushes.
    pub socket_poll_interval_ms: u64,
    /// Client name reported to language servers.
    pub client_name: String,
    /// Release the soft-keyboard helper as soon as a surface is mounted.
    pub disable_soft_keyboard: bool,
    /// Maximum undo steps kept per model.
    pub max_undo_steps: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            baseline_prefix: "original://".to_string(),
            marker_owner: "code.app.native".to_string(),
            ignore_trim_whitespace: true,
            diff_time_budget_ms: 1000,
            handshake_delay_ms: 5000,
            socket_poll_interval_ms: 20,
            client_name: "editor-bridge".to_string(),
            disable_soft_keyboard: true,
            max_undo_steps: 1000,
        }
    }
}

impl BridgeConfig {
    /// Parse a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, BridgeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Diff time budget as a [`Duration`].
    pub fn diff_time_budget(&self) -> Duration {
        Duration::from_millis(self.diff_time_budget_ms)
    }

    /// Handshake delay as a [`Duration`].
    pub fn handshake_delay(&self) -> Duration {
        Duration::from_millis(self.handshake_delay_ms)
    }

    /// Socket poll interval as a [`Duration`] (never zero).
    pub fn socket_poll_interval(&self) -> Duration {
        Duration::from_millis(self.socket_poll_interval_ms.max(1))
    }
}
