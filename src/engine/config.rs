//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Key snapshots are stored under unless configured otherwise.
pub const DEFAULT_PERSIST_KEY: &str = "waypoint.snapshot";

/// Tunables for a [`TransitionEngine`](super::TransitionEngine).
///
/// Every field has a default, so partial JSON works:
///
/// ```rust
/// use waypoint::engine::EngineConfig;
///
/// let config: EngineConfig = serde_json::from_str(r#"{"historyLimit": 50}"#).unwrap();
/// assert_eq!(config.history_limit, Some(50));
/// assert_eq!(config.persist_key, "waypoint.snapshot");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Store key for snapshots
    pub persist_key: String,

    /// Maximum number of history entries kept; oldest are dropped first
    pub history_limit: Option<usize>,

    /// Save a snapshot after back, forward and go-to as well as after transitions
    pub persist_time_travel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            persist_key: DEFAULT_PERSIST_KEY.to_string(),
            history_limit: None,
            persist_time_travel: true,
        }
    }
}
