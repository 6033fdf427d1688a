//! Session configuration.
//!
//! [`SessionConfig`] is plain data with sensible defaults. It deserializes
//! from JSON with every field optional:
//!
//! ```ignore
//! let config = SessionConfig::from_json(r#"{ "ping_interval_ms": 1000, "ids": "sequential" }"#)?;
//! ```

use std::time::Duration;

use serde::Deserialize;

/// Depth bound for nested batches before `CycleDetected` is raised.
pub const DEFAULT_MAX_BATCH_DEPTH: usize = 50;

/// How often the session pings the client.
pub const DEFAULT_PING_INTERVAL_MS: u64 = 5_000;

// =============================================================================
// Offset units
// =============================================================================

/// Unit used for offsets and counts in text splicing patches.
///
/// The diff always runs over Unicode scalar values; this only controls how
/// positions are expressed on the wire. DOM `CharacterData` methods count
/// UTF-16 code units, hence the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetUnit {
    #[default]
    Utf16,
    Scalar,
}

impl OffsetUnit {
    /// Width of one scalar value in this unit.
    pub fn width(self, c: char) -> usize {
        match self {
            OffsetUnit::Utf16 => c.len_utf16(),
            OffsetUnit::Scalar => 1,
        }
    }

    /// Width of a run of scalar values in this unit.
    pub fn measure(self, chars: &[char]) -> usize {
        chars.iter().map(|&c| self.width(c)).sum()
    }
}

// =============================================================================
// Id strategy
// =============================================================================

/// How DOM ids, handler ids and session ids are generated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Random alphanumeric ids of the configured lengths.
    #[default]
    Random,
    /// Counters (`n1`, `n2`, ... / `h1`, `h2`, ...). Deterministic, for tests.
    Sequential,
}

// =============================================================================
// SessionConfig
// =============================================================================

/// Per-session settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Nested batch depth at which `CycleDetected` is raised.
    pub max_batch_depth: usize,
    /// Interval between `Ping` patches.
    pub ping_interval_ms: u64,
    /// Units for text splice offsets.
    pub text_offsets: OffsetUnit,
    pub ids: IdStrategy,
    pub dom_id_len: usize,
    pub handler_id_len: usize,
    pub session_id_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_batch_depth: DEFAULT_MAX_BATCH_DEPTH,
            ping_interval_ms: DEFAULT_PING_INTERVAL_MS,
            text_offsets: OffsetUnit::default(),
            ids: IdStrategy::default(),
            dom_id_len: 5,
            handler_id_len: 32,
            session_id_len: 32,
        }
    }
}

impl SessionConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Same config with deterministic sequential ids.
    pub fn with_sequential_ids(mut self) -> Self {
        self.ids = IdStrategy::Sequential;
        self
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }
}
