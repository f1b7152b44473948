use serde::{Deserialize, Serialize};

fn default_schema_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigIntervals {
    /// Full pipeline poll; keep this near a second so title changes feel
    /// immediate.
    pub poll_ms: u64,
    /// Forced snapshot republish, a safety net for listener processes
    /// appearing or disappearing between detected changes.
    pub refresh_ms: u64,
    pub file_watch_poll_ms: u64,
}

impl Default for ConfigIntervals {
    fn default() -> Self {
        Self {
            poll_ms: 1_000,
            refresh_ms: 10_000,
            file_watch_poll_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub scrobbling_enabled: bool,
    pub history_limit: usize,
    pub intervals: ConfigIntervals,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            scrobbling_enabled: true,
            history_limit: 50,
            intervals: ConfigIntervals::default(),
            log_level: "info".to_string(),
        }
    }
}
