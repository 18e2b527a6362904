use serde::{Deserialize, Serialize};

fn default_schema_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigIntervals {
    pub position_poll_ms: u64,
    pub remote_load_timeout_ms: u64,
    pub restart_threshold_ms: u64,
    pub http_timeout_ms: u64,
}

impl Default for ConfigIntervals {
    fn default() -> Self {
        Self {
            position_poll_ms: 250,
            remote_load_timeout_ms: 3_000,
            restart_threshold_ms: 10_000,
            http_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedConfig {
    pub track_secs: u64,
    pub load_latency_ms: u64,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            track_secs: 210,
            load_latency_ms: 150,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub api_base_url: String,
    pub remote_sync: bool,
    pub transport: String,
    pub intervals: ConfigIntervals,
    #[serde(default)]
    pub simulated: SimulatedConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            api_base_url: "http://localhost:5000".to_string(),
            remote_sync: true,
            transport: "simulated".to_string(),
            intervals: ConfigIntervals::default(),
            simulated: SimulatedConfig::default(),
            data_dir: None,
            log_level: "info".to_string(),
        }
    }
}
