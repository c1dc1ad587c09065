use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_PORT: u16 = 4600;
const DEFAULT_AI_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_AI_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;
const DEFAULT_AI_MAX_TOKENS: u32 = 2048;
const DEFAULT_SESSION_TTL_HOURS: u32 = 72;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── AiConfig ────────────────────────────────────────────────────────────────

/// AI model configuration (`[ai]` in config.toml).
///
/// The API key is read from the `RAPIDD_AI_KEY` environment variable when set,
/// falling back to `api_key` in the config file. An empty key switches report
/// generation to the deterministic static model.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AiConfig {
    /// Messages-API endpoint URL.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// API key. Prefer `RAPIDD_AI_KEY` over committing this to disk.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds (default: 60).
    pub timeout_secs: u64,
    /// Maximum tokens per generated section (default: 2048).
    pub max_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AI_BASE_URL.to_string(),
            model: DEFAULT_AI_MODEL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
            max_tokens: DEFAULT_AI_MAX_TOKENS,
        }
    }
}

impl AiConfig {
    /// Resolved API key: env var wins over the config file. None = no key.
    pub fn resolved_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var("RAPIDD_AI_KEY") {
            if !key.is_empty() {
                return Some(key);
            }
        }
        self.api_key.clone().filter(|k| !k.is_empty())
    }
}

// ─── RetentionConfig ─────────────────────────────────────────────────────────

/// Data retention configuration (`[retention]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Auth session lifetime in hours (default: 72).
    pub session_ttl_hours: u32,
    /// Delete draft assessments untouched for this many days. 0 = keep forever.
    pub draft_prune_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            draft_prune_days: 0,
        }
    }
}

// ─── ServerConfig ────────────────────────────────────────────────────────────

/// Top-level daemon configuration.
///
/// Precedence: built-in defaults < `config.toml` in the data directory <
/// CLI flags / environment variables (applied by `main.rs` after load).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP API port.
    pub port: u16,
    /// Bind address (default: 127.0.0.1; use 0.0.0.0 to serve the LAN).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Data directory for the SQLite database and config file.
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub ai: AiConfig,
    pub retention: RetentionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: default_bind_address(),
            data_dir: PathBuf::new(),
            ai: AiConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `{data_dir}/config.toml`, falling back to
    /// defaults when the file is absent. A malformed file is reported and
    /// ignored rather than aborting startup.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("config.toml");
        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<ServerConfig>(&contents) {
                Ok(c) => c,
                Err(e) => {
                    warn!("config.toml is invalid, using defaults: {e}");
                    ServerConfig::default()
                }
            },
            Err(_) => ServerConfig::default(),
        };
        config.data_dir = data_dir.to_path_buf();
        config
    }

    /// Default data directory: `~/.rapidd` (or `./.rapidd` if no home dir).
    pub fn default_data_dir() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rapidd")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = ServerConfig::default();
        assert_eq!(c.port, 4600);
        assert_eq!(c.bind_address, "127.0.0.1");
        assert_eq!(c.retention.session_ttl_hours, 72);
        assert_eq!(c.retention.draft_prune_days, 0);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: ServerConfig =
            toml::from_str("port = 9000\n[ai]\nmodel = \"test-model\"\n").expect("parse");
        assert_eq!(c.port, 9000);
        assert_eq!(c.ai.model, "test-model");
        assert_eq!(c.ai.timeout_secs, 60);
        assert_eq!(c.retention.session_ttl_hours, 72);
    }
}
