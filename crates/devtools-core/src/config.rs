//! Configuration loading and validation.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DevtoolsError, Result};

/// Top-level devtools-claw configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<BrowserConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// HTTP server that hosts artifacts and the tool endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bind address (default: 127.0.0.1).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Port to listen on. `0` picks a free port at bind time.
    #[serde(default)]
    pub port: u16,
}

/// Browser automation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Path to Chrome/Chromium binary (auto-detected if omitted).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<String>,

    /// Run in headless mode (default: true).
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Page operation timeout in ms, also the default `wait_for` timeout (default: 30000).
    #[serde(default = "default_browser_timeout")]
    pub timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            timeout_ms: default_browser_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_browser_timeout() -> u64 {
    30_000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// HTML extraction tool configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<HtmlToolConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlToolConfig {
    /// Cleaned HTML up to this many characters is returned inline; anything
    /// longer is saved as an artifact (default: 2000).
    #[serde(default = "default_inline_limit")]
    pub inline_limit: usize,

    /// Directory for saved HTML artifacts (default: `<data dir>/tmp`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<String>,
}

fn default_inline_limit() -> usize {
    2_000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "devtools_tools=debug").
    #[serde(default)]
    pub filters: Vec<String>,

    /// Output target: "stderr" (default) or "stdout".
    #[serde(default = "default_log_output")]
    pub output: String,
}

fn default_log_format() -> String {
    "plain".into()
}

fn default_log_output() -> String {
    "stderr".into()
}

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(input, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let substituted = substitute_env_vars(&raw);

        json5::from_str(&substituted).map_err(|e| DevtoolsError::Config(e.to_string()))
    }

    /// Default config file location.
    pub fn config_path() -> PathBuf {
        data_dir().join("config.json")
    }

    /// Gateway bind address.
    pub fn gateway_bind(&self) -> String {
        self.gateway
            .as_ref()
            .and_then(|g| g.bind.clone())
            .unwrap_or_else(|| "127.0.0.1".to_string())
    }

    /// Gateway port (0 = ephemeral).
    pub fn gateway_port(&self) -> u16 {
        self.gateway.as_ref().map(|g| g.port).unwrap_or(0)
    }

    /// Default timeout for `wait_for` when the caller gives none.
    pub fn wait_timeout(&self) -> Duration {
        let ms = self
            .browser
            .as_ref()
            .map(|b| b.timeout_ms)
            .unwrap_or_else(default_browser_timeout);
        Duration::from_millis(ms)
    }

    /// Maximum cleaned-HTML length returned inline.
    pub fn html_inline_limit(&self) -> usize {
        self.tools
            .as_ref()
            .and_then(|t| t.html.as_ref())
            .map(|h| h.inline_limit)
            .unwrap_or_else(default_inline_limit)
    }

    /// Directory that receives saved artifacts and is served under `/tmp`.
    pub fn artifact_dir(&self) -> PathBuf {
        self.tools
            .as_ref()
            .and_then(|t| t.html.as_ref())
            .and_then(|h| h.artifact_dir.as_ref())
            .map(|d| PathBuf::from(shellexpand::tilde(d).as_ref()))
            .unwrap_or_else(|| data_dir().join("tmp"))
    }

    /// Get a config value by dotted path (e.g. "gateway.port").
    pub fn get_path(&self, path: &str) -> Option<serde_json::Value> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current.clone())
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if let Some(browser) = &self.browser {
            if browser.timeout_ms == 0 {
                errors.push("Browser timeout_ms cannot be 0".to_string());
            }
            if let Some(path) = &browser.chrome_path {
                if !Path::new(path).exists() {
                    warnings.push(format!("Chrome binary not found: {path}"));
                }
            }
        }

        if let Some(logging) = &self.logging {
            if logging.format != "plain" && logging.format != "json" {
                warnings.push(format!(
                    "Unknown log format '{}', falling back to plain",
                    logging.format
                ));
            }
        }

        (warnings, errors)
    }
}

/// Base directory for devtools-claw data: `~/.devtools_claw/`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".devtools_claw")
}
