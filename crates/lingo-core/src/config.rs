//! Configuration loading and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level Lingo configuration, loaded from a JSON5 file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// Remote generative-text service (Gemini) configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Model name (default: "gemini-2.0-flash").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Env var holding the API key (default: GOOGLE_API_KEY).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Optional system instruction sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl ConversationConfig {
    /// Resolve the API key: direct value first, then the env var reference,
    /// then the conventional GOOGLE_API_KEY variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(&self.api_key, &self.api_key_env)
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok().filter(|v| !v.is_empty()))
    }
}

/// Remote translation service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Voice mode configuration (speech recognition + narration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Enable the voice routes on the gateway (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recognition: Option<RecognitionConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<SynthesisConfig>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recognition: None,
            synthesis: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Speech recognition configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// BCP-47 language hint for the recognizer (default: "en-US").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl RecognitionConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(&self.api_key, &self.api_key_env)
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok().filter(|v| !v.is_empty()))
    }
}

/// Speech synthesis (narration) configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
}

fn default_port() -> u16 {
    7860
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "lingo_gateway=debug").
    #[serde(default)]
    pub filters: Vec<String>,
}

fn default_log_format() -> String {
    "plain".into()
}

/// Resolve a secret: check the direct value first, then the env-var reference.
pub fn resolve_secret_field(direct: &Option<String>, env_var: &Option<String>) -> Option<String> {
    if let Some(val) = direct {
        if !val.is_empty() {
            return Some(val.clone());
        }
    }
    if let Some(env) = env_var {
        if let Ok(val) = std::env::var(env) {
            if !val.is_empty() {
                return Some(val);
            }
        }
    }
    None
}

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .into_owned()
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(crate::error::LingoError::Io)?;
        let substituted = substitute_env_vars(&raw);

        let config: Config = json5::from_str(&substituted)
            .map_err(|e| crate::error::LingoError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Default config file location.
    pub fn default_path() -> PathBuf {
        data_dir().join("config.json")
    }

    pub fn gateway_port(&self) -> u16 {
        self.gateway.as_ref().map(|g| g.port).unwrap_or(7860)
    }

    pub fn model(&self) -> String {
        self.conversation
            .as_ref()
            .and_then(|c| c.model.clone())
            .unwrap_or_else(|| "gemini-2.0-flash".to_string())
    }

    pub fn voice_enabled(&self) -> bool {
        self.voice.as_ref().map(|v| v.enabled).unwrap_or(true)
    }

    pub fn recognition_language(&self) -> String {
        self.voice
            .as_ref()
            .and_then(|v| v.recognition.as_ref())
            .and_then(|r| r.language.clone())
            .unwrap_or_else(|| "en-US".to_string())
    }

    /// Resolve the Gemini API key, or fail with a startup-fatal config error.
    pub fn require_api_key(&self) -> crate::error::Result<String> {
        self.conversation
            .as_ref()
            .and_then(|c| c.resolve_api_key())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok().filter(|v| !v.is_empty()))
            .ok_or_else(|| {
                crate::error::LingoError::Config(
                    "No API key configured. Set conversation.api_key in config \
                     or the GOOGLE_API_KEY environment variable."
                        .into(),
                )
            })
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if self.require_api_key().is_err() {
            warnings.push("No Gemini API key configured (GOOGLE_API_KEY)".to_string());
        }

        if let Some(gw) = &self.gateway {
            if gw.port == 0 {
                errors.push("Gateway port cannot be 0".to_string());
            }
        }

        if self.voice_enabled()
            && self
                .voice
                .as_ref()
                .and_then(|v| v.recognition.as_ref())
                .map(|r| r.resolve_api_key().is_none())
                .unwrap_or(false)
        {
            warnings.push("Voice recognition enabled but no recognition API key set".to_string());
        }

        (warnings, errors)
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
}

/// Base directory for Lingo data: `~/.lingo/`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lingo")
}

/// Expand a `~`-prefixed path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        // SAFETY: test-only, single-threaded test runner
        unsafe { std::env::set_var("TEST_LINGO_KEY", "sk-test-123") };
        let input = r#"{"key": "${TEST_LINGO_KEY}", "other": "plain"}"#;
        let result = substitute_env_vars(input);
        assert!(result.contains("sk-test-123"));
        assert!(result.contains("plain"));
        unsafe { std::env::remove_var("TEST_LINGO_KEY") };
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gateway_port(), 7860);
        assert_eq!(config.model(), "gemini-2.0-flash");
        assert!(config.voice_enabled());
        assert_eq!(config.recognition_language(), "en-US");
    }

    #[test]
    fn test_resolve_api_key_direct_over_env() {
        // SAFETY: test-only, single-threaded test runner
        unsafe { std::env::set_var("TEST_LINGO_API_KEY", "from-env") };
        let conv = ConversationConfig {
            model: None,
            api_key: Some("direct-key".into()),
            api_key_env: Some("TEST_LINGO_API_KEY".into()),
            base_url: None,
            max_output_tokens: None,
            temperature: None,
            system_prompt: None,
        };
        assert_eq!(conv.resolve_api_key(), Some("direct-key".into()));

        let conv2 = ConversationConfig {
            api_key: None,
            ..conv
        };
        assert_eq!(conv2.resolve_api_key(), Some("from-env".into()));
        unsafe { std::env::remove_var("TEST_LINGO_API_KEY") };
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let saved = std::env::var("GOOGLE_API_KEY").ok();
        unsafe { std::env::remove_var("GOOGLE_API_KEY") };

        let config = Config::default();
        let err = config.require_api_key().unwrap_err();
        assert!(matches!(err, crate::error::LingoError::Config(_)));

        if let Some(val) = saved {
            unsafe { std::env::set_var("GOOGLE_API_KEY", val) };
        }
    }

    #[test]
    fn test_load_json5_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                // comments are fine in JSON5
                conversation: { model: "gemini-2.0-pro" },
                gateway: { port: 8123 },
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.model(), "gemini-2.0-pro");
        assert_eq!(config.gateway_port(), 8123);
    }

    #[test]
    fn test_validate_zero_port_errors() {
        let config = Config {
            gateway: Some(GatewayConfig {
                port: 0,
                bind: None,
            }),
            ..Config::default()
        };
        let (_warnings, errors) = config.validate();
        assert!(errors.iter().any(|e| e.contains("port")));
    }

    #[test]
    fn test_get_path() {
        let config = Config {
            gateway: Some(GatewayConfig {
                port: 9999,
                bind: None,
            }),
            ..Config::default()
        };
        assert_eq!(config.get_path("gateway.port"), Some(serde_json::json!(9999)));
        assert_eq!(config.get_path("gateway.nonexistent"), None);
    }
}
