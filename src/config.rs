//! Configuration for buildmedic
//!
//! All settings are read once from the environment into a [`MedicConfig`],
//! optionally overridden by command line flags, validated, and then handed to
//! the components that need them. No other module reads the environment.
//!
//! # Environment Variables
//!
//! - `PROJECT_TYPE`: project category (nodejs|python|java|go|rust|unknown) - default: "unknown"
//! - `MAX_ERROR_LENGTH`: characters of transcript sent for remote analysis - default: "10000"
//! - `BUILDMEDIC_PROVIDER`: openai, ollama, claude, gemini, grok or groq - default: "openai"
//! - `AI_MODEL`: model name - default: "gpt-4-turbo-preview"
//! - `BUILDMEDIC_API_KEY`: credential; falls back to the provider's own variable
//!   (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, ...). Without one, remote analysis is disabled.
//! - `BUILDMEDIC_API_BASE_URL`: endpoint override
//! - `BUILDMEDIC_REQUEST_TIMEOUT`: timeout in seconds - default: "60"
//! - `BUILDMEDIC_TAB_WIDTH`: spaces per tab when normalizing - default: "4"
//! - `BUILDMEDIC_LOG_LEVEL`: logging level - default: "info"
//! - `BUILDMEDIC_LOG_JSON`: JSON log output (true|false) - default: "false"

use crate::llm::{BackendError, GenAIClient, LLMClient};
use crate::project::ProjectKind;
use crate::util::logging::{parse_level, LoggingConfig};
use genai::adapter::AdapterKind;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default values for configuration
const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_MAX_TRANSCRIPT_CHARS: usize = 10_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TAB_WIDTH: usize = 4;
const MAX_TRANSCRIPT_CHARS_LIMIT: usize = 10_485_760;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: openai, ollama, claude, gemini, grok, groq")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error("Backend initialization failed: {0}")]
    BackendInitError(#[from] BackendError),
}

/// Parses a provider name, accepting the common vendor aliases.
pub fn parse_provider(name: &str) -> Result<AdapterKind, ConfigError> {
    let lower = name.trim().to_lowercase();
    let canonical = match lower.as_str() {
        "claude" => "anthropic",
        "grok" => "xai",
        other => other,
    };
    AdapterKind::from_lower_str(canonical)
        .ok_or_else(|| ConfigError::InvalidProvider(name.to_string()))
}

#[derive(Clone)]
pub struct MedicConfig {
    pub project: ProjectKind,

    /// Hard cap on transcript characters sent for remote analysis
    pub max_transcript_chars: usize,

    pub provider: AdapterKind,
    pub model: String,

    /// Remote analysis is disabled when this is `None`
    pub api_key: Option<String>,

    pub base_url: Option<String>,
    pub request_timeout_secs: u64,

    /// Spaces written in place of each tab during normalization
    pub tab_width: usize,

    pub log_level: String,
    pub log_json: bool,
}

impl Default for MedicConfig {
    fn default() -> Self {
        Self {
            project: ProjectKind::Unknown,
            max_transcript_chars: DEFAULT_MAX_TRANSCRIPT_CHARS,
            provider: AdapterKind::OpenAI,
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            tab_width: DEFAULT_TAB_WIDTH,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    field: &str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::ParseError {
            field: field.to_string(),
            error: format!("'{}': {}", raw, e),
        }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl MedicConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let project = match non_empty(lookup("PROJECT_TYPE")) {
            Some(raw) => raw.parse::<ProjectKind>().map_err(|error| ConfigError::ParseError {
                field: "PROJECT_TYPE".to_string(),
                error,
            })?,
            None => ProjectKind::Unknown,
        };

        let provider = match non_empty(lookup("BUILDMEDIC_PROVIDER")) {
            Some(raw) => parse_provider(&raw)?,
            None => AdapterKind::OpenAI,
        };

        let model = non_empty(lookup("AI_MODEL")).unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_key = non_empty(lookup("BUILDMEDIC_API_KEY")).or_else(|| {
            provider
                .default_key_env_name()
                .and_then(|name| non_empty(lookup(name)))
        });

        let log_json = non_empty(lookup("BUILDMEDIC_LOG_JSON"))
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Ok(Self {
            project,
            max_transcript_chars: parse_number(
                "MAX_ERROR_LENGTH",
                non_empty(lookup("MAX_ERROR_LENGTH")),
                DEFAULT_MAX_TRANSCRIPT_CHARS,
            )?,
            provider,
            model,
            api_key,
            base_url: non_empty(lookup("BUILDMEDIC_API_BASE_URL")),
            request_timeout_secs: parse_number(
                "BUILDMEDIC_REQUEST_TIMEOUT",
                non_empty(lookup("BUILDMEDIC_REQUEST_TIMEOUT")),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            tab_width: parse_number(
                "BUILDMEDIC_TAB_WIDTH",
                non_empty(lookup("BUILDMEDIC_TAB_WIDTH")),
                DEFAULT_TAB_WIDTH,
            )?,
            log_level: non_empty(lookup("BUILDMEDIC_LOG_LEVEL"))
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
            log_json,
        })
    }

    /// Validates the configuration
    ///
    /// Checks that numeric values are in range and the log level is known.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_transcript_chars == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max transcript length must be at least 1 character".to_string(),
            ));
        }
        if self.max_transcript_chars > MAX_TRANSCRIPT_CHARS_LIMIT {
            return Err(ConfigError::ValidationFailed(format!(
                "Max transcript length cannot exceed {} characters",
                MAX_TRANSCRIPT_CHARS_LIMIT
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if !(1..=16).contains(&self.tab_width) {
            return Err(ConfigError::ValidationFailed(format!(
                "Tab width must be between 1 and 16, got {}",
                self.tab_width
            )));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn remote_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Creates the remote analysis client, or `None` when no credential is
    /// configured.
    pub fn create_client(&self) -> Result<Option<Arc<dyn LLMClient>>, ConfigError> {
        let Some(api_key) = &self.api_key else {
            return Ok(None);
        };

        let client = GenAIClient::new(
            self.provider,
            self.model.clone(),
            api_key.clone(),
            self.base_url.clone(),
            self.request_timeout(),
        )?;
        Ok(Some(Arc::new(client)))
    }

    /// Subscriber settings for this configuration. JSON output switches to
    /// the production layout with source locations and thread ids.
    pub fn logging(&self) -> LoggingConfig {
        let level = parse_level(&self.log_level);
        if self.log_json {
            LoggingConfig {
                level,
                ..LoggingConfig::production()
            }
        } else {
            LoggingConfig::with_level(level)
        }
    }

    /// The credential reduced to its last four characters.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_ref().map(|key| mask_secret(key))
    }

    /// Converts configuration to a display map for output formatting
    pub fn to_display_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();

        map.insert("project".to_string(), self.project.to_string());
        map.insert(
            "max_transcript_chars".to_string(),
            self.max_transcript_chars.to_string(),
        );
        map.insert("provider".to_string(), self.provider.as_str().to_string());
        map.insert("model".to_string(), self.model.clone());
        map.insert(
            "api_key".to_string(),
            self.masked_api_key().unwrap_or_else(|| "(not set)".to_string()),
        );
        if let Some(ref url) = self.base_url {
            map.insert("base_url".to_string(), url.clone());
        }
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout_secs.to_string(),
        );
        map.insert("tab_width".to_string(), self.tab_width.to_string());
        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert("log_json".to_string(), self.log_json.to_string());

        map
    }
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

impl fmt::Debug for MedicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MedicConfig")
            .field("project", &self.project)
            .field("max_transcript_chars", &self.max_transcript_chars)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.masked_api_key())
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("tab_width", &self.tab_width)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl fmt::Display for MedicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Buildmedic Configuration:")?;
        writeln!(f, "  Project: {}", self.project)?;
        writeln!(f, "  Max Transcript Length: {} chars", self.max_transcript_chars)?;
        writeln!(f, "  Provider: {}", self.provider.as_str())?;
        writeln!(f, "  Model: {}", self.model)?;
        match self.masked_api_key() {
            Some(key) => writeln!(f, "  API Key: {}", key)?,
            None => writeln!(f, "  API Key: (not set, remote analysis disabled)")?,
        }
        if let Some(ref url) = self.base_url {
            writeln!(f, "  Base URL: {}", url)?;
        }
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Tab Width: {}", self.tab_width)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
