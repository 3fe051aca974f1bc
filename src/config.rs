use anyhow::{Result, anyhow};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::llm_providers::{OllamaProvider, OpenAIProvider};

// Import logging macros
use crate::{log_system_event, log_validation};

/// Complete application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LLMConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Deployment mode controlling debug logging and static asset reloading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" | "debug" => Environment::Development,
            _ => Environment::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

/// Primary and local model configuration
#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub local_endpoint: String,
    pub local_model: String,
    pub timeout: Duration,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub environment: Environment,
    pub static_dir: PathBuf,
}

/// Topic list persistence
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub topics_file: PathBuf,
}

/// Logging system configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_directory: String,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        log_system_event!(config, "Loading application configuration from environment variables");

        let config = Self::from_lookup(|key| env::var(key).ok())?;

        log_system_event!(config, "Configuration loaded successfully");
        Ok(config)
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerConfig::from_lookup(&lookup)?;
        let llm = LLMConfig::from_lookup(&lookup)?;
        let storage = StorageConfig::from_lookup(&lookup);
        let logging = LoggingConfig::from_lookup(&lookup, server.environment);

        Ok(Config {
            llm,
            server,
            storage,
            logging,
        })
    }

    /// Log a summary of loaded configuration (without sensitive data)
    pub fn log_configuration_summary(&self) {
        info!(
            api_key_masked = %mask_sensitive_data(&self.llm.api_key),
            llm_model = ?self.llm.model,
            local_endpoint = %self.llm.local_endpoint,
            local_model = %self.llm.local_model,
            server_address = %format!("{}:{}", self.server.host, self.server.port),
            environment = ?self.server.environment,
            topics_file = %self.storage.topics_file.display(),
            log_level = %self.logging.level,
            "Configuration summary"
        );
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("Server port must be greater than 0"));
        }

        let endpoint = &self.llm.local_endpoint;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(anyhow!(
                "OLLAMA_ENDPOINT must start with 'http://' or 'https://', got '{}'",
                endpoint
            ));
        }

        if self.llm.api_key.trim().is_empty() {
            warn!("OPENAI_API_KEY is not set - every request will be served by the local model");
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }
}

impl LLMConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY").unwrap_or_default();
        let base_url = non_empty(lookup("OPENAI_BASE_URL"));
        let model = non_empty(lookup("OPENAI_MODEL"));

        let local_endpoint = non_empty(lookup("OLLAMA_ENDPOINT"))
            .unwrap_or_else(|| OllamaProvider::DEFAULT_ENDPOINT.to_string());
        let local_model = non_empty(lookup("OLLAMA_MODEL"))
            .unwrap_or_else(|| OllamaProvider::DEFAULT_MODEL.to_string());

        let timeout_str = lookup("LLM_TIMEOUT_SECS").unwrap_or_else(|| "60".to_string());
        let timeout_secs = timeout_str.parse::<u64>().map_err(|_| {
            anyhow!("Invalid LLM_TIMEOUT_SECS value: '{}'. Must be a whole number of seconds", timeout_str)
        })?;

        Ok(LLMConfig {
            api_key,
            base_url,
            model,
            local_endpoint,
            local_model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn primary_model(&self) -> &str {
        self.model.as_deref().unwrap_or(OpenAIProvider::DEFAULT_MODEL)
    }
}

impl ServerConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port_str = lookup("PORT").unwrap_or_else(|| "5000".to_string());

        let port = port_str.parse::<u16>().map_err(|_| {
            anyhow!("Invalid PORT value: '{}'. Must be a number between 1-65535", port_str)
        })?;

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let environment = Environment::parse(
            &lookup("APP_ENV").unwrap_or_else(|| "production".to_string()),
        );

        let static_dir = PathBuf::from(lookup("STATIC_DIR").unwrap_or_else(|| "static".to_string()));

        Ok(ServerConfig {
            port,
            host,
            environment,
            static_dir,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StorageConfig {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let topics_file = lookup("TOPICS_FILE").unwrap_or_else(|| "topics.json".to_string());

        StorageConfig {
            topics_file: PathBuf::from(topics_file),
        }
    }
}

impl LoggingConfig {
    fn from_lookup<F>(lookup: &F, environment: Environment) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_level = if environment.is_development() {
            "debug"
        } else {
            "info,quiz_tutor=debug"
        };
        let level = lookup("RUST_LOG").unwrap_or_else(|| default_level.to_string());

        let file_enabled = lookup("LOG_FILE_ENABLED")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true);

        let console_enabled = lookup("LOG_CONSOLE_ENABLED")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true);

        let log_directory = lookup("LOG_DIRECTORY").unwrap_or_else(|| "logs".to_string());

        LoggingConfig {
            level,
            file_enabled,
            console_enabled,
            log_directory,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Mask sensitive data in configuration for safe logging
fn mask_sensitive_data(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}***{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_mask_sensitive_data() {
        assert_eq!(mask_sensitive_data("short"), "*****");
        assert_eq!(mask_sensitive_data("sk-1234567890abcdef"), "sk-1***cdef");
        assert_eq!(mask_sensitive_data(""), "");
    }

    #[test]
    fn test_mask_sensitive_data_multibyte() {
        assert_eq!(mask_sensitive_data("ék-1234567890abcdé"), "ék-1***bcdé");
        assert_eq!(mask_sensitive_data("日本語キー"), "*****");
        assert_eq!(mask_sensitive_data("€€€€xxxxx€€€€"), "€€€€***€€€€");
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.environment, Environment::Production);
        assert_eq!(config.server.static_dir, PathBuf::from("static"));
        assert_eq!(config.llm.api_key, "");
        assert_eq!(config.llm.local_endpoint, "http://127.0.0.1:11434/api/generate");
        assert_eq!(config.llm.local_model, "gemma");
        assert_eq!(config.llm.primary_model(), "gpt-4o-mini");
        assert_eq!(config.llm.timeout, Duration::from_secs(60));
        assert_eq!(config.storage.topics_file, PathBuf::from("topics.json"));
        assert_eq!(config.logging.level, "info,quiz_tutor=debug");
        assert!(config.logging.file_enabled);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-live"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OLLAMA_ENDPOINT", "http://gpu-box:11434/api/generate"),
            ("OLLAMA_MODEL", "llama3"),
            ("PORT", "8080"),
            ("APP_ENV", "Development"),
            ("TOPICS_FILE", "/tmp/topics.json"),
            ("LOG_FILE_ENABLED", "false"),
        ]))
        .unwrap();

        assert_eq!(config.llm.api_key, "sk-live");
        assert_eq!(config.llm.primary_model(), "gpt-4o");
        assert_eq!(config.llm.local_endpoint, "http://gpu-box:11434/api/generate");
        assert_eq!(config.llm.local_model, "llama3");
        assert_eq!(config.server.address(), "0.0.0.0:8080");
        assert!(config.server.environment.is_development());
        assert_eq!(config.storage.topics_file, PathBuf::from("/tmp/topics.json"));
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.file_enabled);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("OLLAMA_MODEL", "  "),
            ("OPENAI_MODEL", ""),
        ]))
        .unwrap();

        assert_eq!(config.llm.local_model, "gemma");
        assert_eq!(config.llm.model, None);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("PORT", "not-a-number")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("LLM_TIMEOUT_SECS", "soon")])).is_err());
    }

    #[test]
    fn test_config_validation() {
        let config = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-valid-key")])).unwrap();
        assert!(config.validate().is_ok());

        let mut invalid_port = config.clone();
        invalid_port.server.port = 0;
        assert!(invalid_port.validate().is_err());

        let mut invalid_endpoint = config.clone();
        invalid_endpoint.llm.local_endpoint = "127.0.0.1:11434".to_string();
        assert!(invalid_endpoint.validate().is_err());

        // A missing key only warns; the local model still serves requests
        let mut no_key = config;
        no_key.llm.api_key = String::new();
        assert!(no_key.validate().is_ok());
    }
}
