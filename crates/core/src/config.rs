//! Layered configuration: defaults < `bidwright.toml` < environment < explicit overrides.
//!
//! The file and the environment are both decoded into the same sparse
//! `ConfigPatch`, so every layer merges through one code path.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

pub const CONFIG_FILE_NAME: &str = "bidwright.toml";

/// Environment variables consulted for each setting. The first one set wins.
pub mod env_keys {
    pub const LLM_PROVIDER: &[&str] = &["BIDWRIGHT_LLM_PROVIDER"];
    pub const LLM_API_KEY: &[&str] = &["BIDWRIGHT_LLM_API_KEY", "OPENAI_API_KEY"];
    pub const LLM_BASE_URL: &[&str] = &["BIDWRIGHT_LLM_BASE_URL"];
    pub const LLM_MODEL: &[&str] = &["BIDWRIGHT_LLM_MODEL", "OPENAI_BID_EXTRACT_MODEL"];
    pub const LLM_TIMEOUT_SECS: &[&str] = &["BIDWRIGHT_LLM_TIMEOUT_SECS"];
    pub const LLM_MAX_RETRIES: &[&str] = &["BIDWRIGHT_LLM_MAX_RETRIES"];
    pub const SERVER_BIND_ADDRESS: &[&str] = &["BIDWRIGHT_SERVER_BIND_ADDRESS"];
    pub const SERVER_PORT: &[&str] = &["BIDWRIGHT_SERVER_PORT"];
    pub const SERVER_GRACEFUL_SHUTDOWN_SECS: &[&str] = &["BIDWRIGHT_SERVER_GRACEFUL_SHUTDOWN_SECS"];
    pub const LOGGING_LEVEL: &[&str] = &["BIDWRIGHT_LOGGING_LEVEL", "BIDWRIGHT_LOG_LEVEL"];
    pub const LOGGING_FORMAT: &[&str] = &["BIDWRIGHT_LOGGING_FORMAT", "BIDWRIGHT_LOG_FORMAT"];

    pub const ALL: [&[&str]; 11] = [
        LLM_PROVIDER,
        LLM_API_KEY,
        LLM_BASE_URL,
        LLM_MODEL,
        LLM_TIMEOUT_SECS,
        LLM_MAX_RETRIES,
        SERVER_BIND_ADDRESS,
        SERVER_PORT,
        SERVER_GRACEFUL_SHUTDOWN_SECS,
        LOGGING_LEVEL,
        LOGGING_FORMAT,
    ];
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    /// Total extraction attempts, including the first.
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[serde(rename = "openai", alias = "open_ai")]
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434/v1",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            _ => Err("expected openai or ollama".to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err("expected compact, pretty or json".to_string()),
        }
    }
}

/// Values set programmatically; they beat every other layer.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse `{path}`: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` does not exist")]
    MissingFile(PathBuf),
    #[error("config file references `${{{name}}}` but that variable is not set")]
    UndefinedVariable { name: String },
    #[error("config file has a `${{` without a closing `}}`")]
    UnterminatedVariable,
    #[error("`{key}={value}` is not usable: {reason}")]
    InvalidEnv { key: String, value: String, reason: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::OpenAi,
                api_key: None,
                base_url: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 60,
                max_retries: 3,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match resolve_config_path(options.config_path.as_deref()) {
            Some(path) => config.merge(ConfigPatch::from_file(&path)?),
            None if options.require_file => {
                return Err(ConfigError::MissingFile(
                    options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
                ));
            }
            None => {}
        }
        config.merge(ConfigPatch::from_env()?);
        config.merge(options.overrides.into());

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.llm.validate()?;
        self.server.validate()?;
        self.logging.validate()
    }

    fn merge(&mut self, patch: ConfigPatch) {
        let ConfigPatch { llm, server, logging } = patch;

        replace(&mut self.llm.provider, llm.provider);
        replace(&mut self.llm.api_key, llm.api_key.map(|key| Some(SecretString::from(key))));
        replace(&mut self.llm.base_url, llm.base_url.map(Some));
        replace(&mut self.llm.model, llm.model);
        replace(&mut self.llm.timeout_secs, llm.timeout_secs);
        replace(&mut self.llm.max_retries, llm.max_retries);

        replace(&mut self.server.bind_address, server.bind_address);
        replace(&mut self.server.port, server.port);
        replace(&mut self.server.graceful_shutdown_secs, server.graceful_shutdown_secs);

        replace(&mut self.logging.level, logging.level);
        replace(&mut self.logging.format, logging.format);
    }
}

impl LlmConfig {
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or_else(|| self.provider.default_base_url())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require((1..=300).contains(&self.timeout_secs), "llm.timeout_secs must be between 1 and 300")?;
        require((1..=10).contains(&self.max_retries), "llm.max_retries must be between 1 and 10")?;
        require(!self.model.trim().is_empty(), "llm.model must not be empty")?;
        require(
            self.base_url
                .as_deref()
                .map_or(true, |url| url.starts_with("http://") || url.starts_with("https://")),
            "llm.base_url must be an http:// or https:// URL",
        )?;

        let has_key =
            self.api_key.as_ref().is_some_and(|key| !key.expose_secret().trim().is_empty());
        require(
            self.provider != LlmProvider::OpenAi || has_key,
            "llm.api_key is required for the openai provider (set BIDWRIGHT_LLM_API_KEY or OPENAI_API_KEY)",
        )
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require(!self.bind_address.trim().is_empty(), "server.bind_address must not be empty")?;
        require(self.port != 0, "server.port must be non-zero")?;
        require(self.graceful_shutdown_secs != 0, "server.graceful_shutdown_secs must be non-zero")
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require(
            self.level.trim().parse::<Level>().is_ok(),
            "logging.level must be one of trace, debug, info, warn, error",
        )
    }
}

/// Explicit path if it exists, else `./bidwright.toml`, else `./config/bidwright.toml`.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    match explicit_path {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => [PathBuf::from(CONFIG_FILE_NAME), Path::new("config").join(CONFIG_FILE_NAME)]
            .into_iter()
            .find(|candidate| candidate.exists()),
    }
}

fn require(condition: bool, message: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message.to_string()))
    }
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Expands `${NAME}` references from the process environment.
fn expand_env_refs(raw: &str) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let reference = &rest[start + 2..];
        let end = reference.find('}').ok_or(ConfigError::UnterminatedVariable)?;
        let name = &reference[..end];
        let value = env::var(name)
            .map_err(|_| ConfigError::UndefinedVariable { name: name.to_string() })?;
        expanded.push_str(&value);
        rest = &reference[end + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

fn env_setting<T>(keys: &[&str]) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some((key, value)) = keys.iter().find_map(|key| {
        env::var(key).ok().filter(|value| !value.trim().is_empty()).map(|value| (*key, value))
    }) else {
        return Ok(None);
    };

    value.trim().parse().map(Some).map_err(|error: T::Err| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.clone(),
        reason: error.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigPatch {
    llm: LlmPatch,
    server: ServerPatch,
    logging: LoggingPatch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl ConfigPatch {
    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&expand_env_refs(&raw)?)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            llm: LlmPatch {
                provider: env_setting(env_keys::LLM_PROVIDER)?,
                api_key: env_setting(env_keys::LLM_API_KEY)?,
                base_url: env_setting(env_keys::LLM_BASE_URL)?,
                model: env_setting(env_keys::LLM_MODEL)?,
                timeout_secs: env_setting(env_keys::LLM_TIMEOUT_SECS)?,
                max_retries: env_setting(env_keys::LLM_MAX_RETRIES)?,
            },
            server: ServerPatch {
                bind_address: env_setting(env_keys::SERVER_BIND_ADDRESS)?,
                port: env_setting(env_keys::SERVER_PORT)?,
                graceful_shutdown_secs: env_setting(env_keys::SERVER_GRACEFUL_SHUTDOWN_SECS)?,
            },
            logging: LoggingPatch {
                level: env_setting(env_keys::LOGGING_LEVEL)?,
                format: env_setting(env_keys::LOGGING_FORMAT)?,
            },
        })
    }
}

impl From<ConfigOverrides> for ConfigPatch {
    fn from(overrides: ConfigOverrides) -> Self {
        Self {
            llm: LlmPatch {
                provider: overrides.llm_provider,
                api_key: overrides.llm_api_key,
                base_url: overrides.llm_base_url,
                model: overrides.llm_model,
                ..LlmPatch::default()
            },
            server: ServerPatch { port: overrides.server_port, ..ServerPatch::default() },
            logging: LoggingPatch { level: overrides.log_level, ..LoggingPatch::default() },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock, PoisonError};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{
        env_keys, expand_env_refs, AppConfig, ConfigError, ConfigOverrides, LlmProvider,
        LoadOptions, LogFormat,
    };

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_config_env() {
        for key in env_keys::ALL.iter().flat_map(|keys| keys.iter()) {
            env::remove_var(key);
        }
    }

    /// Runs `body` with only `vars` set among the variables config reads.
    fn with_env<T>(vars: &[(&str, &str)], body: impl FnOnce() -> T) -> T {
        let _guard = env_lock().lock().unwrap_or_else(PoisonError::into_inner);
        clear_config_env();
        for (key, value) in vars {
            env::set_var(key, value);
        }

        let result = body();

        clear_config_env();
        for (key, _) in vars {
            env::remove_var(key);
        }
        result
    }

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("bidwright.toml");
        fs::write(&path, contents).expect("config file should be writable");
        path
    }

    fn from_file(path: PathBuf) -> Result<AppConfig, ConfigError> {
        AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
    }

    #[test]
    fn expansion_handles_surrounding_text_and_errors() {
        with_env(&[("BIDWRIGHT_TEST_HOST", "llm.internal")], || {
            assert_eq!(
                expand_env_refs("base_url = \"http://${BIDWRIGHT_TEST_HOST}:8080/v1\"")
                    .expect("defined variable expands"),
                "base_url = \"http://llm.internal:8080/v1\""
            );
            assert!(matches!(
                expand_env_refs("${BIDWRIGHT_TEST_HOST"),
                Err(ConfigError::UnterminatedVariable)
            ));
            assert!(matches!(
                expand_env_refs("${BIDWRIGHT_TEST_UNSET}"),
                Err(ConfigError::UndefinedVariable { ref name }) if name == "BIDWRIGHT_TEST_UNSET"
            ));
        });
    }

    #[test]
    fn file_values_can_reference_the_environment() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_config(&dir, "[llm]\napi_key = \"${BIDWRIGHT_TEST_KEY}\"\nmodel = \"gpt-4o\"\n");

        let config = with_env(&[("BIDWRIGHT_TEST_KEY", "sk-from-env")], || from_file(path))
            .expect("config loads");

        assert_eq!(config.llm.api_key.as_ref().map(|key| key.expose_secret()), Some("sk-from-env"));
        assert_eq!(config.llm.model, "gpt-4o");
    }

    #[test]
    fn layers_apply_in_precedence_order() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_config(
            &dir,
            r#"
[llm]
model = "model-from-file"
api_key = "sk-from-file"
max_retries = 5

[server]
port = 9100

[logging]
level = "warn"
"#,
        );

        let config = with_env(
            &[("BIDWRIGHT_LLM_MODEL", "model-from-env"), ("BIDWRIGHT_LLM_API_KEY", "sk-from-env")],
            || {
                AppConfig::load(LoadOptions {
                    config_path: Some(path),
                    overrides: ConfigOverrides {
                        log_level: Some("debug".to_string()),
                        ..ConfigOverrides::default()
                    },
                    ..LoadOptions::default()
                })
            },
        )
        .expect("config loads");

        assert_eq!(config.llm.model, "model-from-env");
        assert_eq!(config.llm.api_key.as_ref().map(|key| key.expose_secret()), Some("sk-from-env"));
        assert_eq!(config.llm.max_retries, 5);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn openai_variable_names_are_honoured() {
        let config = with_env(
            &[
                ("OPENAI_API_KEY", "sk-legacy"),
                ("OPENAI_BID_EXTRACT_MODEL", "gpt-4.1-mini"),
                ("BIDWRIGHT_LOG_LEVEL", "warn"),
                ("BIDWRIGHT_LOG_FORMAT", "json"),
            ],
            || AppConfig::load(LoadOptions::default()),
        )
        .expect("config loads");

        assert_eq!(config.llm.model, "gpt-4.1-mini");
        assert!(config.llm.api_key.is_some());
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn primary_variable_beats_its_fallback() {
        let config = with_env(
            &[("BIDWRIGHT_LLM_API_KEY", "sk-primary"), ("OPENAI_API_KEY", "sk-fallback")],
            || AppConfig::load(LoadOptions::default()),
        )
        .expect("config loads");

        assert_eq!(config.llm.api_key.as_ref().map(|key| key.expose_secret()), Some("sk-primary"));
    }

    #[test]
    fn openai_without_a_key_is_rejected() {
        let error = with_env(&[], || AppConfig::load(LoadOptions::default()))
            .expect_err("missing key fails validation");

        assert!(matches!(error, ConfigError::Invalid(ref message) if message.contains("llm.api_key")));
    }

    #[test]
    fn ollama_runs_keyless_against_the_local_endpoint() {
        let config = with_env(&[], || {
            AppConfig::load(LoadOptions {
                overrides: ConfigOverrides {
                    llm_provider: Some(LlmProvider::Ollama),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
        })
        .expect("config loads");

        assert_eq!(config.llm.effective_base_url(), "http://localhost:11434/v1");
    }

    #[test]
    fn unparseable_env_values_name_the_variable() {
        let error = with_env(
            &[("BIDWRIGHT_LLM_API_KEY", "sk-test"), ("BIDWRIGHT_LLM_MAX_RETRIES", "many")],
            || AppConfig::load(LoadOptions::default()),
        )
        .expect_err("non-numeric retries fail");
        assert!(matches!(
            error,
            ConfigError::InvalidEnv { ref key, ref value, .. }
                if key == "BIDWRIGHT_LLM_MAX_RETRIES" && value == "many"
        ));

        let error = with_env(
            &[("BIDWRIGHT_LLM_API_KEY", "sk-test"), ("BIDWRIGHT_LLM_PROVIDER", "anthropic")],
            || AppConfig::load(LoadOptions::default()),
        )
        .expect_err("unknown provider fails");
        assert!(error.to_string().contains("expected openai or ollama"));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let error = with_env(
            &[("BIDWRIGHT_LLM_API_KEY", "sk-test"), ("BIDWRIGHT_LLM_MAX_RETRIES", "0")],
            || AppConfig::load(LoadOptions::default()),
        )
        .expect_err("zero attempts fail");
        assert!(error.to_string().contains("llm.max_retries"));

        let error = with_env(
            &[("BIDWRIGHT_LLM_API_KEY", "sk-test"), ("BIDWRIGHT_LOGGING_LEVEL", "loud")],
            || AppConfig::load(LoadOptions::default()),
        )
        .expect_err("unknown level fails");
        assert!(error.to_string().contains("logging.level"));
    }

    #[test]
    fn required_file_must_exist() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("absent.toml");

        let error = with_env(&[], || {
            AppConfig::load(LoadOptions {
                config_path: Some(missing.clone()),
                require_file: true,
                ..LoadOptions::default()
            })
        })
        .expect_err("missing file fails");

        assert!(matches!(error, ConfigError::MissingFile(ref path) if *path == missing));
    }

    #[test]
    fn debug_output_redacts_the_api_key() {
        let config = with_env(&[("BIDWRIGHT_LLM_API_KEY", "sk-secret-value")], || {
            AppConfig::load(LoadOptions::default())
        })
        .expect("config loads");

        assert!(!format!("{config:?}").contains("sk-secret-value"));
        assert_eq!(config.logging.format, LogFormat::Compact);
    }
}
