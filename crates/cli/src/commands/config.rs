use std::env;
use std::fs;

use bidwright_core::config::{env_keys, resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

/// Renders every effective setting with the layer it came from.
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let path = resolve_config_path(None);
    let file = path
        .as_deref()
        .and_then(|path| fs::read_to_string(path).ok())
        .and_then(|raw| raw.parse::<Value>().ok())
        .map(|doc| (doc, path.as_deref().map(|path| path.display().to_string())));

    let api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    let settings: [(&str, String, &[&str]); 11] = [
        ("llm.provider", format!("{:?}", config.llm.provider), env_keys::LLM_PROVIDER),
        ("llm.model", config.llm.model.clone(), env_keys::LLM_MODEL),
        ("llm.base_url", config.llm.effective_base_url().to_string(), env_keys::LLM_BASE_URL),
        ("llm.api_key", api_key.to_string(), env_keys::LLM_API_KEY),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string(), env_keys::LLM_TIMEOUT_SECS),
        ("llm.max_retries", config.llm.max_retries.to_string(), env_keys::LLM_MAX_RETRIES),
        ("server.bind_address", config.server.bind_address.clone(), env_keys::SERVER_BIND_ADDRESS),
        ("server.port", config.server.port.to_string(), env_keys::SERVER_PORT),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            env_keys::SERVER_GRACEFUL_SHUTDOWN_SECS,
        ),
        ("logging.level", config.logging.level.clone(), env_keys::LOGGING_LEVEL),
        ("logging.format", format!("{:?}", config.logging.format), env_keys::LOGGING_FORMAT),
    ];

    let mut lines = vec!["effective config (env > file > default):".to_string()];
    lines.extend(settings.iter().map(|(key, value, vars)| {
        let source = source_of(key, vars, file.as_ref().map(|(doc, path)| (doc, path.as_deref())));
        format!("- {key} = {value} (source: {source})")
    }));
    lines.join("\n")
}

fn source_of(key: &str, vars: &[&str], file: Option<(&Value, Option<&str>)>) -> String {
    if let Some(var) = vars.iter().find(|var| env::var_os(var).is_some()) {
        return format!("env ({var})");
    }
    match file {
        Some((doc, path)) if has_key(doc, key) => {
            format!("file ({})", path.unwrap_or("config file"))
        }
        _ => "default".to_string(),
    }
}

fn has_key(doc: &Value, dotted: &str) -> bool {
    dotted.split('.').try_fold(doc, |table, part| table.get(part)).is_some()
}

#[cfg(test)]
mod tests {
    use super::{has_key, source_of};

    #[test]
    fn dotted_keys_resolve_through_tables() {
        let doc = "[llm]\nmodel = \"gpt-4o\"\n".parse::<toml::Value>().expect("valid toml");

        assert!(has_key(&doc, "llm.model"));
        assert!(!has_key(&doc, "llm.api_key"));
        assert!(!has_key(&doc, "server.port"));
    }

    #[test]
    fn file_keys_are_attributed_to_the_file() {
        let doc = "[server]\nport = 9000\n".parse::<toml::Value>().expect("valid toml");
        let unset = ["BIDWRIGHT_CLI_TEST_NEVER_SET"];

        assert_eq!(
            source_of("server.port", &unset, Some((&doc, Some("bidwright.toml")))),
            "file (bidwright.toml)"
        );
        assert_eq!(source_of("server.bind_address", &unset, Some((&doc, None))), "default");
        assert_eq!(source_of("server.port", &unset, None), "default");
    }
}
