use std::env;
use std::fs;
use std::path::Path;

use reviewlens_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use super::CommandResult;

struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure("config", &error),
    };
    let config_file_doc = config_file_path.as_deref().and_then(load_config_file_doc);

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(&field, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn effective_fields(config: &AppConfig) -> Vec<Field> {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|secret| redact_token(secret.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        Field {
            key_path: "dataset.path",
            env_keys: &["REVIEWLENS_DATASET_PATH"],
            value: config.dataset.path.display().to_string(),
        },
        Field {
            key_path: "llm.provider",
            env_keys: &["REVIEWLENS_LLM_PROVIDER"],
            value: format!("{:?}", config.llm.provider),
        },
        Field {
            key_path: "llm.model",
            env_keys: &["REVIEWLENS_LLM_MODEL"],
            value: config.llm.model.clone(),
        },
        Field {
            key_path: "llm.base_url",
            env_keys: &["REVIEWLENS_LLM_BASE_URL"],
            value: config.llm.effective_base_url(),
        },
        Field {
            key_path: "llm.api_key",
            env_keys: &["REVIEWLENS_LLM_API_KEY", "GROQ_API_KEY"],
            value: api_key,
        },
        Field {
            key_path: "llm.temperature",
            env_keys: &["REVIEWLENS_LLM_TEMPERATURE"],
            value: config.llm.temperature.to_string(),
        },
        Field {
            key_path: "llm.timeout_secs",
            env_keys: &["REVIEWLENS_LLM_TIMEOUT_SECS"],
            value: config.llm.timeout_secs.to_string(),
        },
        Field {
            key_path: "output.directory",
            env_keys: &["REVIEWLENS_OUTPUT_DIRECTORY"],
            value: config.output.directory.display().to_string(),
        },
        Field {
            key_path: "output.default_report_name",
            env_keys: &["REVIEWLENS_OUTPUT_DEFAULT_REPORT_NAME"],
            value: config.output.default_report_name.clone(),
        },
        Field {
            key_path: "summarizer.batch_token_budget",
            env_keys: &["REVIEWLENS_SUMMARIZER_BATCH_TOKEN_BUDGET"],
            value: config.summarizer.batch_token_budget.to_string(),
        },
        Field {
            key_path: "logging.level",
            env_keys: &["REVIEWLENS_LOGGING_LEVEL", "REVIEWLENS_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key_path: "logging.format",
            env_keys: &["REVIEWLENS_LOGGING_FORMAT", "REVIEWLENS_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ]
}

fn load_config_file_doc(path: &Path) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &Field,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a provider prefix such as `gsk_` or `sk-` and hides the rest.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some(index) = trimmed.find(['_', '-']) {
        return format!("{}***", &trimmed[..=index]);
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::redact_token;

    #[test]
    fn redaction_keeps_only_the_key_prefix() {
        assert_eq!(redact_token("gsk_abc123secret"), "gsk_***");
        assert_eq!(redact_token("sk-proj-secret"), "sk-***");
        assert_eq!(redact_token("plainsecret"), "<redacted>");
        assert_eq!(redact_token("   "), "<empty>");
    }
}
