use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub llm: LlmConfig,
    pub output: OutputConfig,
    pub summarizer: SummarizerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatasetConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub line_chart: String,
    pub pie_chart: String,
    pub stacked_bar_chart: String,
    pub simple_bar_chart: String,
    pub default_report_name: String,
}

#[derive(Clone, Debug)]
pub struct SummarizerConfig {
    pub batch_token_budget: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Groq,
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434/v1",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Groq | Self::OpenAi)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub dataset_path: Option<PathBuf>,
    pub output_directory: Option<PathBuf>,
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig { path: PathBuf::from("European Restaurant reviews.csv") },
            llm: LlmConfig {
                provider: LlmProvider::Groq,
                api_key: None,
                base_url: None,
                model: "llama-3.1-8b-instant".to_string(),
                temperature: 0.0,
                timeout_secs: 60,
            },
            output: OutputConfig {
                directory: PathBuf::from("."),
                line_chart: "sentiment_line_chart.svg".to_string(),
                pie_chart: "sentiment_pie_chart.svg".to_string(),
                stacked_bar_chart: "sentiment_stacked_bar.svg".to_string(),
                simple_bar_chart: "sentiment_simple_bar.svg".to_string(),
                default_report_name: "strategic_report.pdf".to_string(),
            },
            summarizer: SummarizerConfig { batch_token_budget: 6_000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl LlmConfig {
    /// Configured base URL, or the provider's public endpoint.
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected groq|openai|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("reviewlens.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(dataset) = patch.dataset {
            if let Some(path) = dataset.path {
                self.dataset.path = path;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(output) = patch.output {
            if let Some(directory) = output.directory {
                self.output.directory = directory;
            }
            if let Some(line_chart) = output.line_chart {
                self.output.line_chart = line_chart;
            }
            if let Some(pie_chart) = output.pie_chart {
                self.output.pie_chart = pie_chart;
            }
            if let Some(stacked_bar_chart) = output.stacked_bar_chart {
                self.output.stacked_bar_chart = stacked_bar_chart;
            }
            if let Some(simple_bar_chart) = output.simple_bar_chart {
                self.output.simple_bar_chart = simple_bar_chart;
            }
            if let Some(default_report_name) = output.default_report_name {
                self.output.default_report_name = default_report_name;
            }
        }

        if let Some(summarizer) = patch.summarizer {
            if let Some(batch_token_budget) = summarizer.batch_token_budget {
                self.summarizer.batch_token_budget = batch_token_budget;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("REVIEWLENS_DATASET_PATH") {
            self.dataset.path = PathBuf::from(value);
        }

        if let Some(value) = read_env("REVIEWLENS_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        let api_key = read_env("REVIEWLENS_LLM_API_KEY").or_else(|| {
            (self.llm.api_key.is_none() && self.llm.provider == LlmProvider::Groq)
                .then(|| read_env("GROQ_API_KEY"))
                .flatten()
        });
        if let Some(value) = api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("REVIEWLENS_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("REVIEWLENS_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("REVIEWLENS_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("REVIEWLENS_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("REVIEWLENS_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("REVIEWLENS_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("REVIEWLENS_OUTPUT_DIRECTORY") {
            self.output.directory = PathBuf::from(value);
        }
        if let Some(value) = read_env("REVIEWLENS_OUTPUT_DEFAULT_REPORT_NAME") {
            self.output.default_report_name = value;
        }

        if let Some(value) = read_env("REVIEWLENS_SUMMARIZER_BATCH_TOKEN_BUDGET") {
            self.summarizer.batch_token_budget =
                parse_usize("REVIEWLENS_SUMMARIZER_BATCH_TOKEN_BUDGET", &value)?;
        }

        let log_level =
            read_env("REVIEWLENS_LOGGING_LEVEL").or_else(|| read_env("REVIEWLENS_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("REVIEWLENS_LOGGING_FORMAT").or_else(|| read_env("REVIEWLENS_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dataset_path) = overrides.dataset_path {
            self.dataset.path = dataset_path;
        }
        if let Some(output_directory) = overrides.output_directory {
            self.output.directory = output_directory;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_dataset(&self.dataset)?;
        validate_llm(&self.llm)?;
        validate_output(&self.output)?;
        validate_summarizer(&self.summarizer)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `load` would read: the explicit path when it exists,
/// otherwise `reviewlens.toml` or `config/reviewlens.toml`.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("reviewlens.toml"), PathBuf::from("config/reviewlens.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_dataset(dataset: &DatasetConfig) -> Result<(), ConfigError> {
    if dataset.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("dataset.path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if llm.provider.requires_api_key() {
        let missing = llm
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "llm.api_key is required for groq/openai providers (set REVIEWLENS_LLM_API_KEY or GROQ_API_KEY)"
                    .to_string(),
            ));
        }
    }

    if let Some(base_url) = &llm.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "llm.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_output(output: &OutputConfig) -> Result<(), ConfigError> {
    let names = [
        ("output.line_chart", &output.line_chart),
        ("output.pie_chart", &output.pie_chart),
        ("output.stacked_bar_chart", &output.stacked_bar_chart),
        ("output.simple_bar_chart", &output.simple_bar_chart),
        ("output.default_report_name", &output.default_report_name),
    ];
    for (key, name) in names {
        let bare = Path::new(name.as_str()).file_name().map(|file| file == name.as_str());
        if name.trim().is_empty() || bare != Some(true) {
            return Err(ConfigError::Validation(format!(
                "{key} must be a plain file name without directories"
            )));
        }
    }
    Ok(())
}

fn validate_summarizer(summarizer: &SummarizerConfig) -> Result<(), ConfigError> {
    if !(100..=100_000).contains(&summarizer.batch_token_budget) {
        return Err(ConfigError::Validation(
            "summarizer.batch_token_budget must be in range 100..=100000".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    dataset: Option<DatasetPatch>,
    llm: Option<LlmPatch>,
    output: Option<OutputPatch>,
    summarizer: Option<SummarizerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatasetPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputPatch {
    directory: Option<PathBuf>,
    line_chart: Option<String>,
    pie_chart: Option<String>,
    stacked_bar_chart: Option<String>,
    simple_bar_chart: Option<String>,
    default_report_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SummarizerPatch {
    batch_token_budget: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
