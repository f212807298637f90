use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use reviewlens_cli::commands::{ask, charts, config, doctor};
use reviewlens_core::config::LoadOptions;
use serde_json::Value;
use tempfile::TempDir;

const DATASET: &str = "\
Country,Restaurant Name,Sentiment,Review Title,Review Date,Review
Japan,SteamNoodles,Positive,Great,Jan 2019 •,Rich broth and quick service
Japan,SteamNoodles,Negative,Cold,Mar 2019,The food was cold
Japan,SteamNoodles,Neutral,Fine,Jun 2019,Average ramen
Japan,SteamNoodles,Positive,Lovely,Jul 2018,Friendly staff
";

struct Workspace {
    dir: TempDir,
    dataset: String,
    output: String,
}

fn workspace() -> Workspace {
    let dir = TempDir::new().expect("tempdir");
    let dataset = dir.path().join("reviews.csv");
    fs::write(&dataset, DATASET).expect("dataset");
    let output = dir.path().join("out");
    Workspace {
        dataset: dataset.display().to_string(),
        output: output.display().to_string(),
        dir,
    }
}

impl Workspace {
    fn ollama_env(&self) -> Vec<(&str, &str)> {
        vec![
            ("REVIEWLENS_LLM_PROVIDER", "ollama"),
            ("REVIEWLENS_DATASET_PATH", self.dataset.as_str()),
            ("REVIEWLENS_OUTPUT_DIRECTORY", self.output.as_str()),
        ]
    }

    fn output_file(&self, name: &str) -> bool {
        Path::new(&self.output).join(name).exists()
    }
}

#[test]
fn doctor_reports_each_readiness_check_as_json() {
    let ws = workspace();
    with_env(&ws.ollama_env(), || {
        let payload = parse_payload(&doctor::run(LoadOptions::default(), true));
        assert_eq!(payload["overall_status"], "pass");

        let checks = payload["checks"].as_array().expect("checks array");
        let names =
            checks.iter().map(|check| check["name"].as_str().unwrap_or("")).collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["config_validation", "dataset_load", "pdf_converter", "llm_client"]
        );
        assert_eq!(checks[1]["status"], "pass");
        assert!(checks[1]["details"].as_str().unwrap_or("").starts_with("4 reviews loaded"));
        assert!(matches!(checks[2]["status"].as_str(), Some("pass") | Some("warn")));
        assert!(checks[2]["details"].as_str().unwrap_or("").contains("wkhtmltopdf"));
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[], || {
        let payload = parse_payload(&doctor::run(LoadOptions::default(), true));
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
    });
}

#[test]
fn config_redacts_api_key_and_attributes_sources() {
    let ws = workspace();
    let vars =
        [("GROQ_API_KEY", "gsk_topsecretvalue"), ("REVIEWLENS_DATASET_PATH", ws.dataset.as_str())];
    with_env(&vars, || {
        let result = config::run(LoadOptions::default());
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("- llm.api_key = gsk_*** (source: env (GROQ_API_KEY))"));
        assert!(result.output.contains("- llm.provider = Groq (source: default)"));
        assert!(result.output.contains("(source: env (REVIEWLENS_DATASET_PATH))"));
        assert!(!result.output.contains("topsecretvalue"));
    });
}

#[test]
fn config_returns_validation_failure_without_api_key() {
    with_env(&[], || {
        let result = config::run(LoadOptions::default());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn charts_render_every_kind_with_timing() {
    let ws = workspace();
    with_env(&ws.ollama_env(), || {
        let result = charts::run(LoadOptions::default(), Some("2019-01-01"), Some("2019-12-31"));
        assert_eq!(result.exit_code, 0, "{}", result.output);
        assert!(result.output.starts_with("charts: 4/4 rendered"));

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "charts");
        assert_eq!(payload["status"], "pass");
        let chart_checks = payload["checks"]
            .as_array()
            .expect("checks array")
            .iter()
            .filter(|check| check["name"].as_str().unwrap_or("").starts_with("chart_"))
            .count();
        assert_eq!(chart_checks, 4);

        for name in [
            "sentiment_line_chart.svg",
            "sentiment_pie_chart.svg",
            "sentiment_stacked_bar.svg",
            "sentiment_simple_bar.svg",
        ] {
            assert!(ws.output_file(name), "missing {name}");
        }
    });
}

#[test]
fn charts_fail_on_malformed_range() {
    let ws = workspace();
    with_env(&ws.ollama_env(), || {
        let result = charts::run(LoadOptions::default(), Some("2019-13-01"), None);
        assert_eq!(result.exit_code, 6);

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["status"], "fail");
        let range_check = payload["checks"]
            .as_array()
            .expect("checks array")
            .iter()
            .find(|check| check["name"] == "date_range")
            .cloned()
            .expect("date_range check");
        assert_eq!(range_check["status"], "fail");
        assert!(!ws.output_file("sentiment_line_chart.svg"));
    });
}

#[test]
fn ask_rejects_empty_request() {
    with_env(&[], || {
        let result = ask::run(LoadOptions::default(), "   ");
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["error_class"], "invalid_input");
    });
}

#[test]
fn ask_reports_missing_dataset() {
    let ws = workspace();
    let missing = ws.dir.path().join("absent.csv").display().to_string();
    with_env(
        &[("REVIEWLENS_LLM_PROVIDER", "ollama"), ("REVIEWLENS_DATASET_PATH", missing.as_str())],
        || {
            let result = ask::run(LoadOptions::default(), "Show me the sentiment trend for 2019");
            assert_eq!(result.exit_code, 3);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["error_class"], "dataset_load");
        },
    );
}

#[test]
fn ask_returns_chart_path_for_plotting_request() {
    let ws = workspace();
    with_env(&ws.ollama_env(), || {
        let result = ask::run(LoadOptions::default(), "Show me the sentiment trend for 2019");
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["kind"], "file_path");
        assert!(payload["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(payload["message"].as_str().unwrap_or("").ends_with("sentiment_line_chart.svg"));
        assert!(ws.output_file("sentiment_line_chart.svg"));
    });
}

#[test]
fn ask_maps_unknown_chart_kind_to_invalid_input() {
    let ws = workspace();
    with_env(&ws.ollama_env(), || {
        let result = ask::run(LoadOptions::default(), "Plot a scatter chart of sentiment for 2019");
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
        assert!(payload["message"].as_str().unwrap_or("").starts_with("Invalid chart type"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn last_line(output: &str) -> &str {
    output.lines().last().unwrap_or_default()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "REVIEWLENS_DATASET_PATH",
        "REVIEWLENS_LLM_PROVIDER",
        "REVIEWLENS_LLM_API_KEY",
        "REVIEWLENS_LLM_BASE_URL",
        "REVIEWLENS_LLM_MODEL",
        "REVIEWLENS_LLM_TEMPERATURE",
        "REVIEWLENS_LLM_TIMEOUT_SECS",
        "REVIEWLENS_OUTPUT_DIRECTORY",
        "REVIEWLENS_OUTPUT_DEFAULT_REPORT_NAME",
        "REVIEWLENS_SUMMARIZER_BATCH_TOKEN_BUDGET",
        "REVIEWLENS_LOGGING_LEVEL",
        "REVIEWLENS_LOGGING_FORMAT",
        "REVIEWLENS_LOG_LEVEL",
        "REVIEWLENS_LOG_FORMAT",
        "GROQ_API_KEY",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
