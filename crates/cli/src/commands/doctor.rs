use reviewlens_analytics::{OpenAiCompatibleClient, ReportPersister};
use reviewlens_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use crate::bootstrap::load_store;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_dataset(&config));
            checks.push(check_pdf_converter(&config));
            checks.push(check_llm_client(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["dataset_load", "pdf_converter", "llm_client"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    // A missing converter only downgrades reports to HTML.
    let all_pass =
        checks.iter().all(|check| matches!(check.status, CheckStatus::Pass | CheckStatus::Warn));
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_dataset(config: &AppConfig) -> DoctorCheck {
    match load_store(config) {
        Ok(store) => DoctorCheck {
            name: "dataset_load",
            status: CheckStatus::Pass,
            details: format!(
                "{} reviews loaded from `{}`",
                store.reviews().len(),
                config.dataset.path.display()
            ),
        },
        Err(error) => DoctorCheck {
            name: "dataset_load",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_pdf_converter(config: &AppConfig) -> DoctorCheck {
    let persister = match ReportPersister::new(&config.output) {
        Ok(persister) => persister,
        Err(error) => {
            return DoctorCheck {
                name: "pdf_converter",
                status: CheckStatus::Fail,
                details: error.to_string(),
            }
        }
    };

    match persister.pdf_converter() {
        Some(path) => DoctorCheck {
            name: "pdf_converter",
            status: CheckStatus::Pass,
            details: format!("wkhtmltopdf at `{}`; reports are saved as PDF", path.display()),
        },
        None => DoctorCheck {
            name: "pdf_converter",
            status: CheckStatus::Warn,
            details: "wkhtmltopdf not found; reports are saved as HTML".to_string(),
        },
    }
}

fn check_llm_client(config: &AppConfig) -> DoctorCheck {
    match OpenAiCompatibleClient::from_config(&config.llm) {
        Ok(client) => DoctorCheck {
            name: "llm_client",
            status: CheckStatus::Pass,
            details: format!("model `{}` via `{}`", client.model(), client.endpoint()),
        },
        Err(error) => DoctorCheck {
            name: "llm_client",
            status: CheckStatus::Fail,
            details: format!("{error:#}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
