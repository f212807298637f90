use std::time::Instant;

use reviewlens_analytics::{ChartKind, ChartRenderer};
use reviewlens_core::config::{AppConfig, LoadOptions};
use reviewlens_core::domain::DateRange;
use reviewlens_core::store::ReviewStore;
use serde::Serialize;

use crate::bootstrap::load_store;
use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum ChartStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct ChartCheck {
    name: String,
    status: ChartStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct ChartsReport {
    command: &'static str,
    status: ChartStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<ChartCheck>,
}

pub fn run(options: LoadOptions, start: Option<&str>, end: Option<&str>) -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load(options)) {
        Ok((elapsed_ms, config)) => {
            checks.push(pass(
                "config_validation",
                elapsed_ms,
                "configuration loaded and validated",
            ));
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(fail("config_validation", elapsed_ms, error.to_string()));
            checks.extend(skipped_charts());
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let store = match timed_check(|| load_store(&config)) {
        Ok((elapsed_ms, store)) => {
            let message = format!("{} reviews loaded", store.reviews().len());
            checks.push(pass("dataset_load", elapsed_ms, message));
            store
        }
        Err((elapsed_ms, error)) => {
            checks.push(fail("dataset_load", elapsed_ms, error.to_string()));
            checks.extend(skipped_charts());
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let range = match resolve_range(&store, start, end) {
        Ok(range) => range,
        Err(message) => {
            checks.push(fail("date_range", 0, message));
            checks.extend(skipped_charts());
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };
    checks.push(pass("date_range", 0, format!("{} to {}", range.start, range.end)));

    let renderer = match ChartRenderer::new(&config.output) {
        Ok(renderer) => renderer,
        Err(error) => {
            checks.push(fail("chart_templates", 0, error.to_string()));
            checks.extend(skipped_charts());
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(fail(
                "async_runtime",
                0,
                format!("failed to initialize async runtime: {error}"),
            ));
            checks.extend(skipped_charts());
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let reviews = store.reviews().in_range(range);
    for kind in ChartKind::ALL {
        let chart_started = Instant::now();
        let result = runtime.block_on(renderer.render(kind, &reviews, range));
        let elapsed_ms = chart_started.elapsed().as_millis() as u64;
        checks.push(match result {
            Ok(path) => pass(&chart_check_name(kind), elapsed_ms, path.display().to_string()),
            Err(error) => fail(&chart_check_name(kind), elapsed_ms, error.to_string()),
        });
    }

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

/// Missing bounds fall back to the dataset span.
fn resolve_range(
    store: &ReviewStore,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<DateRange, String> {
    let span = store.date_span();
    let start = start.map(str::to_string).or_else(|| span.map(|range| range.start.to_string()));
    let end = end.map(str::to_string).or_else(|| span.map(|range| range.end.to_string()));

    match (start, end) {
        (Some(start), Some(end)) => {
            DateRange::parse(&start, &end).map_err(|error| error.to_string())
        }
        _ => Err("dataset is empty; pass both --start and --end".to_string()),
    }
}

fn chart_check_name(kind: ChartKind) -> String {
    format!("chart_{kind}")
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((started.elapsed().as_millis() as u64, value)),
        Err(error) => Err((started.elapsed().as_millis() as u64, error)),
    }
}

fn pass(name: &str, elapsed_ms: u64, message: impl Into<String>) -> ChartCheck {
    ChartCheck {
        name: name.to_string(),
        status: ChartStatus::Pass,
        elapsed_ms,
        message: message.into(),
    }
}

fn fail(name: &str, elapsed_ms: u64, message: impl Into<String>) -> ChartCheck {
    ChartCheck {
        name: name.to_string(),
        status: ChartStatus::Fail,
        elapsed_ms,
        message: message.into(),
    }
}

fn skipped_charts() -> Vec<ChartCheck> {
    ChartKind::ALL
        .into_iter()
        .map(|kind| ChartCheck {
            name: chart_check_name(kind),
            status: ChartStatus::Skipped,
            elapsed_ms: 0,
            message: "skipped due previous failure".to_string(),
        })
        .collect()
}

fn finalize_report(checks: Vec<ChartCheck>, total_elapsed_ms: u64) -> CommandResult {
    let rendered = checks
        .iter()
        .filter(|check| check.name.starts_with("chart_") && check.status == ChartStatus::Pass)
        .count();
    let failed = checks.iter().any(|check| check.status == ChartStatus::Fail);

    let report = ChartsReport {
        command: "charts",
        status: if failed { ChartStatus::Fail } else { ChartStatus::Pass },
        summary: format!(
            "charts: {rendered}/{} rendered in {total_elapsed_ms}ms",
            ChartKind::ALL.len()
        ),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"charts\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
