use reviewlens_core::config::{AppConfig, LoadOptions};
use reviewlens_core::domain::{AgentRequest, OutcomeKind};
use reviewlens_core::errors::InterfaceError;

use super::{CommandResult, EXIT_INVALID_INPUT};
use crate::bootstrap::bootstrap_with_config;

const COMMAND: &str = "ask";
const EXIT_SERVICE_UNAVAILABLE: u8 = 5;
const EXIT_INTERNAL: u8 = 6;

pub fn run(options: LoadOptions, request_text: &str) -> CommandResult {
    let request_text = request_text.trim();
    if request_text.is_empty() {
        return CommandResult::failure(
            COMMAND,
            "invalid_input",
            "request text must not be empty",
            EXIT_INVALID_INPUT,
        );
    }

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure(COMMAND, &error),
    };
    let app = match bootstrap_with_config(config) {
        Ok(app) => app,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                error.error_class(),
                error.to_string(),
                error.exit_code(),
            )
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_setup",
                format!("failed to initialize async runtime: {error}"),
                7,
            )
        }
    };

    let request = AgentRequest::new(request_text);
    let request_id = request.request_id.clone();
    match runtime.block_on(app.agent_runtime.handle_request(request)) {
        Ok(outcome) => match outcome.kind {
            OutcomeKind::Text => CommandResult::answer(COMMAND, "text", &request_id, outcome.value),
            OutcomeKind::FilePath => {
                CommandResult::answer(COMMAND, "file_path", &request_id, outcome.value)
            }
            OutcomeKind::InvalidInput => CommandResult::request_failure(
                COMMAND,
                "invalid_input",
                &request_id,
                outcome.value,
                EXIT_INVALID_INPUT,
            ),
        },
        Err(error) => {
            let error = error.into_interface(request_id);
            let (class, exit_code) = match &error {
                InterfaceError::BadRequest { .. } => ("bad_request", EXIT_INVALID_INPUT),
                InterfaceError::ServiceUnavailable { .. } => {
                    ("service_unavailable", EXIT_SERVICE_UNAVAILABLE)
                }
                InterfaceError::Internal { .. } => ("internal", EXIT_INTERNAL),
            };
            CommandResult::request_failure(
                COMMAND,
                class,
                error.correlation_id(),
                format!("{} ({error})", error.user_message()),
                exit_code,
            )
        }
    }
}
