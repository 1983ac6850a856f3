use log::{error, info};
use serde_json::json;

/// Initialise the process-wide logger. Safe to call more than once.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Logs an informational flow event in JSON format.
pub fn log_flow_event(attempt_id: &str, event: &str, message: &str) {
    info!("{}", json!({
        "attempt_id": attempt_id,
        "event": event,
        "message": message
    }));
}

/// Logs a flow error in JSON format.
pub fn log_flow_error(attempt_id: &str, event: &str, error_message: &str) {
    error!("{}", json!({
        "attempt_id": attempt_id,
        "event": event,
        "error": error_message
    }));
}
