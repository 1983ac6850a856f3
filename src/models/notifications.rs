use std::time::Duration;

use chrono::{DateTime, Utc};

/// How long a success toast stays up before auto-dismissing.
pub const SUCCESS_DISPLAY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticePhase {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeDisplay {
    For(Duration),
    UntilDismissed,
}

/// One notification to the UI shell. Notices from the same attempt share an
/// `attempt_id`, so a sink can collapse loading/success/error into a single
/// promise-style toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNotice {
    pub attempt_id: String,
    pub phase: NoticePhase,
    pub message: String,
    pub explorer_url: Option<String>,
    pub display: NoticeDisplay,
    pub created_at: DateTime<Utc>,
}

impl FlowNotice {
    pub fn loading(attempt_id: &str, message: String) -> Self {
        Self {
            attempt_id: attempt_id.to_string(),
            phase: NoticePhase::Loading,
            message,
            explorer_url: None,
            display: NoticeDisplay::UntilDismissed,
            created_at: Utc::now(),
        }
    }

    pub fn success(attempt_id: &str, message: String, explorer_url: String) -> Self {
        Self {
            attempt_id: attempt_id.to_string(),
            phase: NoticePhase::Success,
            message,
            explorer_url: Some(explorer_url),
            display: NoticeDisplay::For(SUCCESS_DISPLAY),
            created_at: Utc::now(),
        }
    }

    pub fn error(attempt_id: &str, message: String) -> Self {
        Self {
            attempt_id: attempt_id.to_string(),
            phase: NoticePhase::Error,
            message,
            explorer_url: None,
            display: NoticeDisplay::UntilDismissed,
            created_at: Utc::now(),
        }
    }
}
