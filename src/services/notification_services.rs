use crate::models::notifications::{FlowNotice, NoticeDisplay, NoticePhase};
use crate::utilities::logging::{log_flow_error, log_flow_event};

/// Receives flow notices. The UI shell maps these to toasts; the default
/// implementation below just logs them.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: FlowNotice);
}

/// Structured-log sink, useful as a default and in headless runs.
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, notice: FlowNotice) {
        let phase = match notice.phase {
            NoticePhase::Loading => "loading",
            NoticePhase::Success => "success",
            NoticePhase::Error => "error",
        };
        let message = match (&notice.explorer_url, notice.display) {
            (Some(url), _) => format!("{} ({})", notice.message, url),
            (None, NoticeDisplay::UntilDismissed) => notice.message.clone(),
            (None, NoticeDisplay::For(_)) => notice.message.clone(),
        };

        match notice.phase {
            NoticePhase::Error => log_flow_error(&notice.attempt_id, phase, &message),
            _ => log_flow_event(&notice.attempt_id, phase, &message),
        }
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records every notice for assertions.
    #[derive(Default)]
    pub struct RecordingSink {
        pub notices: Mutex<Vec<FlowNotice>>,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, notice: FlowNotice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    impl RecordingSink {
        pub fn phases(&self) -> Vec<NoticePhase> {
            self.notices.lock().unwrap().iter().map(|n| n.phase).collect()
        }

        pub fn last_message(&self) -> Option<String> {
            self.notices.lock().unwrap().last().map(|n| n.message.clone())
        }
    }
}
