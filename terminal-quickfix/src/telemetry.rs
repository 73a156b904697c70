//! Quick fix outcome reporting.
//!
//! Reports are logged and, when a consumer is connected, pushed onto an
//! unbounded `flume` channel. Sending never blocks and a dropped receiver is
//! not an error.

use crate::outcome::QuickFixReport;

#[derive(Debug, Clone, Default)]
pub struct TelemetryReporter {
    tx: Option<flume::Sender<QuickFixReport>>,
}

impl TelemetryReporter {
    /// Reporter feeding `tx`.
    pub fn new(tx: flume::Sender<QuickFixReport>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Reporter plus the receiving end of its channel.
    pub fn channel() -> (Self, flume::Receiver<QuickFixReport>) {
        let (tx, rx) = flume::unbounded();
        (Self::new(tx), rx)
    }

    /// Reporter that only logs.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    pub fn report(&self, report: QuickFixReport) {
        tracing::debug!(
            target: "terminal/quick-fix",
            quick_fix_id = %report.quick_fix_id,
            fixes_shown = report.fixes_shown,
            ran_quick_fix_command = ?report.ran_quick_fix_command,
            "quick fix outcome"
        );
        if let Some(tx) = &self.tx {
            let _ = tx.send(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ran: Option<bool>) -> QuickFixReport {
        QuickFixReport {
            quick_fix_id: "Git Push Set Upstream".into(),
            fixes_shown: true,
            ran_quick_fix_command: ran,
        }
    }

    #[test]
    fn reports_reach_the_receiver() {
        let (reporter, rx) = TelemetryReporter::channel();
        reporter.report(sample(Some(true)));
        assert_eq!(rx.try_recv().unwrap(), sample(Some(true)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (reporter, rx) = TelemetryReporter::channel();
        drop(rx);
        reporter.report(sample(None));
    }

    #[test]
    fn disabled_reporter_has_no_channel() {
        let reporter = TelemetryReporter::disabled();
        assert!(!reporter.is_enabled());
        reporter.report(sample(Some(false)));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(sample(Some(false))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "quickFixId": "Git Push Set Upstream",
                "fixesShown": true,
                "ranQuickFixCommand": false,
            })
        );

        let json = serde_json::to_value(sample(None)).unwrap();
        assert!(json.get("ranQuickFixCommand").is_none());
    }
}
