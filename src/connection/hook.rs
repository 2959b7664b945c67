use crate::app::capture::Capture;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

const DRIVER_TARGET: &str = "tiberius";

/// Leading text of the environment change notices the driver logs at the same level and
/// target as server messages. tSQLt wraps every test in a transaction, so these show up
/// in every run.
const ENV_CHANGE_PREFIXES: &[&str] = &[
    "Begin transaction",
    "Commit transaction",
    "Rollback transaction",
    "Defect transaction",
    "Database change from",
    "Packet size change",
    "SQL collation change",
    "Server requested routing",
    "Fallback mirror server",
    "Ignored env change",
];

/// Forwards the driver's info messages (PRINT and low-severity RAISERROR output) to
/// the capture, filed under whichever test is executing.
#[derive(Debug, Clone)]
pub struct CaptureLayer {
    capture: Capture,
}

impl CaptureLayer {
    pub fn new(capture: Capture) -> Self {
        Self { capture }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() != Level::INFO || !metadata.target().starts_with(DRIVER_TARGET) {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if let Some(message) = visitor.message {
            if is_env_change(&message) {
                trace!("Skipping driver notice: {}", message);
                return;
            }
            for line in message.lines() {
                self.capture.record_current(line);
            }
        }
    }
}

fn is_env_change(message: &str) -> bool {
    ENV_CHANGE_PREFIXES
        .iter()
        .any(|prefix| message.starts_with(prefix))
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }
}

/// Installs the capture layer as the process-wide `tracing` subscriber.
pub fn install(capture: Capture) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    use tracing_subscriber::layer::SubscriberExt;

    let subscriber = tracing_subscriber::registry().with(CaptureLayer::new(capture));
    tracing::subscriber::set_global_default(subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::classify::classify;
    use crate::app::model::{Status, Test};
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_driver_info_events_reach_current_identity() {
        let capture = Capture::new();
        let subscriber = tracing_subscriber::registry().with(CaptureLayer::new(capture.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let _scope = capture.enter("DemoSuite");
            tracing::event!(target: "tiberius::tds::stream::token", Level::INFO, "{}", "|Test Execution Summary|");
            tracing::event!(target: "tiberius::tds::stream::token", Level::DEBUG, "{}", "debug noise");
            tracing::event!(target: "tsqlr", Level::INFO, "{}", "not from the driver");
        });

        assert_eq!(
            capture.retrieve("DemoSuite"),
            Some(vec!["|Test Execution Summary|".to_owned()])
        );
    }

    #[test]
    fn test_transaction_notices_do_not_fail_a_passing_suite() {
        let capture = Capture::new();
        let subscriber = tracing_subscriber::registry().with(CaptureLayer::new(capture.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let _scope = capture.enter("DemoSuite");
            for notice in &[
                "Begin transaction",
                "Database change from 'master' to 'tests'",
                "Packet size change from '4096' to '8192'",
                "Commit transaction",
                "Rollback transaction",
                "Defect transaction",
                "SQL collation change from None to None",
                "Ignored env change: Language",
            ] {
                tracing::event!(target: "tiberius::tds::stream::token", Level::INFO, "{}", notice);
            }
            tracing::event!(target: "tiberius::tds::stream::token", Level::INFO, "{}", "|Test Execution Summary|");
            tracing::event!(
                target: "tiberius::tds::stream::token",
                Level::INFO,
                "{}",
                "Test Case Summary: 1 test case(s) executed, 1 succeeded, 0 skipped, 0 failed, 0 errored."
            );
        });

        let captured = capture.retrieve("DemoSuite").unwrap();
        assert_eq!(captured[0], "|Test Execution Summary|");
        let outcome = classify(&Test::suite("DemoSuite"), &captured).unwrap();
        assert_eq!(outcome.status, Status::Pass);
    }

    #[test]
    fn test_multiline_messages_are_split() {
        let capture = Capture::new();
        let subscriber = tracing_subscriber::registry().with(CaptureLayer::new(capture.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let _scope = capture.enter("DemoSuite.MyTest");
            tracing::event!(target: "tiberius", Level::INFO, "{}", "first\n+-----+\nsecond");
        });

        assert_eq!(
            capture.retrieve("DemoSuite.MyTest"),
            Some(vec!["first".to_owned(), "second".to_owned()])
        );
    }
}
