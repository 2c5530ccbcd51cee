use crate::health::ServiceStatus;
use crate::model::{CycleError, Severity};
use crate::notifier::Sink;
use crate::poller::{CycleOutcome, PollCycle};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// Runs poll cycles back to back with a fixed pause; one cycle at a time.
pub struct Scheduler {
    cycle: PollCycle,
    sink: Arc<dyn Sink>,
    interval: Duration,
    status: Arc<ServiceStatus>,
}

impl Scheduler {
    pub fn new(
        cycle: PollCycle,
        sink: Arc<dyn Sink>,
        interval: Duration,
        status: Arc<ServiceStatus>,
    ) -> Self {
        status.set_known(cycle.known_count());
        Self {
            cycle,
            sink,
            interval,
            status,
        }
    }

    /// Loops until `shutdown` fires. The signal is only observed between cycles.
    pub async fn run(mut self, shutdown: Arc<Notify>) {
        loop {
            self.tick().await;

            info!("Waiting {}s until the next check...", self.interval.as_secs());
            tokio::select! {
                _ = sleep(self.interval) => {}
                _ = shutdown.notified() => {
                    info!("🛑 Shutdown requested, leaving poll loop.");
                    break;
                }
            }
        }
    }

    /// Runs one cycle, absorbing any error or panic, and sends the status report.
    pub async fn tick(&mut self) -> usize {
        let result = match AssertUnwindSafe(self.cycle.run()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(CycleError::Panicked(panic_message(panic.as_ref()))),
        };

        self.status.set_known(self.cycle.known_count());

        let (sent, report) = match result {
            Ok(outcome) => (outcome.sent(), status_report(&outcome)),
            Err(e) => {
                error!("Cycle failed: {}", e);
                (0, Some((format!("Check failed: {}", e), Severity::Error)))
            }
        };
        self.status.record_cycle(sent);

        if let Some((message, severity)) = report {
            if let Err(e) = self.sink.notify_status(&message, severity).await {
                warn!("Status report not delivered: {}", e);
            }
        }
        sent
    }
}

/// Status message for a finished cycle; `None` when the cycle already reported itself.
pub fn status_report(outcome: &CycleOutcome) -> Option<(String, Severity)> {
    match *outcome {
        CycleOutcome::Baseline { recorded } => Some((
            format!(
                "Baseline recorded: {} listings currently on the page. Watching for new ones.",
                recorded
            ),
            Severity::Success,
        )),
        CycleOutcome::Completed { matched, sent, .. } if sent < matched => Some((
            format!(
                "{} new listing(s) matched, but only {} were delivered; the rest were dropped.",
                matched, sent
            ),
            Severity::Warning,
        )),
        CycleOutcome::Completed { sent, .. } if sent > 0 => Some((
            format!("Found {} new matching listing(s).", sent),
            Severity::Success,
        )),
        CycleOutcome::Completed { new, .. } => Some((
            format!("No new matching listings ({} new, none matched the keywords).", new),
            Severity::Info,
        )),
        CycleOutcome::NoListings => Some((
            "The search page contained no recognisable listings; the page layout may have changed."
                .to_string(),
            Severity::Warning,
        )),
        CycleOutcome::FetchFailed => None,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScraperError;
    use crate::parser::OlxParser;
    use crate::poller::tests::{card, cycle_with, page, RecordingSink};
    use crate::scraper::Scraper;
    use crate::storage::memory::MemoryBackend;
    use crate::storage::IdentityStore;
    use url::Url;

    fn scheduler(cycle: PollCycle, sink: Arc<RecordingSink>) -> (Scheduler, Arc<ServiceStatus>) {
        let status = Arc::new(ServiceStatus::new());
        let s = Scheduler::new(cycle, sink, Duration::from_secs(3600), status.clone());
        (s, status)
    }

    #[tokio::test]
    async fn reports_every_outcome_with_matching_severity() {
        let sink = Arc::new(RecordingSink::default());
        let cycle = cycle_with(
            vec![
                Ok(page(&[card(1, "iPhone 14 Pro")])),
                Ok(page(&[card(1, "iPhone 14 Pro"), card(2, "iPhone 14 Pro 256")])),
                Ok(page(&[card(1, "iPhone 14 Pro"), card(2, "iPhone 14 Pro 256")])),
            ],
            MemoryBackend::default(),
            sink.clone(),
        );
        let (mut scheduler, status) = scheduler(cycle, sink.clone());

        assert_eq!(scheduler.tick().await, 0);
        assert_eq!(scheduler.tick().await, 1);
        assert_eq!(scheduler.tick().await, 0);

        let severities: Vec<Severity> = sink.statuses().into_iter().map(|(_, s)| s).collect();
        assert_eq!(
            severities,
            vec![Severity::Success, Severity::Success, Severity::Info]
        );
        assert_eq!(status.known(), 2);
        assert_eq!(status.cycles(), 3);
        assert_eq!(status.notified(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_once() {
        let sink = Arc::new(RecordingSink::default());
        let cycle = cycle_with(
            vec![Err(ScraperError::InvalidResponse(503))],
            MemoryBackend::with_ids(&["1"]),
            sink.clone(),
        );
        let (mut scheduler, _) = scheduler(cycle, sink.clone());

        assert_eq!(scheduler.tick().await, 0);

        let statuses = sink.statuses();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].1, Severity::Error);
    }

    struct PanickingScraper;

    #[async_trait::async_trait]
    impl Scraper for PanickingScraper {
        async fn fetch(&self) -> Result<String, ScraperError> {
            panic!("selector blew up");
        }
    }

    #[tokio::test]
    async fn panicking_cycle_is_reported_and_loop_survives() {
        let sink = Arc::new(RecordingSink::default());
        let parser = OlxParser::new(Url::parse("https://www.olx.pl").unwrap()).unwrap();
        let store = IdentityStore::open(Box::new(MemoryBackend::default())).unwrap();
        let cycle = PollCycle::new(
            Box::new(PanickingScraper),
            parser,
            store,
            vec!["14 pro".into()],
            sink.clone(),
        );
        let (mut scheduler, status) = scheduler(cycle, sink.clone());

        assert_eq!(scheduler.tick().await, 0);
        assert_eq!(scheduler.tick().await, 0);

        let statuses = sink.statuses();
        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].0.contains("selector blew up"));
        assert!(statuses.iter().all(|(_, s)| *s == Severity::Error));
        assert_eq!(status.cycles(), 2);
    }

    #[tokio::test]
    async fn storage_error_is_reported_as_error() {
        let sink = Arc::new(RecordingSink::default());
        let cycle = cycle_with(
            vec![Ok(page(&[card(1, "iPhone 14 Pro")]))],
            MemoryBackend::failing(),
            sink.clone(),
        );
        let (mut scheduler, _) = scheduler(cycle, sink.clone());

        scheduler.tick().await;

        let statuses = sink.statuses();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].1, Severity::Error);
        assert!(statuses[0].0.contains("persist"));
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_after_finishing_cycle() {
        let sink = Arc::new(RecordingSink::default());
        let cycle = cycle_with(
            vec![Ok(page(&[card(1, "iPhone 14 Pro")]))],
            MemoryBackend::default(),
            sink.clone(),
        );
        let (scheduler, status) = scheduler(cycle, sink.clone());
        let shutdown = Arc::new(Notify::new());
        shutdown.notify_one();

        tokio::time::timeout(Duration::from_secs(5), scheduler.run(shutdown))
            .await
            .expect("loop should stop");

        assert_eq!(status.cycles(), 1);
        assert_eq!(status.known(), 1);
    }

    #[tokio::test]
    async fn undelivered_matches_are_reported_as_warning() {
        let sink = Arc::new(RecordingSink::rejecting());
        let cycle = cycle_with(
            vec![Ok(page(&[card(101, "iPhone 14 Pro")]))],
            MemoryBackend::with_ids(&["1"]),
            sink.clone(),
        );
        let (mut scheduler, status) = scheduler(cycle, sink.clone());

        assert_eq!(scheduler.tick().await, 0);

        let statuses = sink.statuses();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].1, Severity::Warning);
        assert!(statuses[0].0.contains("1 new listing(s) matched, but only 0 were delivered"));
        assert!(!statuses[0].0.contains("none matched"));
        assert_eq!(status.known(), 2);
    }

    #[test]
    fn partial_delivery_outranks_success() {
        let (message, severity) = status_report(&CycleOutcome::Completed {
            new: 3,
            matched: 2,
            sent: 1,
        })
        .unwrap();
        assert_eq!(severity, Severity::Warning);
        assert!(message.contains("2 new listing(s) matched, but only 1 were delivered"));

        let (_, severity) = status_report(&CycleOutcome::Completed {
            new: 3,
            matched: 0,
            sent: 0,
        })
        .unwrap();
        assert_eq!(severity, Severity::Info);
    }

    #[test]
    fn empty_page_is_a_warning() {
        let (_, severity) = status_report(&CycleOutcome::NoListings).unwrap();
        assert_eq!(severity, Severity::Warning);
        assert!(status_report(&CycleOutcome::FetchFailed).is_none());
    }
}
