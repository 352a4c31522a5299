// src/pipeline/monitor.rs

//! Polling loop controller.
//!
//! Owns the poller, the notifier and the daily tracker. Each cycle polls
//! every target in order, diffs the slots against what was already seen
//! today and sends one message for the new ones.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use futures::StreamExt;

use crate::models::{PollTarget, PollingConfig, Slot};
use crate::pipeline::tracker::SlotTracker;
use crate::services::notifier::{self, Notifier};
use crate::services::{PollOutcome, SlotPoller};

/// Loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Sleep between cycles
    pub interval: Duration,
    /// Pause after an outage before retrying the same target
    pub outage_pause: Duration,
}

impl From<&PollingConfig> for MonitorSettings {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            outage_pause: Duration::from_secs(config.outage_pause_secs),
        }
    }
}

impl MonitorSettings {
    /// Same timing, but retry an outage target immediately.
    pub fn without_outage_pause(self) -> Self {
        Self {
            outage_pause: Duration::ZERO,
            ..self
        }
    }
}

/// What happened during one poll cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Seen slots were cleared before this cycle
    pub reset: bool,
    pub targets: usize,
    pub unreachable: usize,
    pub outages: usize,
    /// Slots listed across all targets
    pub found: usize,
    /// Slots not seen earlier today, keyed by URL
    pub new_slots: BTreeMap<String, Slot>,
}

/// Slots gathered from one pass over the targets.
#[derive(Debug, Default)]
pub struct Harvest {
    pub slots: Vec<Slot>,
    pub unreachable: usize,
    pub outages: usize,
}

/// The polling loop and all state it carries between cycles.
pub struct Monitor {
    poller: SlotPoller,
    notifier: Box<dyn Notifier>,
    targets: Vec<PollTarget>,
    tracker: SlotTracker,
    settings: MonitorSettings,
}

impl Monitor {
    pub fn new(
        poller: SlotPoller,
        notifier: Box<dyn Notifier>,
        targets: Vec<PollTarget>,
        settings: MonitorSettings,
        today: NaiveDate,
    ) -> Self {
        Self {
            poller,
            notifier,
            targets,
            tracker: SlotTracker::new(today),
            settings,
        }
    }

    pub fn targets(&self) -> &[PollTarget] {
        &self.targets
    }

    pub fn tracker(&self) -> &SlotTracker {
        &self.tracker
    }

    /// Poll every target once without touching the tracker.
    ///
    /// A target whose page has no results container triggers one outage
    /// message and a pause, then a single retry. If the retry still yields
    /// nothing usable the target is skipped for this pass.
    pub async fn harvest(&self) -> Harvest {
        let mut harvest = Harvest::default();
        let mut results = Box::pin(self.poller.poll(&self.targets));

        while let Some((target, outcome)) = results.next().await {
            let outcome = match outcome {
                PollOutcome::Outage => {
                    harvest.outages += 1;
                    self.pause_for_outage(target).await;
                    self.poller.poll_target(target).await
                }
                other => other,
            };

            match outcome {
                PollOutcome::Slots(slots) => harvest.slots.extend(slots),
                PollOutcome::Unreachable(_) => harvest.unreachable += 1,
                PollOutcome::Outage => {
                    log::warn!("{} still has no timeslots after pausing, skipping", target);
                }
            }
        }

        harvest
    }

    async fn pause_for_outage(&self, target: &PollTarget) {
        let url = target.url(self.poller.portal_base());
        let text = notifier::render_outage(&url, self.settings.outage_pause);
        notifier::deliver(self.notifier.as_ref(), &text).await;
        log::warn!(
            "Pausing {:?} before retrying {}",
            self.settings.outage_pause,
            target
        );
        tokio::time::sleep(self.settings.outage_pause).await;
    }

    /// Run one cycle for the given local date.
    pub async fn run_cycle(&mut self, today: NaiveDate) -> CycleReport {
        let reset = self.tracker.roll_over(today);
        let harvest = self.harvest().await;
        let found = harvest.slots.len();
        let new_slots = self.tracker.observe(harvest.slots);

        if !new_slots.is_empty() {
            let rendered = notifier::render(&new_slots, self.tracker.daily_counts());
            log::info!("Found {} new slot(s)", new_slots.len());
            notifier::deliver(self.notifier.as_ref(), &rendered.text).await;
            self.tracker.record(&rendered.increments);
        } else {
            log::debug!("No new slots ({} listed)", found);
        }

        CycleReport {
            reset,
            targets: self.targets.len(),
            unreachable: harvest.unreachable,
            outages: harvest.outages,
            found,
            new_slots,
        }
    }

    /// Poll forever, sleeping between cycles.
    pub async fn run(&mut self) {
        log::info!(
            "Watching {} target(s) every {:?}",
            self.targets.len(),
            self.settings.interval
        );
        loop {
            let today = Local::now().date_naive();
            self.run_cycle(today).await;
            tokio::time::sleep(self.settings.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::error::{AppError, Result};
    use crate::services::PageSource;

    const BASE: &str = "https://portal.test";

    /// Serves a scripted sequence of responses per URL; the last one repeats.
    /// `None` fails the request.
    #[derive(Default)]
    struct ScriptedSource {
        script: Mutex<HashMap<String, VecDeque<Option<String>>>>,
    }

    impl ScriptedSource {
        fn with(mut self, url: String, responses: Vec<Option<String>>) -> Self {
            self.script.get_mut().unwrap().insert(url, responses.into());
            self
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch(&self, url: &str) -> Result<String> {
            let mut script = self.script.lock().unwrap();
            let queue = script
                .get_mut(url)
                .ok_or_else(|| AppError::Io(std::io::ErrorKind::NotFound.into()))?;
            let response = if queue.len() > 1 {
                queue.pop_front().flatten()
            } else {
                queue.front().cloned().flatten()
            };
            response.ok_or_else(|| AppError::Io(std::io::ErrorKind::ConnectionReset.into()))
        }
    }

    #[derive(Clone, Default)]
    struct Recorder {
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for Recorder {
        async fn send(&self, text: &str) -> Result<()> {
            self.messages.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    /// Records every attempt, then fails like a rejected Slack post.
    #[derive(Clone, Default)]
    struct FailingNotifier {
        attempts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, text: &str) -> Result<()> {
            self.attempts.lock().unwrap().push(text.to_string());
            Err(AppError::notify("channel_not_found"))
        }
    }

    fn target(location: &'static str, location_code: u32) -> PollTarget {
        PollTarget {
            appointment_type: "REAL ID",
            type_code: 12,
            location,
            location_code,
        }
    }

    fn slots_page(target: &PollTarget, times: &[&str]) -> Option<String> {
        let links: String = times
            .iter()
            .map(|t| {
                format!(
                    r#"<a href="/njmvc/AppointmentWizard/{}/{}/2024-05-20/{}">{}</a>"#,
                    target.type_code, target.location_code, t, t
                )
            })
            .collect();
        Some(format!(r#"<html><body><div id="timeslots">{links}</div></body></html>"#))
    }

    fn down_page() -> Option<String> {
        Some("<html><body><h1>We'll be back soon</h1></body></html>".to_string())
    }

    fn monitor(source: ScriptedSource, targets: Vec<PollTarget>, recorder: &Recorder) -> Monitor {
        Monitor::new(
            SlotPoller::new(Box::new(source), BASE),
            Box::new(recorder.clone()),
            targets,
            MonitorSettings {
                interval: Duration::ZERO,
                outage_pause: Duration::ZERO,
            },
            day(20),
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn times(report: &CycleReport) -> Vec<String> {
        report.new_slots.values().map(|s| s.time.clone()).collect()
    }

    #[tokio::test]
    async fn test_dedup_and_rollover_across_cycles() {
        let edison = target("EDISON", 132);
        let source = ScriptedSource::default().with(
            edison.url(BASE),
            vec![
                slots_page(&edison, &["1000", "1100"]),
                slots_page(&edison, &["1100", "1200"]),
                slots_page(&edison, &["1100"]),
            ],
        );
        let recorder = Recorder::default();
        let mut monitor = monitor(source, vec![edison], &recorder);

        let first = monitor.run_cycle(day(20)).await;
        assert_eq!(times(&first), vec!["1000", "1100"]);

        let second = monitor.run_cycle(day(20)).await;
        assert_eq!(times(&second), vec!["1200"]);
        assert_eq!(monitor.tracker().daily_counts()["REAL ID"], 3);

        let third = monitor.run_cycle(day(21)).await;
        assert!(third.reset);
        assert_eq!(times(&third), vec!["1100"]);

        let messages = recorder.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[1].contains("REAL ID slot #3:"));
        // Counter restarted after the rollover.
        assert!(messages[2].contains("REAL ID slot #1:"));
    }

    #[tokio::test]
    async fn test_failed_delivery_still_advances_counts() {
        let edison = target("EDISON", 132);
        let source = ScriptedSource::default().with(
            edison.url(BASE),
            vec![
                slots_page(&edison, &["1000", "1100"]),
                slots_page(&edison, &["1100", "1200"]),
            ],
        );
        let failing = FailingNotifier::default();
        let mut monitor = Monitor::new(
            SlotPoller::new(Box::new(source), BASE),
            Box::new(failing.clone()),
            vec![edison],
            MonitorSettings {
                interval: Duration::ZERO,
                outage_pause: Duration::ZERO,
            },
            day(20),
        );

        let first = monitor.run_cycle(day(20)).await;
        assert_eq!(first.new_slots.len(), 2);
        assert_eq!(monitor.tracker().daily_counts()["REAL ID"], 2);

        let second = monitor.run_cycle(day(20)).await;
        assert_eq!(times(&second), vec!["1200"]);
        assert_eq!(monitor.tracker().daily_counts()["REAL ID"], 3);

        let attempts = failing.attempts.lock().unwrap().clone();
        assert_eq!(attempts.len(), 2);
        assert!(attempts[1].contains("REAL ID slot #3:"));
    }

    #[test]
    fn test_without_outage_pause_keeps_interval() {
        let settings = MonitorSettings {
            interval: Duration::from_secs(10),
            outage_pause: Duration::from_secs(1800),
        }
        .without_outage_pause();
        assert_eq!(settings.interval, Duration::from_secs(10));
        assert_eq!(settings.outage_pause, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_no_message_without_new_slots() {
        let edison = target("EDISON", 132);
        let source =
            ScriptedSource::default().with(edison.url(BASE), vec![slots_page(&edison, &["900"])]);
        let recorder = Recorder::default();
        let mut monitor = monitor(source, vec![edison], &recorder);

        monitor.run_cycle(day(20)).await;
        let again = monitor.run_cycle(day(20)).await;
        assert!(again.new_slots.is_empty());
        assert_eq!(again.found, 1);
        assert_eq!(recorder.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_outage_notifies_once_and_spares_other_targets() {
        let edison = target("EDISON", 132);
        let newark = target("NEWARK", 138);
        let source = ScriptedSource::default()
            .with(
                edison.url(BASE),
                vec![down_page(), slots_page(&edison, &["830"])],
            )
            .with(newark.url(BASE), vec![slots_page(&newark, &["915"])]);
        let recorder = Recorder::default();
        let mut monitor = monitor(source, vec![edison, newark], &recorder);

        let report = monitor.run_cycle(day(20)).await;
        assert_eq!(report.outages, 1);
        assert_eq!(report.unreachable, 0);
        assert_eq!(report.new_slots.len(), 2);

        let messages = recorder.messages();
        let outage_messages: Vec<_> = messages
            .iter()
            .filter(|m| m.contains("site looks down"))
            .collect();
        assert_eq!(outage_messages.len(), 1);
        assert!(outage_messages[0].contains("/njmvc/AppointmentWizard/12/132"));
        assert!(messages.last().unwrap().contains("NEWARK"));
    }

    #[tokio::test]
    async fn test_persistent_outage_skips_target_after_one_retry() {
        let edison = target("EDISON", 132);
        let source = ScriptedSource::default().with(edison.url(BASE), vec![down_page()]);
        let recorder = Recorder::default();
        let mut monitor = monitor(source, vec![edison], &recorder);

        let report = monitor.run_cycle(day(20)).await;
        assert_eq!(report.outages, 1);
        assert!(report.new_slots.is_empty());
        assert_eq!(recorder.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_target_is_skipped() {
        let edison = target("EDISON", 132);
        let lodi = target("LODI", 136);
        let source = ScriptedSource::default()
            .with(edison.url(BASE), vec![None])
            .with(lodi.url(BASE), vec![slots_page(&lodi, &["1000"])]);
        let recorder = Recorder::default();
        let mut monitor = monitor(source, vec![edison, lodi], &recorder);

        let report = monitor.run_cycle(day(20)).await;
        assert_eq!(report.targets, 2);
        assert_eq!(report.unreachable, 1);
        assert_eq!(report.outages, 0);
        assert_eq!(times(&report), vec!["1000"]);

        let messages = recorder.messages();
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].contains("site looks down"));
    }

    #[tokio::test]
    async fn test_harvest_leaves_tracker_untouched() {
        let edison = target("EDISON", 132);
        let source =
            ScriptedSource::default().with(edison.url(BASE), vec![slots_page(&edison, &["900"])]);
        let recorder = Recorder::default();
        let monitor = monitor(source, vec![edison], &recorder);

        let harvest = monitor.harvest().await;
        assert_eq!(harvest.slots.len(), 1);
        assert_eq!(monitor.tracker().seen_count(), 0);
        assert!(recorder.messages().is_empty());
    }
}
