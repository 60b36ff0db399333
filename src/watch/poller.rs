use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use tracing::{info, warn};

use crate::alert::engine::new_grades_alert;
use crate::alert::{Delivery, Notifier};
use crate::grading::metrics::{compute_metrics, CourseWeights};
use crate::grading::MetricsSnapshot;
use crate::output::table::{render_course_table, render_metrics_table};
use crate::records::CourseRecord;
use crate::snapshot::SnapshotStore;
use crate::watch::history::{Observation, PollHistory};
use crate::watch::{CycleError, RecordSource};

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Failed(CycleError),
    FirstRun {
        records: usize,
        metrics: MetricsSnapshot,
        snapshot: Option<PathBuf>,
    },
    NewGrades {
        added: Vec<CourseRecord>,
        metrics: MetricsSnapshot,
        delivery: Delivery,
        snapshot: Option<PathBuf>,
    },
    NoChange,
}

pub struct Poller<S> {
    source: S,
    history: PollHistory,
    notifier: Notifier,
    store: SnapshotStore,
    weights: CourseWeights,
    interval: Duration,
}

impl<S: RecordSource> Poller<S> {
    pub fn new(
        source: S,
        notifier: Notifier,
        store: SnapshotStore,
        weights: CourseWeights,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            history: PollHistory::new(),
            notifier,
            store,
            weights,
            interval,
        }
    }

    /// Starts from a previously accepted record set instead of a first run.
    pub fn with_history(mut self, history: PollHistory) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &PollHistory {
        &self.history
    }

    /// Polls `iterations` times, or forever when `None`. Cycle failures never stop the loop.
    pub async fn run(&mut self, iterations: Option<u64>) {
        if iterations == Some(0) {
            return;
        }
        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            info!(cycle, "starting poll cycle");
            self.run_cycle().await;
            if iterations.is_some_and(|limit| cycle >= limit) {
                break;
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let records = match self.source.fetch_records().await {
            Ok(records) => records,
            Err(err) => {
                warn!("poll cycle failed: {err}");
                println!("[{}] 获取成绩失败：{err}", stamp());
                return CycleOutcome::Failed(err);
            }
        };

        match self.history.observe(&records) {
            Observation::First => {
                println!("[{}] 共获取 {} 门课程成绩", stamp(), records.len());
                println!("{}", render_course_table(&records));
                let metrics = self.report_metrics(&records);
                CycleOutcome::FirstRun {
                    records: records.len(),
                    metrics,
                    snapshot: self.persist(&records),
                }
            }
            Observation::Added(added) => {
                println!("[{}] 发现 {} 门新成绩", stamp(), added.len());
                println!("{}", render_course_table(&added));
                let delivery = match new_grades_alert(&added) {
                    Some(event) => self.notifier.dispatch(&event).await,
                    None => Delivery::Undelivered,
                };
                let metrics = self.report_metrics(&records);
                CycleOutcome::NewGrades {
                    added,
                    metrics,
                    delivery,
                    snapshot: self.persist(&records),
                }
            }
            Observation::Unchanged => {
                println!("[{}] 暂无新成绩", stamp());
                CycleOutcome::NoChange
            }
        }
    }

    fn report_metrics(&self, records: &[CourseRecord]) -> MetricsSnapshot {
        let metrics = compute_metrics(records, self.weights);
        println!("{}", render_metrics_table(&metrics));
        metrics
    }

    fn persist(&self, records: &[CourseRecord]) -> Option<PathBuf> {
        match self.store.save(records, &Local::now()) {
            Ok(path) => {
                info!(path = %path.display(), "saved grade snapshot");
                Some(path)
            }
            Err(err) => {
                warn!("failed saving grade snapshot: {err:#}");
                None
            }
        }
    }
}

fn stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
