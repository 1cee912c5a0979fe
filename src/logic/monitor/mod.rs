//! Monitor Loop
//!
//! Fetch → Detect → Correlate (one anomaly at a time) → Sleep, forever.
//! Each stage's failure is caught where it happens and turned into a
//! `CycleReport`; nothing that goes wrong inside a cycle stops the loop.
//! The poll interval is both the cadence and the failure cool-down.

pub mod report;


pub use report::{Correlation, CycleOutcome, CycleReport, ImageSummary, MonitorState};

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{sleep_until, timeout, Instant};

use crate::logic::config::MonitorConfig;
use crate::logic::detector::{AnomalyDetection, AnomalyDetector, LabeledRecord};
use crate::logic::error::{FetchError, ImageryError};
use crate::logic::imagery::{
    ImageConfirmer, ImageryCorrelator, ImagerySource, TimeRange, Unevaluated,
};
use crate::logic::telemetry::TelemetrySource;

pub struct MonitorLoop<T, I, D = AnomalyDetector, C = Unevaluated> {
    telemetry: T,
    detector: D,
    correlator: ImageryCorrelator<I>,
    confirmer: C,
    time_range: TimeRange,
    poll_interval: Duration,
    request_timeout: Duration,
    state: MonitorState,
    cycles: u64,
}

impl<T, I> MonitorLoop<T, I>
where
    T: TelemetrySource,
    I: ImagerySource,
{
    /// Loop with the isolation-forest detector and no image confirmation
    pub fn new(config: &MonitorConfig, telemetry: T, imagery: I) -> Self {
        Self {
            telemetry,
            detector: AnomalyDetector::new(config.detector.clone()),
            correlator: ImageryCorrelator::new(imagery, config.imagery.padding_deg),
            confirmer: Unevaluated,
            time_range: config.imagery.time_range,
            poll_interval: config.poll_interval,
            request_timeout: config.request_timeout,
            state: MonitorState::Idle,
            cycles: 0,
        }
    }
}

impl<T, I, D, C> MonitorLoop<T, I, D, C>
where
    T: TelemetrySource,
    I: ImagerySource,
    D: AnomalyDetection,
    C: ImageConfirmer,
{
    /// Swap the detection stage
    pub fn with_detector<D2: AnomalyDetection>(self, detector: D2) -> MonitorLoop<T, I, D2, C> {
        MonitorLoop {
            telemetry: self.telemetry,
            detector,
            correlator: self.correlator,
            confirmer: self.confirmer,
            time_range: self.time_range,
            poll_interval: self.poll_interval,
            request_timeout: self.request_timeout,
            state: self.state,
            cycles: self.cycles,
        }
    }

    /// Plug in image-based confirmation of anomalies
    pub fn with_confirmer<C2: ImageConfirmer>(self, confirmer: C2) -> MonitorLoop<T, I, D, C2> {
        MonitorLoop {
            telemetry: self.telemetry,
            detector: self.detector,
            correlator: self.correlator,
            confirmer,
            time_range: self.time_range,
            poll_interval: self.poll_interval,
            request_timeout: self.request_timeout,
            state: self.state,
            cycles: self.cycles,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Cycles started so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run until `shutdown` turns true
    pub async fn run(&mut self, shutdown: watch::Receiver<bool>) {
        self.run_with(shutdown, |_| {}).await
    }

    /// Run until `shutdown` turns true, handing every report to `on_report`.
    /// Shutdown is honoured between cycles only: before one starts or while
    /// sleeping.
    pub async fn run_with<F>(&mut self, mut shutdown: watch::Receiver<bool>, mut on_report: F)
    where
        F: FnMut(&CycleReport),
    {
        log::info!(
            "Monitor loop started (poll interval {}s, imagery window {})",
            self.poll_interval.as_secs(),
            self.time_range
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.transition(MonitorState::Idle);
            let report = self.run_cycle().await;
            on_report(&report);

            self.transition(MonitorState::Sleeping);
            if self.sleep_or_shutdown(&mut shutdown).await {
                break;
            }
        }

        self.transition(MonitorState::Terminated);
        log::info!("Monitor loop stopped after {} cycle(s)", self.cycles);
    }

    /// One full cycle. The state is left at the last stage entered.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        let cycle = self.cycles;
        let started_at = Utc::now();

        let outcome = self.cycle_outcome(cycle).await;
        CycleReport { cycle, started_at, outcome }
    }

    async fn cycle_outcome(&mut self, cycle: u64) -> CycleOutcome {
        self.transition(MonitorState::Fetching);
        let fetched = match timeout(self.request_timeout, self.telemetry.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.request_timeout.as_secs())),
        };
        let table = match fetched {
            Ok(table) => table,
            Err(e) => {
                log::error!("Cycle {}: telemetry fetch failed: {}", cycle, e);
                return CycleOutcome::FetchFailed(e);
            }
        };

        self.transition(MonitorState::Detecting);
        let anomalies = match self.detector.detect(&table) {
            Ok(anomalies) => anomalies,
            Err(e) => {
                log::error!("Cycle {}: anomaly detection failed: {}", cycle, e);
                return CycleOutcome::DetectionFailed(e);
            }
        };

        if anomalies.is_empty() {
            log::info!("No anomalies detected at this time.");
        } else {
            log::info!(
                "Anomalies detected: {} of {} vessels",
                anomalies.len(),
                table.len()
            );
        }

        let total = anomalies.len();
        let mut correlations = Vec::with_capacity(total);
        for (index, anomaly) in anomalies.iter().enumerate() {
            self.transition(MonitorState::Correlating { current: index + 1, total });
            correlations.push(self.correlate(anomaly).await);
        }

        CycleOutcome::Completed {
            vessels: table.len(),
            correlations,
        }
    }

    async fn correlate(&self, anomaly: &LabeledRecord) -> Correlation {
        let record = &anomaly.record;
        log::info!(
            "Anomaly: vessel {} at ({}, {}) score {:.3}",
            record.vessel_id,
            fmt_coord(record.latitude),
            fmt_coord(record.longitude),
            anomaly.score
        );

        let Some(point) = record.position() else {
            let err = ImageryError::MissingPosition(record.vessel_id.clone());
            log::warn!("Imagery skipped: {}", err);
            return Correlation {
                vessel_id: record.vessel_id.clone(),
                position: None,
                score: anomaly.score,
                window: None,
                outcome: Err(err),
            };
        };

        let window = self.correlator.window_for(point, self.time_range);
        let request = self.correlator.fetch(point, self.time_range);
        let fetched = match timeout(self.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ImageryError::Timeout(self.request_timeout.as_secs())),
        };

        let outcome = match fetched {
            Ok(image) => {
                let confirmation = self.confirmer.confirm(anomaly, &image);
                log::info!(
                    "Processed imagery for anomaly at: {}, {} (vessel {}, {} bytes, {:?})",
                    point.0,
                    point.1,
                    record.vessel_id,
                    image.len(),
                    confirmation
                );
                Ok(ImageSummary {
                    bytes: image.len(),
                    content_type: image.content_type,
                    confirmation,
                })
            }
            Err(e) => {
                log::warn!(
                    "Imagery failed for vessel {} window {}: {}",
                    record.vessel_id,
                    window,
                    e
                );
                Err(e)
            }
        };

        Correlation {
            vessel_id: record.vessel_id.clone(),
            position: Some(point),
            score: anomaly.score,
            window: Some(window),
            outcome,
        }
    }

    /// Sleep one poll interval. Returns true if shutdown was requested.
    async fn sleep_or_shutdown(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let deadline = Instant::now() + self.poll_interval;

        loop {
            tokio::select! {
                _ = sleep_until(deadline) => return false,
                changed = shutdown.changed() => match changed {
                    Ok(()) if *shutdown.borrow() => return true,
                    Ok(()) => continue,
                    Err(_) => {
                        // Sender gone: nobody can stop us any more
                        sleep_until(deadline).await;
                        return false;
                    }
                },
            }
        }
    }

    fn transition(&mut self, next: MonitorState) {
        if self.state != next {
            log::debug!("Monitor state: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

fn fmt_coord(value: Option<f64>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}
