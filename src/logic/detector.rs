//! Anomaly Detector
//!
//! Snapshot in, labelled rows out. Every call fits a fresh isolation forest
//! on the imputed features of that snapshot alone; nothing carries over
//! between cycles.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::logic::config::DetectorConfig;
use crate::logic::error::DetectionError;
use crate::logic::features::FeatureMatrix;
use crate::logic::model::{ContaminationThreshold, IsolationForest};
use crate::logic::telemetry::{TelemetryRecord, TelemetryTable};

/// Score given to rows of a snapshot too small to fit a model on
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Per-row outcome for the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyLabel {
    Normal,
    Anomaly,
}

/// Original telemetry row with its label attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub record: TelemetryRecord,
    pub label: AnomalyLabel,
    /// Isolation score in (0, 1], higher is more isolated
    pub score: f64,
}

impl LabeledRecord {
    pub fn is_anomaly(&self) -> bool {
        self.label == AnomalyLabel::Anomaly
    }
}

/// Snapshot classifier used by the monitor loop
pub trait AnomalyDetection {
    /// Anomalous rows only, each carrying its label
    fn detect(&self, table: &TelemetryTable) -> Result<Vec<LabeledRecord>, DetectionError>;
}

pub struct AnomalyDetector {
    config: DetectorConfig,
}

impl AnomalyDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Rows of `table` classified as anomalous, in input order
    pub fn detect(&self, table: &TelemetryTable) -> Result<Vec<LabeledRecord>, DetectionError> {
        let mut labeled = self.classify(table)?;
        labeled.retain(LabeledRecord::is_anomaly);
        Ok(labeled)
    }

    /// Every row of `table` with its label and score
    pub fn classify(&self, table: &TelemetryTable) -> Result<Vec<LabeledRecord>, DetectionError> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let matrix = FeatureMatrix::from_table(table)?;
        if matrix.imputed_cells() > 0 {
            log::debug!(
                "Imputed {} missing feature value(s) across {} rows",
                matrix.imputed_cells(),
                matrix.rows()
            );
        }

        if matrix.rows() < 2 {
            log::debug!("Snapshot has {} row(s), skipping model fit", matrix.rows());
            return Ok(label_all(table, |_| (AnomalyLabel::Normal, NEUTRAL_SCORE)));
        }

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let forest = IsolationForest::fit(
            matrix.values(),
            self.config.n_trees,
            self.config.sample_size,
            &mut rng,
        )?;
        let scores = forest.score_samples(matrix.values());
        let threshold = ContaminationThreshold::from_scores(&scores, self.config.contamination);

        log::debug!(
            "Fitted {} trees on {} rows, cut-off score {:.4}",
            forest.n_trees(),
            matrix.rows(),
            threshold.cutoff
        );

        Ok(label_all(table, |i| {
            let score = scores[i];
            let label = if threshold.is_anomaly(score) {
                AnomalyLabel::Anomaly
            } else {
                AnomalyLabel::Normal
            };
            (label, score)
        }))
    }
}

impl AnomalyDetection for AnomalyDetector {
    fn detect(&self, table: &TelemetryTable) -> Result<Vec<LabeledRecord>, DetectionError> {
        AnomalyDetector::detect(self, table)
    }
}

fn label_all<F>(table: &TelemetryTable, mut decide: F) -> Vec<LabeledRecord>
where
    F: FnMut(usize) -> (AnomalyLabel, f64),
{
    table
        .records()
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let (label, score) = decide(i);
            LabeledRecord {
                record: record.clone(),
                label,
                score,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::layout::{COL_COURSE, COL_LAT, COL_LON};
    use rand::Rng;

    fn detector() -> AnomalyDetector {
        AnomalyDetector::new(DetectorConfig {
            seed: Some(42),
            ..Default::default()
        })
    }

    fn vessel(id: &str, lat: f64, lon: f64, speed: f64, course: f64) -> TelemetryRecord {
        TelemetryRecord::new(id, Some(lat), Some(lon), Some(speed), Some(course))
    }

    fn clustered_fleet() -> (TelemetryTable, usize) {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut records: Vec<TelemetryRecord> = (0..100)
            .map(|i| {
                vessel(
                    &format!("in-{}", i),
                    10.0 + rng.gen_range(-0.05..0.05),
                    20.0 + rng.gen_range(-0.05..0.05),
                    12.0 + rng.gen_range(-0.5..0.5),
                    90.0 + rng.gen_range(-2.0..2.0),
                )
            })
            .collect();

        records.extend((0..10).map(|k| {
            let k = k as f64;
            vessel(
                &format!("out-{}", k),
                -40.0 + 8.0 * k,
                100.0 - 15.0 * k,
                45.0 + 3.0 * k,
                300.0 - 5.0 * k,
            )
        }));

        (TelemetryTable::with_standard_columns(records), 100)
    }

    #[test]
    fn test_empty_table() {
        let result = detector().detect(&TelemetryTable::empty()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_single_row_is_well_defined() {
        let table = TelemetryTable::with_standard_columns(vec![vessel("solo", 1.0, 2.0, 3.0, 4.0)]);

        assert!(detector().detect(&table).unwrap().is_empty());

        let labeled = detector().classify(&table).unwrap();
        assert_eq!(labeled.len(), 1);
        assert_eq!(labeled[0].label, AnomalyLabel::Normal);
        assert_eq!(labeled[0].score, NEUTRAL_SCORE);
    }

    #[test]
    fn test_output_is_labeled_subset() {
        let (table, _) = clustered_fleet();
        let anomalies = detector().detect(&table).unwrap();

        assert!(!anomalies.is_empty());
        for row in &anomalies {
            assert_eq!(row.label, AnomalyLabel::Anomaly);
            assert!(table.records().contains(&row.record));
        }
    }

    #[test]
    fn test_flags_far_outliers_not_cluster() {
        let (table, inliers) = clustered_fleet();
        let anomalies = detector().detect(&table).unwrap();

        let flagged_outliers = anomalies
            .iter()
            .filter(|r| r.record.vessel_id.starts_with("out-"))
            .count();
        let flagged_inliers = anomalies.len() - flagged_outliers;

        assert!(flagged_outliers >= 6, "only {} of 10 outliers flagged", flagged_outliers);
        assert!(
            flagged_inliers < inliers / 10,
            "{} of {} inliers flagged",
            flagged_inliers,
            inliers
        );
    }

    #[test]
    fn test_single_extreme_vessel() {
        let table = TelemetryTable::with_standard_columns(vec![
            vessel("a", 51.90, 4.10, 12.0, 270.0),
            vessel("b", 51.91, 4.12, 12.5, 272.0),
            vessel("c", -30.00, 120.00, 95.0, 10.0),
        ]);

        let anomalies = detector().detect(&table).unwrap();
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].record.vessel_id, "c");
    }

    #[test]
    fn test_all_null_column_still_scores() {
        let (table, _) = clustered_fleet();
        let records: Vec<TelemetryRecord> = table
            .records()
            .iter()
            .cloned()
            .map(|mut r| {
                r.speed = None;
                r
            })
            .collect();
        let table = TelemetryTable::with_standard_columns(records);

        let labeled = detector().classify(&table).unwrap();
        assert_eq!(labeled.len(), table.len());
        assert!(labeled.iter().all(|r| r.record.speed.is_none()));
    }

    #[test]
    fn test_missing_column_is_detection_error() {
        let table = TelemetryTable::new(
            ["MMSI", COL_LAT, COL_LON, COL_COURSE],
            vec![vessel("a", 1.0, 2.0, 3.0, 4.0), vessel("b", 1.5, 2.5, 3.5, 4.5)],
        );

        assert!(matches!(
            detector().detect(&table),
            Err(DetectionError::MissingColumn("SPEED"))
        ));
    }

    #[test]
    fn test_speeds_spanning_f64_range_do_not_panic() {
        let table = TelemetryTable::with_standard_columns(vec![
            vessel("a", 51.90, 4.10, -1.7e308, 270.0),
            vessel("b", 51.91, 4.12, 1.7e308, 272.0),
            vessel("c", -30.00, 120.00, 5.0, 10.0),
        ]);

        let labeled = detector().classify(&table).unwrap();
        assert_eq!(labeled.len(), 3);
        assert!(labeled.iter().all(|r| r.score.is_finite()));
    }

    #[test]
    fn test_huge_speeds_with_gap_do_not_panic() {
        let table = TelemetryTable::with_standard_columns(vec![
            vessel("a", 51.90, 4.10, 1.7e308, 270.0),
            vessel("b", 51.91, 4.12, 1.7e308, 272.0),
            TelemetryRecord::new("c", Some(-30.0), Some(120.0), None, Some(10.0)),
        ]);

        let labeled = detector().classify(&table).unwrap();
        assert_eq!(labeled.len(), 3);
        assert!(labeled.iter().all(|r| r.score.is_finite()));
    }
}
