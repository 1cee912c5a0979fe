//! Contamination Threshold
//!
//! Turns per-cycle anomaly scores into a binary decision: the top
//! `contamination` share of the score distribution is flagged.
//! Ties at the cut-off stay normal, so identical scores never flag.

/// Decision boundary for one snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContaminationThreshold {
    pub contamination: f64,
    pub cutoff: f64,
}

impl ContaminationThreshold {
    /// Cut-off is the `1 - contamination` quantile of `scores`
    /// (linear interpolation between closest ranks).
    pub fn from_scores(scores: &[f64], contamination: f64) -> Self {
        Self {
            contamination,
            cutoff: quantile(scores, 1.0 - contamination),
        }
    }

    /// Check if score is past the cut-off
    pub fn is_anomaly(&self, score: f64) -> bool {
        score > self.cutoff
    }
}

fn quantile(scores: &[f64], q: f64) -> f64 {
    if scores.is_empty() {
        return f64::INFINITY;
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let frac = position - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolation() {
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.5), 3.0);
        assert!((quantile(&[0.0, 10.0], 0.9) - 9.0).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.9), f64::INFINITY);
    }

    #[test]
    fn test_flags_top_fraction() {
        let scores: Vec<f64> = (0..20).map(|i| i as f64 / 20.0).collect();
        let threshold = ContaminationThreshold::from_scores(&scores, 0.1);

        let flagged = scores.iter().filter(|s| threshold.is_anomaly(**s)).count();
        assert_eq!(flagged, 2);
    }

    #[test]
    fn test_ties_are_not_flagged() {
        let scores = [0.4; 12];
        let threshold = ContaminationThreshold::from_scores(&scores, 0.1);
        assert!(scores.iter().all(|s| !threshold.is_anomaly(*s)));
    }
}
