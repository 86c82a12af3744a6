//! Cost spike detection.
//!
//! A pure function over a time-ordered daily-cost window. A day counts as a
//! spike when it exceeds three times the trailing average and a $1 absolute
//! floor (the floor keeps near-zero accounts from flagging noise).

use crate::core::models::{Anomaly, DailyCost};

/// Multiplier over the trailing average that qualifies as a spike.
const SPIKE_FACTOR: f64 = 3.0;

/// Absolute floor below which a day is never a spike.
const SPIKE_FLOOR: f64 = 1.0;

/// Minimum number of data points required for a signal.
const MIN_POINTS: usize = 3;

/// Detect a spike in the latest entry of `history`.
///
/// Returns `None` when there are fewer than three points (no signal, not an
/// error). The baseline is the mean of every entry except the last.
#[must_use]
pub fn detect(history: &[DailyCost]) -> Option<Anomaly> {
    if history.len() < MIN_POINTS {
        return None;
    }

    let (latest, earlier) = history.split_last()?;

    #[allow(clippy::cast_precision_loss)] // window length is small
    let baseline = earlier.iter().map(|d| d.cost).sum::<f64>() / earlier.len() as f64;

    let is_anomaly = latest.cost > SPIKE_FACTOR * baseline && latest.cost > SPIKE_FLOOR;
    if !is_anomaly {
        return None;
    }

    Some(Anomaly {
        is_anomaly: true,
        today_cost: latest.cost,
        average: baseline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(costs: &[f64]) -> Vec<DailyCost> {
        costs
            .iter()
            .enumerate()
            .map(|(i, &c)| DailyCost::new(format!("2025-06-{:02}", i + 1), c))
            .collect()
    }

    #[test]
    fn flags_spike_over_flat_baseline() {
        let anomaly = detect(&history(&[1.0, 1.0, 1.0, 1.0, 10.0])).unwrap();
        assert!(anomaly.is_anomaly);
        assert!((anomaly.average - 1.0).abs() < f64::EPSILON);
        assert!((anomaly.today_cost - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn flat_history_is_not_a_spike() {
        // 5 is not greater than 3 * 5
        assert!(detect(&history(&[5.0, 5.0, 5.0])).is_none());
    }

    #[test]
    fn insufficient_data_is_no_signal() {
        assert!(detect(&history(&[1.0, 1.0])).is_none());
        assert!(detect(&[]).is_none());
    }

    #[test]
    fn absolute_floor_suppresses_noise() {
        // 0.9 is 9x the baseline but under the $1 floor
        assert!(detect(&history(&[0.1, 0.1, 0.9])).is_none());
    }

    #[test]
    fn just_over_threshold_flags() {
        let anomaly = detect(&history(&[2.0, 2.0, 2.0, 6.1])).unwrap();
        assert!((anomaly.average - 2.0).abs() < f64::EPSILON);
    }
}
