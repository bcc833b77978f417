// src/metrics/aggregator.rs

use crate::types::{AggregateResult, MetricSample};

#[derive(Debug, Default, Clone, Copy)]
struct RunningMean {
    sum: f64,
    count: u64,
}

impl RunningMean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }
}

/// Streaming sums and counts for the three metrics. Each metric
/// divides by its own count at the end; footwork speed typically has
/// fewer samples than the other two.
#[derive(Debug, Default)]
pub struct MetricAggregator {
    balance: RunningMean,
    posture: RunningMean,
    footwork: RunningMean,
}

impl MetricAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, sample: &MetricSample) {
        self.balance.add(sample.balance);
        self.posture.add(sample.posture);
        if let Some(speed) = sample.footwork_speed {
            self.footwork.add(speed);
        }
    }

    /// Per-metric means. Zero-count metrics report 0.0; an
    /// all-detection-failure clip yields the all-zero result, never a
    /// division failure.
    pub fn finalize(&self) -> AggregateResult {
        AggregateResult {
            mean_balance: self.balance.mean(),
            mean_posture: self.posture.mean(),
            mean_footwork_speed: self.footwork.mean(),
        }
    }

    #[allow(dead_code)]
    pub fn sample_count(&self) -> u64 {
        self.balance.count
    }

    pub fn footwork_count(&self) -> u64 {
        self.footwork.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn sample(balance: f64, posture: f64, footwork: Option<f64>) -> MetricSample {
        MetricSample {
            balance,
            posture,
            footwork_speed: footwork,
        }
    }

    #[test]
    fn zero_samples_finalize_to_all_zero() {
        let aggregator = MetricAggregator::new();
        let result = aggregator.finalize();
        assert_eq!(result.mean_balance, 0.0);
        assert_eq!(result.mean_posture, 0.0);
        assert_eq!(result.mean_footwork_speed, 0.0);
    }

    #[test]
    fn each_metric_divides_by_its_own_count() {
        let mut aggregator = MetricAggregator::new();
        aggregator.accept(&sample(0.1, 0.4, None));
        aggregator.accept(&sample(0.3, 0.6, Some(12.0)));
        aggregator.accept(&sample(0.2, 0.5, Some(6.0)));

        let result = aggregator.finalize();
        assert_approx_eq!(result.mean_balance, 0.2, 1e-12);
        assert_approx_eq!(result.mean_posture, 0.5, 1e-12);
        assert_approx_eq!(result.mean_footwork_speed, 9.0, 1e-12);

        assert_eq!(aggregator.sample_count(), 3);
        assert_eq!(aggregator.footwork_count(), 2);
    }

    #[test]
    fn footwork_absent_everywhere_still_yields_zero() {
        let mut aggregator = MetricAggregator::new();
        aggregator.accept(&sample(0.0, 0.0, None));
        assert_eq!(aggregator.finalize().mean_footwork_speed, 0.0);
        assert_eq!(aggregator.footwork_count(), 0);
    }
}
