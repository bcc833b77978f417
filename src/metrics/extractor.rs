// src/metrics/extractor.rs
//
// Per-frame geometric features. Balance and posture read normalized
// coordinates directly; footwork speed differences ankle positions in
// pixel space across consecutive detected frames.

use crate::landmarks::{
    LandmarkSet, LEFT_ANKLE, LEFT_HIP, LEFT_SHOULDER, RIGHT_ANKLE, RIGHT_HIP, RIGHT_SHOULDER,
};
use crate::types::MetricSample;

/// Pixel-space ankle positions from the most recent detected frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnklePositions {
    pub left: (f64, f64),
    pub right: (f64, f64),
}

pub struct MetricExtractor {
    history: Option<AnklePositions>,
    reset_history_on_gap: bool,
}

impl MetricExtractor {
    pub fn new(reset_history_on_gap: bool) -> Self {
        Self {
            history: None,
            reset_history_on_gap,
        }
    }

    /// Process one frame's (possibly absent) detection. Returns a
    /// sample only for detected frames; gaps yield `None` and, unless
    /// gap-reset is configured, leave the ankle history untouched so
    /// the next detection differences against the last known position.
    pub fn process(
        &mut self,
        detection: Option<&LandmarkSet>,
        frame_width: usize,
        frame_height: usize,
    ) -> Option<MetricSample> {
        let Some(set) = detection else {
            if self.reset_history_on_gap {
                self.history = None;
            }
            return None;
        };

        let current = ankle_pixels(set, frame_width, frame_height);
        let footwork_speed = self.history.map(|prev| ankle_displacement(&prev, &current));
        self.history = Some(current);

        Some(MetricSample {
            balance: balance(set),
            posture: posture(set),
            footwork_speed,
        })
    }
}

/// Shoulder-line levelness: |yL − yR| of the shoulders, normalized
/// units. No clamping; noisy keypoints may push it past 1.
pub fn balance(set: &LandmarkSet) -> f64 {
    (set.get(LEFT_SHOULDER).y as f64 - set.get(RIGHT_SHOULDER).y as f64).abs()
}

/// Vertical offset between the shoulder midpoint and the hip midpoint,
/// normalized units.
pub fn posture(set: &LandmarkSet) -> f64 {
    let shoulder_mid = (set.get(LEFT_SHOULDER).y as f64 + set.get(RIGHT_SHOULDER).y as f64) / 2.0;
    let hip_mid = (set.get(LEFT_HIP).y as f64 + set.get(RIGHT_HIP).y as f64) / 2.0;
    (shoulder_mid - hip_mid).abs()
}

/// Denormalize both ankles against the current frame's dimensions.
pub fn ankle_pixels(set: &LandmarkSet, width: usize, height: usize) -> AnklePositions {
    let px = |index: usize| {
        let lm = set.get(index);
        (lm.x as f64 * width as f64, lm.y as f64 * height as f64)
    };
    AnklePositions {
        left: px(LEFT_ANKLE),
        right: px(RIGHT_ANKLE),
    }
}

/// Mean Euclidean pixel displacement of the two ankles between
/// consecutive detected frames. Pixel units per frame pair; elapsed
/// time is deliberately not factored in.
fn ankle_displacement(prev: &AnklePositions, current: &AnklePositions) -> f64 {
    let left = distance(prev.left, current.left);
    let right = distance(prev.right, current.right);
    (left + right) / 2.0
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Landmark, NUM_LANDMARKS};
    use assert_approx_eq::assert_approx_eq;

    fn set_with(points: &[(usize, f32, f32)]) -> LandmarkSet {
        let mut landmarks = [Landmark {
            x: 0.5,
            y: 0.5,
            confidence: 1.0,
        }; NUM_LANDMARKS];
        for &(i, x, y) in points {
            landmarks[i].x = x;
            landmarks[i].y = y;
        }
        LandmarkSet::new(landmarks)
    }

    #[test]
    fn level_shoulders_give_zero_balance() {
        let set = set_with(&[(LEFT_SHOULDER, 0.4, 0.3), (RIGHT_SHOULDER, 0.6, 0.3)]);
        assert_eq!(balance(&set), 0.0);
    }

    #[test]
    fn tilted_shoulders_give_vertical_gap() {
        let set = set_with(&[(LEFT_SHOULDER, 0.4, 0.30), (RIGHT_SHOULDER, 0.6, 0.42)]);
        assert_approx_eq!(balance(&set), 0.12, 1e-9);
    }

    #[test]
    fn posture_is_shoulder_to_hip_midpoint_gap() {
        let set = set_with(&[
            (LEFT_SHOULDER, 0.4, 0.30),
            (RIGHT_SHOULDER, 0.6, 0.30),
            (LEFT_HIP, 0.4, 0.55),
            (RIGHT_HIP, 0.6, 0.65),
        ]);
        assert_approx_eq!(posture(&set), 0.30, 1e-9);
    }

    #[test]
    fn ankles_denormalize_against_current_frame() {
        let set = set_with(&[(LEFT_ANKLE, 0.5, 0.5), (RIGHT_ANKLE, 0.25, 0.75)]);
        let px = ankle_pixels(&set, 200, 100);
        assert_eq!(px.left, (100.0, 50.0));
        assert_eq!(px.right, (50.0, 75.0));
    }

    #[test]
    fn first_detection_has_no_footwork_sample() {
        let mut extractor = MetricExtractor::new(false);
        let sample = extractor.process(Some(&set_with(&[])), 100, 100).unwrap();
        assert!(sample.footwork_speed.is_none());
    }

    #[test]
    fn stationary_ankles_give_zero_speed() {
        let mut extractor = MetricExtractor::new(false);
        let set = set_with(&[(LEFT_ANKLE, 0.5, 0.5), (RIGHT_ANKLE, 0.6, 0.5)]);
        extractor.process(Some(&set), 100, 100);
        let sample = extractor.process(Some(&set), 100, 100).unwrap();
        assert_eq!(sample.footwork_speed, Some(0.0));
    }

    #[test]
    fn tenth_of_frame_shift_is_ten_pixels() {
        // leftAnkle (0.5,0.5) -> (0.6,0.5) at 100x100 is a 10px move;
        // the right ankle stays put, so the average is 5.
        let mut extractor = MetricExtractor::new(false);
        let first = set_with(&[(LEFT_ANKLE, 0.5, 0.5), (RIGHT_ANKLE, 0.2, 0.5)]);
        let second = set_with(&[(LEFT_ANKLE, 0.6, 0.5), (RIGHT_ANKLE, 0.2, 0.5)]);
        extractor.process(Some(&first), 100, 100);
        let sample = extractor.process(Some(&second), 100, 100).unwrap();
        assert_approx_eq!(sample.footwork_speed.unwrap(), 5.0, 1e-9);

        let left_only = distance((0.5 * 100.0, 0.5 * 100.0), (0.6 * 100.0, 0.5 * 100.0));
        assert_approx_eq!(left_only, 10.0, 1e-9);
    }

    #[test]
    fn gap_carries_history_through_by_default() {
        let mut extractor = MetricExtractor::new(false);
        let set = set_with(&[(LEFT_ANKLE, 0.5, 0.5), (RIGHT_ANKLE, 0.5, 0.5)]);
        extractor.process(Some(&set), 100, 100);
        assert!(extractor.process(None, 100, 100).is_none());
        // Post-gap detection still differences against the stale position.
        let sample = extractor.process(Some(&set), 100, 100).unwrap();
        assert_eq!(sample.footwork_speed, Some(0.0));
    }

    #[test]
    fn gap_reset_suppresses_post_gap_sample() {
        let mut extractor = MetricExtractor::new(true);
        let set = set_with(&[(LEFT_ANKLE, 0.5, 0.5), (RIGHT_ANKLE, 0.5, 0.5)]);
        extractor.process(Some(&set), 100, 100);
        extractor.process(None, 100, 100);
        let sample = extractor.process(Some(&set), 100, 100).unwrap();
        assert!(sample.footwork_speed.is_none());
    }
}
