// src/landmarks.rs
//
// 33-point body model (MediaPipe Pose ordering). The metric pipeline
// only reads shoulders, hips, and ankles, but the full set is kept for
// rendering.

pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;

pub const NUM_LANDMARKS: usize = 33;

/// The landmarks the metric formulas consume. Detection confidence is
/// gated on the mean over these six.
pub const METRIC_LANDMARKS: [usize; 6] = [
    LEFT_SHOULDER,
    RIGHT_SHOULDER,
    LEFT_HIP,
    RIGHT_HIP,
    LEFT_ANKLE,
    RIGHT_ANKLE,
];

/// Skeleton edges for the overlay (pairs of landmark indices).
pub const SKELETON_CONNECTIONS: [(usize, usize); 12] = [
    (LEFT_SHOULDER, RIGHT_SHOULDER),
    (LEFT_SHOULDER, LEFT_ELBOW),
    (LEFT_ELBOW, LEFT_WRIST),
    (RIGHT_SHOULDER, RIGHT_ELBOW),
    (RIGHT_ELBOW, RIGHT_WRIST),
    (LEFT_SHOULDER, LEFT_HIP),
    (RIGHT_SHOULDER, RIGHT_HIP),
    (LEFT_HIP, RIGHT_HIP),
    (LEFT_HIP, LEFT_KNEE),
    (LEFT_KNEE, LEFT_ANKLE),
    (RIGHT_HIP, RIGHT_KNEE),
    (RIGHT_KNEE, RIGHT_ANKLE),
];

/// A single tracked body keypoint, normalized to the frame
/// (x, y in [0, 1] for in-frame points) plus detection confidence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

/// All 33 keypoints for one detected body in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Landmark; NUM_LANDMARKS],
}

impl LandmarkSet {
    pub fn new(points: [Landmark; NUM_LANDMARKS]) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> &Landmark {
        &self.points[index]
    }

    pub fn points(&self) -> &[Landmark; NUM_LANDMARKS] {
        &self.points
    }

    /// Mean confidence over the six landmarks the metrics consume.
    pub fn metric_confidence(&self) -> f32 {
        let sum: f32 = METRIC_LANDMARKS
            .iter()
            .map(|&i| self.points[i].confidence)
            .sum();
        sum / METRIC_LANDMARKS.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_confidence_averages_the_six_metric_points() {
        let mut points = [Landmark::default(); NUM_LANDMARKS];
        for &i in METRIC_LANDMARKS.iter() {
            points[i].confidence = 0.9;
        }
        // Noise elsewhere must not affect the gate.
        points[0].confidence = 0.01;
        let set = LandmarkSet::new(points);
        assert!((set.metric_confidence() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn skeleton_indices_are_in_range() {
        for (a, b) in SKELETON_CONNECTIONS {
            assert!(a < NUM_LANDMARKS);
            assert!(b < NUM_LANDMARKS);
        }
    }
}
