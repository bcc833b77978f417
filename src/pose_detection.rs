// src/pose_detection.rs

use crate::landmarks::{Landmark, LandmarkSet, NUM_LANDMARKS};
use crate::preprocessing;
use crate::types::{Config, Frame};
use anyhow::{Context, Result};
use ort::{
    execution_providers::CUDAExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
};
use tracing::{debug, info};

/// Values per landmark record in the model output:
/// x, y (input-pixel units), z, visibility logit, presence logit.
const LANDMARK_STRIDE: usize = 5;

/// The external collaborator seam. Callers must invoke `detect` with
/// strictly increasing timestamps for one logical video; the pipeline
/// driver guarantees that ordering.
pub trait LandmarkProvider {
    fn detect(&mut self, frame: &Frame, timestamp_ms: i64) -> Result<Option<LandmarkSet>>;
}

/// BlazePose-style 33-point landmark model behind an ONNX Runtime
/// session. Owned by the caller and passed `&mut` into each run.
pub struct OnnxPoseDetector {
    session: Session,
    input_width: usize,
    input_height: usize,
    min_confidence: f32,
}

impl OnnxPoseDetector {
    pub fn new(config: &Config) -> Result<Self> {
        info!("Loading pose landmark model: {}", config.model.path);

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.inference.num_threads)?;

        if config.inference.use_cuda {
            builder = builder
                .with_execution_providers([CUDAExecutionProvider::default().build()])?;
            info!("CUDA execution provider requested");
        }

        let session = builder
            .commit_from_file(&config.model.path)
            .with_context(|| format!("failed to load pose model {}", config.model.path))?;

        info!("✓ Pose detector initialized");

        Ok(Self {
            session,
            input_width: config.model.input_width,
            input_height: config.model.input_height,
            min_confidence: config.detection.min_confidence,
        })
    }

    fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let shape = [1usize, 3, self.input_height, self.input_width];
        let input_value =
            ort::value::Value::from_array((shape.as_slice(), input.to_vec().into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs!["input" => input_value])?;
        let output = &outputs[0];
        let (_, data) = output.try_extract_tensor::<f32>()?;

        Ok(data.to_vec())
    }
}

impl LandmarkProvider for OnnxPoseDetector {
    fn detect(&mut self, frame: &Frame, timestamp_ms: i64) -> Result<Option<LandmarkSet>> {
        let input = preprocessing::preprocess(
            &frame.data,
            frame.width,
            frame.height,
            self.input_width,
            self.input_height,
        )?;

        let output = self.infer(&input)?;

        let Some(set) = decode_landmarks(&output, self.input_width, self.input_height) else {
            debug!("frame {}: landmark head too short, treating as gap", frame.index);
            return Ok(None);
        };

        let confidence = set.metric_confidence();
        if confidence < self.min_confidence {
            debug!(
                "frame {} @ {}ms: detection below threshold ({:.3} < {:.3})",
                frame.index, timestamp_ms, confidence, self.min_confidence
            );
            return Ok(None);
        }

        Ok(Some(set))
    }
}

/// Decode the first 33 stride-5 records of the landmark head into
/// normalized coordinates. Visibility logits pass through a sigmoid to
/// become the per-landmark confidence.
fn decode_landmarks(raw: &[f32], input_w: usize, input_h: usize) -> Option<LandmarkSet> {
    if raw.len() < NUM_LANDMARKS * LANDMARK_STRIDE {
        return None;
    }

    let mut points = [Landmark::default(); NUM_LANDMARKS];
    for (i, point) in points.iter_mut().enumerate() {
        let base = i * LANDMARK_STRIDE;
        *point = Landmark {
            x: raw[base] / input_w as f32,
            y: raw[base + 1] / input_h as f32,
            confidence: sigmoid(raw[base + 3]),
        };
    }

    Some(LandmarkSet::new(points))
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{LEFT_SHOULDER, RIGHT_ANKLE};

    fn synthetic_head() -> Vec<f32> {
        // Landmark i sits at (i*4, i*2) input pixels with visibility
        // logit 2.0 (sigmoid ≈ 0.88).
        let mut raw = Vec::with_capacity(NUM_LANDMARKS * LANDMARK_STRIDE);
        for i in 0..NUM_LANDMARKS {
            raw.extend_from_slice(&[(i * 4) as f32, (i * 2) as f32, 0.0, 2.0, 2.0]);
        }
        raw
    }

    #[test]
    fn decode_normalizes_by_input_size() {
        let set = decode_landmarks(&synthetic_head(), 256, 128).unwrap();
        let lm = set.get(LEFT_SHOULDER);
        assert!((lm.x - (11.0 * 4.0) / 256.0).abs() < 1e-6);
        assert!((lm.y - (11.0 * 2.0) / 128.0).abs() < 1e-6);

        let lm = set.get(RIGHT_ANKLE);
        assert!((lm.x - (28.0 * 4.0) / 256.0).abs() < 1e-6);
    }

    #[test]
    fn decode_sigmoids_visibility() {
        let set = decode_landmarks(&synthetic_head(), 256, 256).unwrap();
        let expected = 1.0 / (1.0 + (-2.0f32).exp());
        assert!((set.get(0).confidence - expected).abs() < 1e-6);
    }

    #[test]
    fn short_head_is_a_gap() {
        assert!(decode_landmarks(&[0.0; 10], 256, 256).is_none());
    }
}
