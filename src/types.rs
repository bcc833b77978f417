use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub inference: InferenceConfig,
    pub detection: DetectionConfig,
    pub video: VideoConfig,
    pub preview: PreviewConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            inference: InferenceConfig::default(),
            detection: DetectionConfig::default(),
            video: VideoConfig::default(),
            preview: PreviewConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
    pub input_width: usize,
    pub input_height: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/pose_landmark.onnx".to_string(),
            input_width: 256,
            input_height: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub num_threads: usize,
    pub use_cuda: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            num_threads: 4,
            use_cuda: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub min_confidence: f32,
    pub reset_history_on_gap: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            reset_history_on_gap: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub input_dir: String,
    pub output_dir: String,
    pub save_annotated: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            input_dir: "videos/".to_string(),
            output_dir: "output/".to_string(),
            save_annotated: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub enabled: bool,
    pub queue_capacity: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            queue_capacity: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// One decoded video frame: RGB24, row-major, owned by the pipeline
/// for exactly one loop iteration.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub timestamp_ms: i64,
    pub index: u64,
}

/// One frame's instantaneous metrics. Footwork speed is absent on the
/// first detected frame of a run (no previous ankle position exists).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSample {
    pub balance: f64,
    pub posture: f64,
    pub footwork_speed: Option<f64>,
}

/// Per-clip means, the authoritative pipeline output. A metric with no
/// samples reports 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub mean_balance: f64,
    pub mean_posture: f64,
    pub mean_footwork_speed: f64,
}
