use crate::types::Config;
use anyhow::{bail, Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read config {}", path))?;
        let config: Config =
            serde_yaml::from_str(&contents).with_context(|| format!("invalid config {}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.input_width == 0 || self.model.input_height == 0 {
            bail!(
                "model input size must be positive, got {}x{}",
                self.model.input_width,
                self.model.input_height
            );
        }
        if !(0.0..=1.0).contains(&self.detection.min_confidence) {
            bail!(
                "detection.min_confidence must be in [0, 1], got {}",
                self.detection.min_confidence
            );
        }
        if self.preview.queue_capacity == 0 {
            bail!("preview.queue_capacity must be nonzero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("model:\n  path: pose.onnx\n").unwrap();
        assert_eq!(config.model.path, "pose.onnx");
        assert_eq!(config.model.input_width, 256);
        assert_eq!(config.detection.min_confidence, 0.5);
        assert!(!config.detection.reset_history_on_gap);
        assert_eq!(config.preview.queue_capacity, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.model.input_width, config.model.input_width);
        assert_eq!(back.detection.min_confidence, config.detection.min_confidence);
        assert_eq!(back.video.save_annotated, config.video.save_annotated);
    }

    #[test]
    fn bad_confidence_rejected() {
        let mut config = Config::default();
        config.detection.min_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_queue_capacity_rejected() {
        let mut config = Config::default();
        config.preview.queue_capacity = 0;
        assert!(config.validate().is_err());
    }
}
