// src/main.rs

mod annotate;
mod config;
mod error;
mod landmarks;
mod metrics;
mod pipeline;
mod pose_detection;
mod preprocessing;
mod types;
mod video_source;

use anyhow::{Context, Result};
use error::{PipelineError, SinkError};
use indicatif::{ProgressBar, ProgressStyle};
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
    videoio::{VideoWriter, VideoWriterTrait},
};
use pipeline::{CancelToken, FrameProgress, PipelineDriver, PipelineObserver, PreviewQueue, PreviewSink};
use pose_detection::OnnxPoseDetector;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use types::{Config, Frame};
use video_source::{FrameSource, VideoFileSource};

fn main() -> Result<()> {
    let config = Config::load("config.yaml")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "court_motion={},ort=warn",
            config.logging.level
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🏸 Court Motion Analysis Starting");
    info!("✓ Configuration loaded");
    info!(
        "Detection: min_confidence={:.2}, reset_history_on_gap={}",
        config.detection.min_confidence, config.detection.reset_history_on_gap
    );

    let mut detector = OnnxPoseDetector::new(&config)?;

    let video_files = video_source::find_video_files(&config.video.input_dir)?;
    if video_files.is_empty() {
        error!("No video files found in {}", config.video.input_dir);
        return Ok(());
    }
    info!("Found {} video file(s) to process", video_files.len());

    let cancel = CancelToken::new();
    let cancel_ctrl_c = cancel.clone();
    ctrlc::set_handler(move || {
        cancel_ctrl_c.cancel();
    })
    .context("failed setting Ctrl-C handler")?;

    std::fs::create_dir_all(&config.video.output_dir)?;
    let results_path = Path::new(&config.video.output_dir).join("analysis_results.jsonl");
    let mut results_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&results_path)?;
    info!("💾 Results will be appended to: {}", results_path.display());

    for (idx, video_path) in video_files.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!("Cancelled before video {}", video_path.display());
            break;
        }

        info!("\n========================================");
        info!(
            "Processing video {}/{}: {}",
            idx + 1,
            video_files.len(),
            video_path.display()
        );
        info!("========================================\n");

        match analyze_video(video_path, &mut detector, &config, &cancel) {
            Ok(summary) => {
                let result = summary.result;
                info!("\n📊 Final Report:");
                info!("  Total frames: {}", summary.total_frames);
                info!(
                    "  Detected frames: {} ({:.1}%)",
                    summary.detected_frames,
                    100.0 * summary.detected_frames as f64 / summary.total_frames.max(1) as f64
                );
                info!("  Footwork samples: {}", summary.footwork_samples);
                info!("  ⚖️  Mean balance: {:.4}", result.mean_balance);
                info!("  🧍 Mean posture: {:.4}", result.mean_posture);
                info!(
                    "  🏃 Mean footwork speed: {:.2} px/frame-pair",
                    result.mean_footwork_speed
                );

                save_result(video_path, &summary, &mut results_file)?;
            }
            Err(e) if matches!(
                e.downcast_ref::<PipelineError>(),
                Some(PipelineError::Cancelled)
            ) =>
            {
                warn!("⏹ Run cancelled, stopping batch");
                break;
            }
            Err(e) => {
                error!("Failed to process video: {:#}", e);
            }
        }
    }

    Ok(())
}

fn analyze_video(
    video_path: &Path,
    detector: &mut OnnxPoseDetector,
    config: &Config,
    cancel: &CancelToken,
) -> Result<pipeline::RunSummary> {
    let start_time = Instant::now();

    let mut source = VideoFileSource::open(video_path)?;

    let mut writer_sink = if config.video.save_annotated {
        match AnnotatedVideoSink::create(
            video_path,
            &config.video.output_dir,
            source.frame_width(),
            source.frame_height(),
            source.fps(),
        ) {
            Ok(sink) => Some(sink),
            Err(e) => {
                warn!("⚠️  Annotated writer unavailable: {:#}. Continuing without it.", e);
                None
            }
        }
    } else {
        None
    };

    let mut queue_sink = if writer_sink.is_none() && config.preview.enabled {
        Some(PreviewQueue::new(config.preview.queue_capacity))
    } else {
        None
    };

    let mut observer = ProgressObserver::new(source.frame_count_hint());

    let sink: Option<&mut dyn PreviewSink> = match (writer_sink.as_mut(), queue_sink.as_mut()) {
        (Some(writer), _) => Some(writer),
        (None, Some(queue)) => Some(queue),
        (None, None) => None,
    };
    let annotate = sink.is_some();

    let mut driver = PipelineDriver::new(&config.detection, annotate);
    let outcome = driver.run(&mut source, detector, sink, Some(&mut observer), cancel);
    observer.finish();

    if let Some(queue) = queue_sink.as_ref() {
        debug!("{} preview frame(s) pending at end of run", queue.pending_count());
    }

    let summary = outcome?;

    let duration = start_time.elapsed();
    info!(
        "  Processing speed: {:.1} FPS",
        summary.total_frames as f64 / duration.as_secs_f64().max(1e-9)
    );

    Ok(summary)
}

fn save_result(
    video_path: &Path,
    summary: &pipeline::RunSummary,
    file: &mut std::fs::File,
) -> Result<()> {
    let record = serde_json::json!({
        "video": video_path.display().to_string(),
        "total_frames": summary.total_frames,
        "detected_frames": summary.detected_frames,
        "footwork_samples": summary.footwork_samples,
        "mean_balance": summary.result.mean_balance,
        "mean_posture": summary.result.mean_posture,
        "mean_footwork_speed": summary.result.mean_footwork_speed,
    });

    let json_line = serde_json::to_string(&record)?;
    writeln!(file, "{}", json_line)?;
    file.flush()?;
    info!("💾 Result saved to JSONL");
    Ok(())
}

/// Preview sink that persists the annotated stream next to the input,
/// mp4v fourcc at the source frame rate.
struct AnnotatedVideoSink {
    writer: VideoWriter,
}

impl AnnotatedVideoSink {
    fn create(
        input_path: &Path,
        output_dir: &str,
        width: usize,
        height: usize,
        fps: f64,
    ) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;

        let input_name = input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("video");
        let output_path =
            PathBuf::from(output_dir).join(format!("{}_annotated.mp4", input_name));
        info!("Output video: {}", output_path.display());

        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 30.0 };
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = VideoWriter::new(
            output_path
                .to_str()
                .context("output path is not valid UTF-8")?,
            fourcc,
            fps,
            core::Size::new(width as i32, height as i32),
            true,
        )?;

        Ok(Self { writer })
    }

    fn write_frame(&mut self, frame: &Frame) -> opencv::Result<()> {
        let mat = Mat::from_slice(&frame.data)?;
        let mat = mat.reshape(3, frame.height as i32)?;
        let mut bgr_mat = Mat::default();
        imgproc::cvt_color(&mat, &mut bgr_mat, imgproc::COLOR_RGB2BGR, 0)?;
        self.writer.write(&bgr_mat)
    }
}

impl PreviewSink for AnnotatedVideoSink {
    fn push(&mut self, frame: &Frame, _annotated: bool) -> Result<(), SinkError> {
        self.write_frame(frame)
            .map_err(|e| SinkError::Push(e.to_string()))
    }
}

/// Progress bar observer for the per-frame seam.
struct ProgressObserver {
    bar: ProgressBar,
    detected: u64,
}

impl ProgressObserver {
    fn new(total_frames: Option<u64>) -> Self {
        let bar = match total_frames {
            Some(total) => ProgressBar::new(total).with_style(
                ProgressStyle::with_template("{prefix} [{bar:40}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            ),
            None => ProgressBar::new_spinner(),
        };
        Self { bar, detected: 0 }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineObserver for ProgressObserver {
    fn on_frame(&mut self, progress: &FrameProgress) {
        if progress.detected {
            self.detected += 1;
        }
        self.bar.set_position(progress.frame_index + 1);
        if progress.frame_index % 50 == 0 {
            self.bar.set_message(format!(
                "detected {}/{}",
                self.detected,
                progress.frame_index + 1
            ));
        }
    }
}
