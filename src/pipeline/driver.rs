// src/pipeline/driver.rs
//
// Single pass over one video: pull frame, detect, extract, aggregate,
// optionally render to the preview sink, notify the observer. One
// frame finishes completely before the next is pulled.

use crate::annotate;
use crate::error::PipelineError;
use crate::metrics::{MetricAggregator, MetricExtractor};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::observer::{FrameProgress, PipelineObserver};
use crate::pipeline::preview::PreviewSink;
use crate::pose_detection::LandmarkProvider;
use crate::types::{AggregateResult, DetectionConfig};
use crate::video_source::FrameSource;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Streaming,
    Done,
    Failed,
}

/// Final output of one run. `result` is the authoritative part; the
/// counts are diagnostics for reports and persistence.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub result: AggregateResult,
    pub total_frames: u64,
    pub detected_frames: u64,
    pub footwork_samples: u64,
}

pub struct PipelineDriver {
    extractor: MetricExtractor,
    aggregator: MetricAggregator,
    state: PipelineState,
    annotate: bool,
    draw_min_confidence: f32,
}

impl PipelineDriver {
    pub fn new(detection: &DetectionConfig, annotate: bool) -> Self {
        Self {
            extractor: MetricExtractor::new(detection.reset_history_on_gap),
            aggregator: MetricAggregator::new(),
            state: PipelineState::Init,
            annotate,
            draw_min_confidence: detection.min_confidence,
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Consume the source to end of stream. Fatal outcomes (source
    /// failure, cancellation) produce no partial result; sink and
    /// per-frame detection failures degrade and the run continues.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        provider: &mut dyn LandmarkProvider,
        sink: Option<&mut dyn PreviewSink>,
        observer: Option<&mut dyn PipelineObserver>,
        cancel: &CancelToken,
    ) -> Result<RunSummary, PipelineError> {
        self.state = PipelineState::Streaming;
        match self.stream(source, provider, sink, observer, cancel) {
            Ok(summary) => {
                self.state = PipelineState::Done;
                Ok(summary)
            }
            Err(e) => {
                self.state = PipelineState::Failed;
                Err(e)
            }
        }
    }

    fn stream(
        &mut self,
        source: &mut dyn FrameSource,
        provider: &mut dyn LandmarkProvider,
        mut sink: Option<&mut dyn PreviewSink>,
        mut observer: Option<&mut dyn PipelineObserver>,
        cancel: &CancelToken,
    ) -> Result<RunSummary, PipelineError> {
        let total_hint = source.frame_count_hint();
        let mut total_frames: u64 = 0;
        let mut detected_frames: u64 = 0;
        let mut last_timestamp_ms = i64::MIN;

        while let Some(frame) = source.next_frame()? {
            if cancel.is_cancelled() {
                debug!("cancellation requested at frame {}", frame.index);
                return Err(PipelineError::Cancelled);
            }

            total_frames += 1;

            // Stateful trackers rely on strictly increasing timestamps;
            // enforce the ordering here rather than trusting the source.
            let timestamp_ms = if last_timestamp_ms == i64::MIN {
                frame.timestamp_ms
            } else {
                frame.timestamp_ms.max(last_timestamp_ms + 1)
            };
            last_timestamp_ms = timestamp_ms;

            // Provider failures on a single frame are gaps, not errors.
            let detection = match provider.detect(&frame, timestamp_ms) {
                Ok(result) => result,
                Err(e) => {
                    debug!("detection failed on frame {}: {}", frame.index, e);
                    None
                }
            };
            if detection.is_some() {
                detected_frames += 1;
            }

            let footwork_before = self.aggregator.footwork_count();
            let sample = self
                .extractor
                .process(detection.as_ref(), frame.width, frame.height);
            if let Some(ref sample) = sample {
                self.aggregator.accept(sample);
            }
            let footwork_sampled = self.aggregator.footwork_count() > footwork_before;

            if let Some(sink) = sink.as_deref_mut() {
                let mut pushed = false;
                if self.annotate {
                    if let Some(ref set) = detection {
                        match annotate::draw_landmarks(
                            &frame,
                            set,
                            sample.as_ref(),
                            self.draw_min_confidence,
                        ) {
                            Ok(annotated) => {
                                if let Err(e) = sink.push(&annotated, true) {
                                    warn!("preview sink failed on frame {}: {}", frame.index, e);
                                }
                                pushed = true;
                            }
                            // Render failure degrades to the raw frame.
                            Err(e) => {
                                debug!("annotation failed on frame {}: {}", frame.index, e)
                            }
                        }
                    }
                }
                if !pushed {
                    if let Err(e) = sink.push(&frame, false) {
                        warn!("preview sink failed on frame {}: {}", frame.index, e);
                    }
                }
            }

            if let Some(observer) = observer.as_deref_mut() {
                observer.on_frame(&FrameProgress {
                    frame_index: frame.index,
                    timestamp_ms,
                    detected: detection.is_some(),
                    footwork_sampled,
                    total_frames: total_hint,
                });
            }
        }

        Ok(RunSummary {
            result: self.aggregator.finalize(),
            total_frames,
            detected_frames,
            footwork_samples: self.aggregator.footwork_count(),
        })
    }
}
