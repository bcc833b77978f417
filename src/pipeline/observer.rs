// src/pipeline/observer.rs
//
// Presentation-independent progress seam. The driver calls the
// observer after every frame; the binary hangs a progress bar off it,
// tests hang counters.

/// What happened on one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameProgress {
    pub frame_index: u64,
    pub timestamp_ms: i64,
    pub detected: bool,
    pub footwork_sampled: bool,
    pub total_frames: Option<u64>,
}

pub trait PipelineObserver {
    fn on_frame(&mut self, progress: &FrameProgress);
}
