// src/pipeline/preview.rs
//
// Live-preview side channel. Push-only and best-effort: the driver
// never blocks on a sink and never aborts over one.

use crate::error::SinkError;
use crate::types::Frame;
use std::collections::VecDeque;
use tracing::warn;

pub trait PreviewSink {
    fn push(&mut self, frame: &Frame, annotated: bool) -> Result<(), SinkError>;
}

/// Bounded queue sink. When full it drops the oldest frame instead of
/// blocking the extraction loop; a consumer drains at its own pace.
pub struct PreviewQueue {
    frames: VecDeque<Frame>,
    capacity: usize,
}

impl PreviewQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    #[allow(dead_code)]
    pub fn drain(&mut self) -> Vec<Frame> {
        self.frames.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.frames.len()
    }
}

impl PreviewSink for PreviewQueue {
    fn push(&mut self, frame: &Frame, _annotated: bool) -> Result<(), SinkError> {
        if self.frames.len() >= self.capacity {
            warn!(
                "Preview queue full ({} frames), dropping oldest",
                self.capacity
            );
            self.frames.pop_front();
        }
        self.frames.push_back(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: u64) -> Frame {
        Frame {
            data: vec![0; 12],
            width: 2,
            height: 2,
            timestamp_ms: index as i64,
            index,
        }
    }

    #[test]
    fn full_queue_drops_oldest_without_blocking() {
        let mut queue = PreviewQueue::new(2);
        for i in 0..5 {
            queue.push(&frame(i), false).unwrap();
        }
        assert_eq!(queue.pending_count(), 2);
        let kept: Vec<u64> = queue.drain().iter().map(|f| f.index).collect();
        assert_eq!(kept, vec![3, 4]);
        assert_eq!(queue.pending_count(), 0);
    }
}
