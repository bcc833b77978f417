// src/pipeline/mod.rs

pub mod cancel;
pub mod driver;
pub mod observer;
pub mod preview;

pub use cancel::CancelToken;
pub use driver::{PipelineDriver, RunSummary};
pub use observer::{FrameProgress, PipelineObserver};
pub use preview::{PreviewQueue, PreviewSink};
