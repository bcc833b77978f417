// src/video_source.rs

use crate::error::VideoError;
use crate::types::Frame;
use anyhow::Result;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Ordered frame supplier. Frames come back strictly in capture order
/// with non-decreasing timestamps; no dropping, no reordering.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError>;

    /// Total frame count when the container knows it; streams may not.
    fn frame_count_hint(&self) -> Option<u64> {
        None
    }
}

#[derive(Debug)]
pub struct VideoFileSource {
    cap: VideoCapture,
    fps: f64,
    total_frames: Option<u64>,
    width: usize,
    height: usize,
    index: u64,
    last_timestamp_ms: i64,
    // Keeps a byte-buffer backing file alive for the life of the source.
    _backing: Option<tempfile::NamedTempFile>,
}

impl VideoFileSource {
    pub fn open(path: &Path) -> Result<Self, VideoError> {
        Self::open_inner(path, None)
    }

    /// Materialize an in-memory video buffer (e.g. an upload) to a
    /// temporary file and open that. The file is removed when the
    /// source drops.
    #[allow(dead_code)]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VideoError> {
        let mut backing = tempfile::NamedTempFile::new().map_err(VideoError::Materialize)?;
        backing.write_all(bytes).map_err(VideoError::Materialize)?;
        backing.flush().map_err(VideoError::Materialize)?;
        let path = backing.path().to_path_buf();
        Self::open_inner(&path, Some(backing))
    }

    fn open_inner(
        path: &Path,
        backing: Option<tempfile::NamedTempFile>,
    ) -> Result<Self, VideoError> {
        info!("Opening video: {}", path.display());

        let open_err = |reason: String| VideoError::Open {
            path: path.display().to_string(),
            reason,
        };

        let path_str = path
            .to_str()
            .ok_or_else(|| open_err("path is not valid UTF-8".to_string()))?;

        let cap = VideoCapture::from_file(path_str, videoio::CAP_ANY)
            .map_err(|e| open_err(e.to_string()))?;

        if !cap.is_opened().map_err(|e| open_err(e.to_string()))? {
            return Err(open_err("backend could not open the file".to_string()));
        }

        let prop =
            |id: i32| VideoCaptureTraitConst::get(&cap, id).map_err(|e| open_err(e.to_string()));

        let fps = prop(videoio::CAP_PROP_FPS)?;
        let raw_count = prop(videoio::CAP_PROP_FRAME_COUNT)?;
        let width = prop(videoio::CAP_PROP_FRAME_WIDTH)? as usize;
        let height = prop(videoio::CAP_PROP_FRAME_HEIGHT)? as usize;

        let total_frames = if raw_count > 0.0 {
            Some(raw_count as u64)
        } else {
            None
        };

        if fps.is_finite() && fps > 0.0 {
            info!(
                "Video properties: {}x{} @ {:.1} FPS, {} frames",
                width,
                height,
                fps,
                total_frames.map_or("?".to_string(), |n| n.to_string())
            );
        } else {
            warn!(
                "Video reports no usable frame rate; timestamps degrade to the frame index"
            );
        }

        Ok(Self {
            cap,
            fps,
            total_frames,
            width,
            height,
            index: 0,
            last_timestamp_ms: -1,
            _backing: backing,
        })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frame_width(&self) -> usize {
        self.width
    }

    pub fn frame_height(&self) -> usize {
        self.height
    }

    /// Timestamp for the frame at `index`, synthesized from the
    /// container fps and clamped strictly above the previous one.
    fn synthesize_timestamp(&self) -> i64 {
        let raw = if self.fps.is_finite() && self.fps > 0.0 {
            (self.index as f64 / self.fps * 1000.0).round() as i64
        } else {
            self.index as i64
        };
        raw.max(self.last_timestamp_ms + 1)
    }
}

impl FrameSource for VideoFileSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError> {
        let mut mat = Mat::default();

        let read = VideoCaptureTrait::read(&mut self.cap, &mut mat).map_err(|e| {
            VideoError::Decode {
                index: self.index,
                source: e,
            }
        })?;
        if !read || mat.empty() {
            return Ok(None);
        }

        let decode_err = |e: opencv::Error| VideoError::Decode {
            index: self.index,
            source: e,
        };

        let mut rgb_mat = Mat::default();
        imgproc::cvt_color(&mat, &mut rgb_mat, imgproc::COLOR_BGR2RGB, 0).map_err(decode_err)?;
        let data = rgb_mat.data_bytes().map_err(decode_err)?.to_vec();

        let timestamp_ms = self.synthesize_timestamp();
        let frame = Frame {
            data,
            width: self.width,
            height: self.height,
            timestamp_ms,
            index: self.index,
        };

        self.last_timestamp_ms = timestamp_ms;
        self.index += 1;

        Ok(Some(frame))
    }

    fn frame_count_hint(&self) -> Option<u64> {
        self.total_frames
    }
}

/// Scan a directory tree for video files the decoding backend is
/// likely to accept.
pub fn find_video_files(input_dir: &str) -> Result<Vec<PathBuf>> {
    let mut videos = Vec::new();

    let video_extensions = ["mp4", "avi", "mov", "mkv", "MP4", "AVI", "MOV", "MKV"];

    for entry in WalkDir::new(input_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if let Some(ext) = path.extension() {
            if video_extensions.contains(&ext.to_str().unwrap_or("")) {
                videos.push(path.to_path_buf());
            }
        }
    }

    videos.sort();
    info!("Found {} video files", videos.len());
    Ok(videos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_open_error() {
        let err = VideoFileSource::open(Path::new("/nonexistent/clip.mp4")).unwrap_err();
        assert!(matches!(err, VideoError::Open { .. }));
    }

    #[test]
    fn garbage_bytes_fail_to_open() {
        let err = VideoFileSource::from_bytes(b"not a video").unwrap_err();
        assert!(matches!(
            err,
            VideoError::Open { .. } | VideoError::Materialize(_)
        ));
    }
}
