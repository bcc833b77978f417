// src/annotate.rs
//
// Landmark overlay for the preview side channel: skeleton lines,
// confidence-gated keypoint dots, and a one-line metric readout.

use crate::landmarks::{LandmarkSet, SKELETON_CONNECTIONS};
use crate::types::{Frame, MetricSample};
use anyhow::Result;
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};

const DOT_RADIUS: i32 = 4;

pub fn draw_landmarks(
    frame: &Frame,
    landmarks: &LandmarkSet,
    sample: Option<&MetricSample>,
    min_confidence: f32,
) -> Result<Frame> {
    let mat = Mat::from_slice(&frame.data)?;
    let mat = mat.reshape(3, frame.height as i32)?;
    let mut output = mat.try_clone()?;

    let width = frame.width as f32;
    let height = frame.height as f32;

    // Frame data is RGB; scalars below are RGB too.
    let dot_color = core::Scalar::new(0.0, 255.0, 0.0, 0.0);
    let bone_color = core::Scalar::new(255.0, 255.0, 0.0, 0.0);
    let text_color = core::Scalar::new(255.0, 255.0, 255.0, 0.0);

    for (a, b) in SKELETON_CONNECTIONS {
        let from = landmarks.get(a);
        let to = landmarks.get(b);
        if from.confidence < min_confidence || to.confidence < min_confidence {
            continue;
        }
        let pt1 = core::Point::new((from.x * width) as i32, (from.y * height) as i32);
        let pt2 = core::Point::new((to.x * width) as i32, (to.y * height) as i32);
        imgproc::line(&mut output, pt1, pt2, bone_color, 2, imgproc::LINE_AA, 0)?;
    }

    for lm in landmarks.points() {
        if lm.confidence < min_confidence {
            continue;
        }
        let pt = core::Point::new((lm.x * width) as i32, (lm.y * height) as i32);
        imgproc::circle(&mut output, pt, DOT_RADIUS, dot_color, -1, imgproc::LINE_8, 0)?;
    }

    if let Some(sample) = sample {
        imgproc::rectangle(
            &mut output,
            core::Rect::new(5, 5, 460, 35),
            core::Scalar::new(40.0, 40.0, 40.0, 0.0),
            -1,
            imgproc::LINE_8,
            0,
        )?;

        let readout = match sample.footwork_speed {
            Some(speed) => format!(
                "Balance: {:.3} | Posture: {:.3} | Speed: {:.1}px",
                sample.balance, sample.posture, speed
            ),
            None => format!(
                "Balance: {:.3} | Posture: {:.3} | Speed: --",
                sample.balance, sample.posture
            ),
        };
        imgproc::put_text(
            &mut output,
            &readout,
            core::Point::new(15, 28),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.5,
            text_color,
            1,
            imgproc::LINE_8,
            false,
        )?;
    }

    let data = output.data_bytes()?.to_vec();
    Ok(Frame {
        data,
        width: frame.width,
        height: frame.height,
        timestamp_ms: frame.timestamp_ms,
        index: frame.index,
    })
}
