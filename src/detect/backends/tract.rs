#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::labels::{is_coco_label, label_for};
use crate::detect::nms::non_max_suppression;
use crate::detect::result::Detection;
use crate::frame::Frame;
use crate::geometry::Rect;

/// Tract-based backend for YOLOv8 ONNX exports.
///
/// Expects a single `[1, 3, S, S]` f32 input and a `[1, 4 + classes, anchors]` output
/// (`cx, cy, w, h` followed by per-class scores). Frames are stretched to the model input
/// and boxes are scaled back to frame pixels.
pub struct TractBackend {
    model: TypedRunnableModel<TypedModel>,
    input_size: u32,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        if input_size == 0 {
            return Err(anyhow!("model input size must be > 0"));
        }
        let size = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
        })
    }

    /// Override the default confidence and IoU thresholds.
    pub fn with_thresholds(mut self, confidence: f32, iou: f32) -> Self {
        self.confidence_threshold = confidence;
        self.iou_threshold = iou;
        self
    }

    fn build_input(&self, frame: &Frame) -> Tensor {
        let size = self.input_size;
        let resized = imageops::resize(frame.image(), size, size, FilterType::Triangle);
        let side = size as usize;
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
            resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
        });
        input.into_tensor()
    }

    fn decode(&self, outputs: TVec<TValue>, frame: &Frame) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .context("model output must be rank 3 [1, 4 + classes, anchors]")?;
        decode_predictions(
            view,
            (frame.width(), frame.height()),
            self.input_size,
            self.confidence_threshold,
            self.iou_threshold,
        )
    }
}

/// Turn a `[1, 4 + classes, anchors]` prediction tensor into frame-space detections.
fn decode_predictions(
    view: tract_ndarray::ArrayView3<'_, f32>,
    (frame_width, frame_height): (u32, u32),
    input_size: u32,
    confidence_threshold: f32,
    iou_threshold: f32,
) -> Result<Vec<Detection>> {
    let (_, rows, anchors) = view.dim();
    if rows <= 4 {
        return Err(anyhow!("model output has no class rows (shape {:?})", view.dim()));
    }
    let classes = rows - 4;
    let sx = frame_width as f32 / input_size as f32;
    let sy = frame_height as f32 / input_size as f32;

    let mut candidates = Vec::new();
    for i in 0..anchors {
        let (class_id, score) = (0..classes)
            .map(|c| (c, view[[0, 4 + c, i]]))
            .fold((0usize, f32::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            });
        if !score.is_finite() || score < confidence_threshold {
            continue;
        }
        let cx = view[[0, 0, i]];
        let cy = view[[0, 1, i]];
        let w = view[[0, 2, i]];
        let h = view[[0, 3, i]];
        // Raw model coordinates are unbounded; keep only the part inside the frame.
        let Some(bbox) = Rect::new(
            ((cx - w / 2.0) * sx).round() as i32,
            ((cy - h / 2.0) * sy).round() as i32,
            ((cx + w / 2.0) * sx).round() as i32,
            ((cy + h / 2.0) * sy).round() as i32,
        )
        .clamp_to(frame_width, frame_height) else {
            continue;
        };
        candidates.push(Detection::new(label_for(class_id), score, bbox));
    }

    Ok(non_max_suppression(candidates, iou_threshold))
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "yolov8"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let input = self.build_input(frame);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs, frame)
    }

    fn knows_label(&self, label: &str) -> bool {
        is_coco_label(label)
    }

    fn warm_up(&mut self) -> Result<()> {
        let size = self.input_size;
        let blank = Frame::new(0, image::RgbImage::new(size, size));
        self.detect(&blank).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a `[1, 4 + classes, anchors]` tensor from per-anchor rows.
    fn predictions(anchors: &[[f32; 6]]) -> tract_ndarray::Array3<f32> {
        let n = anchors.len();
        tract_ndarray::Array3::from_shape_fn((1, 6, n), |(_, row, i)| anchors[i][row])
    }

    #[test]
    fn boxes_are_scaled_and_labelled() -> Result<()> {
        // cx, cy, w, h, person score, bicycle score
        let preds = predictions(&[[320.0, 320.0, 64.0, 64.0, 0.9, 0.1]]);
        let detections = decode_predictions(preds.view(), (1280, 640), 640, 0.25, 0.45)?;
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, "person");
        assert_eq!(detections[0].bbox, Rect::new(576, 288, 704, 352));
        Ok(())
    }

    #[test]
    fn out_of_range_boxes_are_clamped_or_dropped() -> Result<()> {
        let preds = predictions(&[
            [320.0, 10.0, 1.0e12, 20.0, 0.0, 0.8],
            [-1.0e9, -1.0e9, 10.0, 10.0, 0.9, 0.0],
            [320.0, 320.0, 10.0, 10.0, 0.1, 0.1],
        ]);
        let detections = decode_predictions(preds.view(), (64, 48), 640, 0.25, 0.45)?;
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, "bicycle");
        assert_eq!(detections[0].bbox.x1, 0);
        assert_eq!(detections[0].bbox.x2, 63);
        Ok(())
    }
}
