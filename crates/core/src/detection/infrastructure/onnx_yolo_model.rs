/// YOLO face model using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference, and NMS post-processing.
/// Boxes come back in source-image pixels, unfiltered by size.
use std::path::Path;

use crate::detection::domain::face_model::{BoxError, FaceModel, RawFaceBox};
use crate::shared::surface::PixelSurface;

use super::execution_provider::build_session;
use super::math::nms;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// YOLO face model backed by an ONNX Runtime session.
pub struct OnnxYoloModel {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloModel {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn load(
        model_path: &Path,
        accelerated: bool,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path, accelerated)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }

    fn infer(&mut self, surface: &PixelSurface) -> Result<Vec<RawFaceBox>, Box<dyn std::error::Error>> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(surface, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape();

        // YOLO output shape is [1, num_features, num_detections] (transposed)
        // or [1, num_detections, num_features]. Handle both.
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if num_feats < 5 {
            return Err(format!("YOLO output has {num_feats} features per row, need 5").into());
        }
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
        let feature = |det: usize, f: usize| {
            if transposed {
                data[f * num_dets + det]
            } else {
                data[det * num_feats + f]
            }
        };

        // Row format: [cx, cy, w, h, conf, ...landmarks]
        let pad_x = pad_x as f64;
        let pad_y = pad_y as f64;
        let mut boxes = Vec::new();
        for i in 0..num_dets {
            let conf = feature(i, 4) as f64;
            if conf < self.confidence {
                continue;
            }
            let cx = feature(i, 0) as f64;
            let cy = feature(i, 1) as f64;
            let w = feature(i, 2) as f64;
            let h = feature(i, 3) as f64;

            boxes.push(RawFaceBox::from_corners(
                ((cx - w / 2.0) - pad_x) / scale,
                ((cy - h / 2.0) - pad_y) / scale,
                ((cx + w / 2.0) - pad_x) / scale,
                ((cy + h / 2.0) - pad_y) / scale,
                conf,
            ));
        }

        Ok(nms(boxes, NMS_IOU_THRESH))
    }
}

impl FaceModel for OnnxYoloModel {
    fn estimate_faces(&mut self, surface: &PixelSurface) -> Result<Vec<RawFaceBox>, BoxError> {
        self.infer(surface).map_err(|e| e.to_string().into())
    }
}

/// Letterbox-resize a surface to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`. Alpha is ignored.
fn letterbox(surface: &PixelSurface, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = surface.width() as f64;
    let fh = surface.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is 114/255 gray, YOLO convention.
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = surface.as_ndarray();
    let src_h = surface.height() as usize;
    let src_w = surface.width() as usize;

    // Nearest-neighbor resize into the padded region.
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}
