use std::path::Path;

use image::imageops::{self, FilterType};
use ndarray::Ix3;

use crate::detection::domain::face_model::{BoxError, FaceModel, RawFaceBox};
use crate::shared::surface::PixelSurface;

use super::execution_provider::build_session;
use super::math::nms;

/// UltraFace RFB-320 input resolution.
const INPUT_WIDTH: u32 = 320;
const INPUT_HEIGHT: u32 = 240;

/// Default confidence threshold for the face class.
pub const DEFAULT_CONFIDENCE: f64 = 0.7;

const NMS_IOU_THRESH: f64 = 0.3;

/// Lightweight UltraFace detector.
///
/// Outputs are `scores` `[1, N, 2]` (background, face) and `boxes`
/// `[1, N, 4]` as corners normalized to the input frame.
pub struct OnnxUltraFaceModel {
    session: ort::session::Session,
    confidence: f64,
}

impl OnnxUltraFaceModel {
    pub fn load(
        model_path: &Path,
        accelerated: bool,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: build_session(model_path, accelerated)?,
            confidence,
        })
    }

    fn infer(&mut self, surface: &PixelSurface) -> Result<Vec<RawFaceBox>, Box<dyn std::error::Error>> {
        let input = ort::value::Tensor::from_array(preprocess(surface)?)?;
        let outputs = self.session.run(ort::inputs![input])?;

        let scores = outputs
            .get("scores")
            .ok_or("UltraFace model has no scores output")?
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix3>()?;
        let boxes = outputs
            .get("boxes")
            .ok_or("UltraFace model has no boxes output")?
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix3>()?;
        if scores.shape()[1] != boxes.shape()[1] || scores.shape()[2] < 2 || boxes.shape()[2] < 4 {
            return Err(format!(
                "Unexpected UltraFace output shapes: scores {:?}, boxes {:?}",
                scores.shape(),
                boxes.shape()
            )
            .into());
        }

        let w = surface.width() as f64;
        let h = surface.height() as f64;
        let mut faces = Vec::new();
        for i in 0..scores.shape()[1] {
            let conf = scores[[0, i, 1]] as f64;
            if conf <= self.confidence {
                continue;
            }
            faces.push(RawFaceBox::from_corners(
                boxes[[0, i, 0]] as f64 * w,
                boxes[[0, i, 1]] as f64 * h,
                boxes[[0, i, 2]] as f64 * w,
                boxes[[0, i, 3]] as f64 * h,
                conf,
            ));
        }

        Ok(nms(faces, NMS_IOU_THRESH))
    }
}

impl FaceModel for OnnxUltraFaceModel {
    fn estimate_faces(&mut self, surface: &PixelSurface) -> Result<Vec<RawFaceBox>, BoxError> {
        self.infer(surface).map_err(|e| e.to_string().into())
    }
}

/// Stretch to the model input and normalize to `(v - 127) / 128`, NCHW.
fn preprocess(surface: &PixelSurface) -> Result<ndarray::Array4<f32>, Box<dyn std::error::Error>> {
    let image = surface
        .to_rgba_image()
        .ok_or("surface dimensions do not match its pixel buffer")?;
    let resized = imageops::resize(&image, INPUT_WIDTH, INPUT_HEIGHT, FilterType::Triangle);

    let mut tensor =
        ndarray::Array4::<f32>::zeros((1, 3, INPUT_HEIGHT as usize, INPUT_WIDTH as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 - 127.0) / 128.0;
        }
    }
    Ok(tensor)
}
