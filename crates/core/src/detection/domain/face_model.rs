use crate::shared::surface::PixelSurface;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A face box straight out of model inference, in source-image pixels.
///
/// Coordinates may be negative or overhang the image; filtering happens
/// in the detector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawFaceBox {
    pub x_min: f64,
    pub y_min: f64,
    pub width: f64,
    pub height: f64,
    pub score: f64,
}

impl RawFaceBox {
    /// Build from corner coordinates `(x1, y1, x2, y2)`.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64, score: f64) -> Self {
        Self {
            x_min: x1,
            y_min: y1,
            width: x2 - x1,
            height: y2 - y1,
            score,
        }
    }

    pub fn corners(&self) -> [f64; 4] {
        [
            self.x_min,
            self.y_min,
            self.x_min + self.width,
            self.y_min + self.height,
        ]
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// A loaded face-detection model ready for inference.
///
/// Dropping the model releases its runtime resources.
pub trait FaceModel: Send {
    fn estimate_faces(&mut self, surface: &PixelSurface) -> Result<Vec<RawFaceBox>, BoxError>;
}
