use serde::{Deserialize, Serialize};

use crate::shared::region::FaceRegion;

/// Faces found in one image, in detector output order.
///
/// `count` always equals the number of regions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Faces")]
pub struct DetectionResult {
    faces: Vec<FaceRegion>,
    count: usize,
}

// Deserialization recomputes `count` from the faces themselves.
#[derive(Deserialize)]
struct Faces {
    faces: Vec<FaceRegion>,
}

impl From<Faces> for DetectionResult {
    fn from(raw: Faces) -> Self {
        Self::new(raw.faces)
    }
}

impl DetectionResult {
    pub fn new(faces: Vec<FaceRegion>) -> Self {
        let count = faces.len();
        Self { faces, count }
    }

    pub fn regions(&self) -> &[FaceRegion] {
        &self.faces
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}
