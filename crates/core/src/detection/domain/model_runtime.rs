use std::fmt;

use super::face_model::{BoxError, FaceModel};

/// Inference backend, in the order they are tried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Platform hardware acceleration (GPU / neural engine).
    Accelerated,
    Cpu,
}

impl Backend {
    pub const PRIORITY: [Backend; 2] = [Backend::Accelerated, Backend::Cpu];
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Accelerated => f.write_str("accelerated"),
            Backend::Cpu => f.write_str("cpu"),
        }
    }
}

/// Output decoding a model file expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelArchitecture {
    Yolo,
    UltraFace,
}

/// One rung of the model fallback chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelTier {
    pub name: &'static str,
    pub file_name: &'static str,
    pub url: &'static str,
    pub architecture: ModelArchitecture,
}

/// Host side of face detection: backend selection and model loading.
///
/// Implementations are moved onto a worker thread during initialization.
pub trait ModelRuntime: Send {
    /// Fails when the host cannot run inference at all.
    fn probe_environment(&self) -> Result<(), String>;

    fn acquire_backend(&mut self, backend: Backend) -> Result<(), BoxError>;

    fn load_model(&mut self, tier: &ModelTier) -> Result<Box<dyn FaceModel>, BoxError>;
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.file_name)
    }
}
