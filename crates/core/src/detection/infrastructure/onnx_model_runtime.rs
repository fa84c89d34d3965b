use std::path::{Path, PathBuf};

use crate::detection::domain::face_model::{BoxError, FaceModel};
use crate::detection::domain::model_runtime::{Backend, ModelArchitecture, ModelRuntime, ModelTier};

use super::execution_provider::accelerated_execution_providers;
use super::model_resolver::{self, ModelResolveError};
use super::onnx_ultraface_model::{self, OnnxUltraFaceModel};
use super::onnx_yolo_model::{self, OnnxYoloModel};

/// ONNX Runtime host for the face detector.
///
/// Model files are resolved from the cache directory, then an optional
/// bundled directory, and downloaded as a last resort.
pub struct OnnxModelRuntime {
    cache_dir: Option<PathBuf>,
    bundled_dir: Option<PathBuf>,
    accelerated: bool,
    confidence: Option<f64>,
}

impl OnnxModelRuntime {
    pub fn new() -> Self {
        Self {
            cache_dir: None,
            bundled_dir: None,
            accelerated: false,
            confidence: None,
        }
    }

    /// Look for model files here before downloading.
    pub fn with_bundled_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bundled_dir = Some(dir.into());
        self
    }

    /// Overrides the platform cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Overrides each architecture's default score threshold.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    fn cache_dir(&self) -> Result<PathBuf, ModelResolveError> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => model_resolver::model_cache_dir(),
        }
    }

    fn resolve(&self, tier: &ModelTier) -> Result<PathBuf, ModelResolveError> {
        model_resolver::resolve_in(
            &self.cache_dir()?,
            tier.file_name,
            tier.url,
            self.bundled_dir.as_deref(),
            Some(Box::new(log_progress)),
        )
    }

    fn load_from(&self, path: &Path, tier: &ModelTier) -> Result<Box<dyn FaceModel>, BoxError> {
        let model: Result<Box<dyn FaceModel>, Box<dyn std::error::Error>> = match tier.architecture {
            ModelArchitecture::Yolo => OnnxYoloModel::load(
                path,
                self.accelerated,
                self.confidence.unwrap_or(onnx_yolo_model::DEFAULT_CONFIDENCE),
            )
            .map(|m| Box::new(m) as Box<dyn FaceModel>),
            ModelArchitecture::UltraFace => OnnxUltraFaceModel::load(
                path,
                self.accelerated,
                self.confidence.unwrap_or(onnx_ultraface_model::DEFAULT_CONFIDENCE),
            )
            .map(|m| Box::new(m) as Box<dyn FaceModel>),
        };
        model.map_err(|e| format!("failed to load {}: {e}", path.display()).into())
    }
}

impl Default for OnnxModelRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRuntime for OnnxModelRuntime {
    fn probe_environment(&self) -> Result<(), String> {
        self.cache_dir().map(|_| ()).map_err(|e| e.to_string())
    }

    fn acquire_backend(&mut self, backend: Backend) -> Result<(), BoxError> {
        match backend {
            Backend::Accelerated => {
                if accelerated_execution_providers().is_empty() {
                    return Err("no hardware execution provider on this platform".into());
                }
                self.accelerated = true;
            }
            Backend::Cpu => self.accelerated = false,
        }
        Ok(())
    }

    fn load_model(&mut self, tier: &ModelTier) -> Result<Box<dyn FaceModel>, BoxError> {
        let path = self.resolve(tier)?;
        self.load_from(&path, tier)
    }
}

/// Logs download progress at each 10% step.
fn log_progress(downloaded: u64, total: u64) {
    const STEP: u64 = 1024 * 1024;
    if total > 0 {
        let pct = downloaded * 100 / total;
        let prev = downloaded.saturating_sub(STEP) * 100 / total;
        if pct / 10 != prev / 10 {
            log::info!("Model download {pct}%");
        }
    } else if downloaded % (10 * STEP) < STEP {
        log::info!("Model download {} MB", downloaded / STEP);
    }
}
