use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use crate::shared::constants::{
    ULTRAFACE_MODEL_NAME, ULTRAFACE_MODEL_URL, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};
use crate::shared::surface::PixelSurface;

use super::detection_filter::DetectionFilter;
use super::detection_result::DetectionResult;
use super::detector_error::DetectorError;
use super::face_model::FaceModel;
use super::fallback_chain::{FallbackChain, FallbackError};
use super::model_runtime::{Backend, ModelArchitecture, ModelRuntime, ModelTier};

/// Upper bound on how long model initialization may take.
pub const INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Model tiers in the order they are tried.
pub const DEFAULT_MODEL_TIERS: [ModelTier; 2] = [
    ModelTier {
        name: "yolo11-face",
        file_name: YOLO_MODEL_NAME,
        url: YOLO_MODEL_URL,
        architecture: ModelArchitecture::Yolo,
    },
    ModelTier {
        name: "ultraface-rfb-320",
        file_name: ULTRAFACE_MODEL_NAME,
        url: ULTRAFACE_MODEL_URL,
        architecture: ModelArchitecture::UltraFace,
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectorState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

#[derive(Clone, Debug)]
pub struct DetectorConfig {
    pub init_timeout: Duration,
    pub filter: DetectionFilter,
    pub tiers: Vec<ModelTier>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            init_timeout: INIT_TIMEOUT,
            filter: DetectionFilter::default(),
            tiers: DEFAULT_MODEL_TIERS.to_vec(),
        }
    }
}

type Acquired = (Box<dyn ModelRuntime>, Box<dyn FaceModel>);

/// Face detector with a lazily loaded model.
///
/// `initialize` is idempotent once it succeeds. A failed or timed-out
/// initialization is terminal for this instance; construct a new detector
/// to retry.
pub struct FaceDetector {
    runtime: Option<Box<dyn ModelRuntime>>,
    model: Option<Box<dyn FaceModel>>,
    state: DetectorState,
    config: DetectorConfig,
    disposed: bool,
}

impl FaceDetector {
    pub fn new(runtime: Box<dyn ModelRuntime>) -> Self {
        Self::with_config(runtime, DetectorConfig::default())
    }

    pub fn with_config(runtime: Box<dyn ModelRuntime>, config: DetectorConfig) -> Self {
        Self {
            runtime: Some(runtime),
            model: None,
            state: DetectorState::Uninitialized,
            config,
            disposed: false,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == DetectorState::Ready && self.model.is_some()
    }

    /// Selects a backend and loads the first model tier that works.
    ///
    /// Backend failures are tolerated; the model loads on whatever the
    /// runtime falls back to. The whole sequence is bounded by the
    /// configured timeout.
    pub fn initialize(&mut self) -> Result<(), DetectorError> {
        if self.is_initialized() {
            return Ok(());
        }
        if self.disposed {
            return Err(DetectorError::Environment(
                "detector has been disposed".into(),
            ));
        }
        if self.state == DetectorState::Failed {
            return Err(DetectorError::ModelInitialization(
                "an earlier initialization attempt failed".into(),
            ));
        }
        let Some(runtime) = self.runtime.take() else {
            self.state = DetectorState::Failed;
            return Err(DetectorError::ModelInitialization(
                "model runtime is unavailable".into(),
            ));
        };
        if let Err(reason) = runtime.probe_environment() {
            self.runtime = Some(runtime);
            return Err(DetectorError::Environment(reason));
        }

        self.state = DetectorState::Initializing;
        log::info!(
            "Initializing face detector ({} model tiers, timeout {:?})",
            self.config.tiers.len(),
            self.config.init_timeout
        );

        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, rx) = crossbeam_channel::bounded(1);
        let tiers = self.config.tiers.clone();
        let worker_cancelled = Arc::clone(&cancelled);
        thread::spawn(move || {
            let _ = tx.send(acquire_model(runtime, &tiers, &worker_cancelled));
        });

        match rx.recv_timeout(self.config.init_timeout) {
            Ok(Ok((runtime, model))) => {
                self.runtime = Some(runtime);
                self.model = Some(model);
                self.state = DetectorState::Ready;
                log::info!("Face detector ready");
                Ok(())
            }
            Ok(Err(e)) => {
                self.state = DetectorState::Failed;
                let message = match e {
                    FallbackError::Exhausted { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                log::error!("Face detector initialization failed: {message}");
                Err(DetectorError::ModelInitialization(message))
            }
            Err(RecvTimeoutError::Timeout) => {
                cancelled.store(true, Ordering::Relaxed);
                self.state = DetectorState::Failed;
                log::error!(
                    "Face detector initialization timed out after {:?}",
                    self.config.init_timeout
                );
                Err(DetectorError::InitializationTimeout(self.config.init_timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.state = DetectorState::Failed;
                Err(DetectorError::ModelInitialization(
                    "initialization worker terminated unexpectedly".into(),
                ))
            }
        }
    }

    /// Runs the model on `surface` and returns plausible, non-overlapping
    /// face regions. Zero faces is a success.
    pub fn detect_faces(&mut self, surface: &PixelSurface) -> Result<DetectionResult, DetectorError> {
        if self.state != DetectorState::Ready {
            return Err(DetectorError::NotInitialized);
        }
        let model = self.model.as_mut().ok_or(DetectorError::NotInitialized)?;
        if !surface.is_drawable() {
            return Err(DetectorError::DetectionFailed(
                format!(
                    "surface {}x{} has no pixels",
                    surface.width(),
                    surface.height()
                )
                .into(),
            ));
        }

        let raw = model
            .estimate_faces(surface)
            .map_err(DetectorError::DetectionFailed)?;
        let regions = self
            .config
            .filter
            .apply(&raw, surface.width(), surface.height());
        log::debug!(
            "Model returned {} boxes, {} kept after filtering",
            raw.len(),
            regions.len()
        );
        Ok(DetectionResult::new(regions))
    }

    /// Releases the model. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.model.take().is_some() {
            log::debug!("Face detector disposed");
        }
        self.runtime = None;
        self.state = DetectorState::Uninitialized;
        self.disposed = true;
    }
}

impl Drop for FaceDetector {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn acquire_model(
    mut runtime: Box<dyn ModelRuntime>,
    tiers: &[ModelTier],
    cancelled: &AtomicBool,
) -> Result<Acquired, FallbackError> {
    let backend = FallbackChain::new("inference backend")
        .cancel_on(cancelled)
        .run(Backend::PRIORITY, |backend| runtime.acquire_backend(*backend));
    match backend {
        Ok(()) => {}
        Err(FallbackError::Cancelled(what)) => return Err(FallbackError::Cancelled(what)),
        Err(e) => log::warn!("Continuing with runtime default backend: {e}"),
    }

    let model = FallbackChain::new("face detection model")
        .cancel_on(cancelled)
        .run(tiers, |tier| runtime.load_model(tier))?;
    Ok((runtime, model))
}
