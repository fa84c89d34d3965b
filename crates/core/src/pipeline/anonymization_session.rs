use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::detector_error::DetectorError;
use crate::detection::domain::face_detector::{DetectorState, FaceDetector};
use crate::effects::domain::effect_spec::{EffectSpec, EffectStrength, EffectType};
use crate::shared::surface::PixelSurface;

use super::debouncer::Debouncer;
use super::processing_error::ProcessingError;
use super::processing_orchestrator::ProcessingOrchestrator;

/// Quiet period before a strength change is applied.
pub const STRENGTH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

/// Outcome of a background (debounced) reprocess.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Processed(EffectSpec),
    Failed(String),
}

struct SessionState {
    orchestrator: ProcessingOrchestrator,
    detection: Option<DetectionResult>,
    spec: EffectSpec,
    // Bumped on every new image and clear; stale timers compare against it.
    generation: u64,
}

impl SessionState {
    fn reprocess(&mut self) -> Result<(), ProcessingError> {
        let empty = DetectionResult::default();
        let detection = self.detection.as_ref().unwrap_or(&empty);
        self.orchestrator
            .reprocess_image(detection, self.spec)
            .map(|_| ())
    }
}

/// One user's anonymization workflow over a single image at a time.
///
/// Owns the detector, the current detection result and effect spec.
/// Detection runs once per image; effect changes only re-run the effect.
pub struct AnonymizationSession {
    detector: FaceDetector,
    state: Arc<Mutex<SessionState>>,
    debouncer: Debouncer,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
}

impl AnonymizationSession {
    pub fn new(detector: FaceDetector) -> Self {
        Self::with_debounce(detector, STRENGTH_DEBOUNCE)
    }

    pub fn with_debounce(detector: FaceDetector, delay: Duration) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Self {
            detector,
            state: Arc::new(Mutex::new(SessionState {
                orchestrator: ProcessingOrchestrator::new(),
                detection: None,
                spec: EffectSpec::default(),
                generation: 0,
            })),
            debouncer: Debouncer::new(delay),
            events_tx,
            events_rx,
        }
    }

    pub fn initialize_detector(&mut self) -> Result<(), SessionError> {
        Ok(self.detector.initialize()?)
    }

    pub fn detector_state(&self) -> DetectorState {
        self.detector.state()
    }

    /// Decodes, detects, and processes a new image with the current spec.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<DetectionResult, SessionError> {
        self.debouncer.cancel();
        let surface = PixelSurface::decode(bytes).map_err(ProcessingError::Decode)?;
        let detection = self.detector.detect_faces(&surface)?;
        log::info!(
            "Detected {} faces in {}x{} image",
            detection.count(),
            surface.width(),
            surface.height()
        );

        let mut state = lock(&self.state);
        state.generation += 1;
        state.detection = Some(detection.clone());
        let spec = state.spec;
        state.orchestrator.process_surface(surface, &detection, spec)?;
        Ok(detection)
    }

    /// Records `strength` and reprocesses once changes settle.
    ///
    /// The outcome arrives on [`events`](Self::events).
    pub fn set_strength(&mut self, strength: EffectStrength) {
        let generation = {
            let mut state = lock(&self.state);
            state.spec.strength = strength;
            if state.orchestrator.original_surface().is_none() {
                return;
            }
            state.generation
        };

        let shared = Arc::clone(&self.state);
        let events = self.events_tx.clone();
        self.debouncer.schedule(move || {
            let mut state = lock(&shared);
            if state.generation != generation {
                return;
            }
            let event = match state.reprocess() {
                Ok(()) => SessionEvent::Processed(state.spec),
                Err(e) => SessionEvent::Failed(e.to_string()),
            };
            let _ = events.send(event);
        });
    }

    /// Switches the effect and reprocesses immediately.
    pub fn set_effect_type(&mut self, effect_type: EffectType) -> Result<(), SessionError> {
        self.debouncer.cancel();
        let mut state = lock(&self.state);
        state.spec.effect_type = effect_type;
        if state.orchestrator.original_surface().is_none() {
            return Ok(());
        }
        Ok(state.reprocess()?)
    }

    /// Drops the image, its detection result, and any pending reprocess.
    pub fn clear_image(&mut self) {
        self.debouncer.cancel();
        let mut state = lock(&self.state);
        state.generation += 1;
        state.detection = None;
        state.orchestrator.reset();
    }

    pub fn spec(&self) -> EffectSpec {
        lock(&self.state).spec
    }

    pub fn detection(&self) -> Option<DetectionResult> {
        lock(&self.state).detection.clone()
    }

    pub fn processed_surface(&self) -> Option<PixelSurface> {
        lock(&self.state).orchestrator.processed_surface().cloned()
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.state)
            .orchestrator
            .last_error()
            .map(str::to_string)
    }

    pub fn clear_error(&self) {
        lock(&self.state).orchestrator.clear_error();
    }

    /// Results of debounced reprocessing.
    pub fn events(&self) -> &Receiver<SessionEvent> {
        &self.events_rx
    }
}

impl Drop for AnonymizationSession {
    fn drop(&mut self) {
        self.debouncer.cancel();
        self.detector.dispose();
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_model::{BoxError, FaceModel, RawFaceBox};
    use crate::detection::domain::model_runtime::{Backend, ModelRuntime, ModelTier};
    use std::io::Cursor;
    use std::thread;

    const DEBOUNCE: Duration = Duration::from_millis(50);

    struct FixedRuntime;

    impl ModelRuntime for FixedRuntime {
        fn probe_environment(&self) -> Result<(), String> {
            Ok(())
        }

        fn acquire_backend(&mut self, _backend: Backend) -> Result<(), BoxError> {
            Ok(())
        }

        fn load_model(&mut self, _tier: &ModelTier) -> Result<Box<dyn FaceModel>, BoxError> {
            Ok(Box::new(FixedModel))
        }
    }

    struct FixedModel;

    impl FaceModel for FixedModel {
        fn estimate_faces(&mut self, _surface: &PixelSurface) -> Result<Vec<RawFaceBox>, BoxError> {
            Ok(vec![RawFaceBox::from_corners(10.0, 10.0, 40.0, 40.0, 0.9)])
        }
    }

    fn image_bytes() -> Vec<u8> {
        let mut surface = PixelSurface::blank(64, 64);
        for y in 0..64 {
            for x in 0..64 {
                let v = if (x / 2 + y / 2) % 2 == 0 { 230 } else { 20 };
                surface.set_pixel(x, y, [v, v, v, 255]);
            }
        }
        let mut bytes = Vec::new();
        surface
            .to_rgba_image()
            .unwrap()
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn ready_session() -> AnonymizationSession {
        let mut session =
            AnonymizationSession::with_debounce(FaceDetector::new(Box::new(FixedRuntime)), DEBOUNCE);
        session.initialize_detector().unwrap();
        session
    }

    fn strength(v: u8) -> EffectStrength {
        EffectStrength::new(v).unwrap()
    }

    #[test]
    fn test_load_before_initialize_fails() {
        let mut session = AnonymizationSession::new(FaceDetector::new(Box::new(FixedRuntime)));
        let err = session.load_image(&image_bytes()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Detector(DetectorError::NotInitialized)
        ));
    }

    #[test]
    fn test_load_image_detects_and_processes() {
        let mut session = ready_session();
        let detection = session.load_image(&image_bytes()).unwrap();
        assert_eq!(detection.count(), 1);
        assert_eq!(session.detection(), Some(detection));

        let processed = session.processed_surface().unwrap();
        let original = PixelSurface::decode(&image_bytes()).unwrap();
        assert_ne!(processed, original);
        assert_eq!(processed.pixel(60, 60), original.pixel(60, 60));
    }

    #[test]
    fn test_undecodable_image_fails() {
        let mut session = ready_session();
        let err = session.load_image(b"garbage").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Processing(ProcessingError::Decode(_))
        ));
    }

    #[test]
    fn test_strength_burst_collapses_to_one_reprocess() {
        let mut session = ready_session();
        session.load_image(&image_bytes()).unwrap();

        for v in [2, 3, 4] {
            session.set_strength(strength(v));
        }

        let event = session
            .events()
            .recv_timeout(Duration::from_secs(2))
            .unwrap();
        assert_eq!(
            event,
            SessionEvent::Processed(EffectSpec::new(EffectType::Blur, strength(4)))
        );
        assert!(session
            .events()
            .recv_timeout(Duration::from_millis(200))
            .is_err());
    }

    #[test]
    fn test_clear_cancels_pending_strength_change() {
        let mut session = ready_session();
        session.load_image(&image_bytes()).unwrap();
        session.set_strength(strength(5));
        session.clear_image();

        assert!(session
            .events()
            .recv_timeout(Duration::from_millis(250))
            .is_err());
        assert!(session.processed_surface().is_none());
        assert!(session.detection().is_none());
    }

    #[test]
    fn test_strength_without_image_is_only_recorded() {
        let mut session = ready_session();
        session.set_strength(strength(1));
        thread::sleep(Duration::from_millis(150));
        assert!(session.events().try_recv().is_err());
        assert_eq!(session.spec().strength, strength(1));
    }

    #[test]
    fn test_effect_type_change_applies_immediately() {
        let mut session = ready_session();
        session.load_image(&image_bytes()).unwrap();
        let blurred = session.processed_surface().unwrap();

        session.set_effect_type(EffectType::Mosaic).unwrap();
        let pixelated = session.processed_surface().unwrap();
        assert_ne!(blurred, pixelated);
        assert_eq!(session.spec().effect_type, EffectType::Mosaic);
    }

    #[test]
    fn test_drop_disposes_detector_and_cancels_timer() {
        let mut session = ready_session();
        session.load_image(&image_bytes()).unwrap();
        session.set_strength(strength(2));
        let events = session.events().clone();
        drop(session);

        // The sender lives in the cancelled task and the dropped session.
        assert!(events.recv_timeout(Duration::from_millis(200)).is_err());
    }
}
