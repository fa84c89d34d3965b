use crate::detection::domain::detection_result::DetectionResult;
use crate::effects::domain::effect_spec::EffectSpec;
use crate::effects::infrastructure::effect_registry::EffectRegistry;
use crate::shared::surface::PixelSurface;

use super::processing_error::ProcessingError;

/// Single-image anonymization: pairs detected regions with an effect spec.
///
/// The original surface is kept untouched so parameter changes re-derive
/// the processed surface from it without re-running detection. Each run
/// works on a fresh copy of the original.
pub struct ProcessingOrchestrator {
    effects: EffectRegistry,
    original: Option<PixelSurface>,
    processed: Option<PixelSurface>,
    last_error: Option<String>,
}

impl ProcessingOrchestrator {
    pub fn new() -> Self {
        Self::with_registry(EffectRegistry::default())
    }

    pub fn with_registry(effects: EffectRegistry) -> Self {
        Self {
            effects,
            original: None,
            processed: None,
            last_error: None,
        }
    }

    /// Decodes `bytes` into a new original and processes it.
    ///
    /// The stored original is only replaced once decoding succeeds.
    pub fn process_image(
        &mut self,
        bytes: &[u8],
        detection: &DetectionResult,
        spec: EffectSpec,
    ) -> Result<&PixelSurface, ProcessingError> {
        match PixelSurface::decode(bytes) {
            Ok(surface) => self.process_surface(surface, detection, spec),
            Err(e) => Err(self.fail(ProcessingError::Decode(e))),
        }
    }

    /// Like [`process_image`](Self::process_image) for an already decoded surface.
    pub fn process_surface(
        &mut self,
        surface: PixelSurface,
        detection: &DetectionResult,
        spec: EffectSpec,
    ) -> Result<&PixelSurface, ProcessingError> {
        log::debug!(
            "New original image {}x{}",
            surface.width(),
            surface.height()
        );
        self.original = Some(surface);
        self.reprocess_image(detection, spec)
    }

    /// Re-applies `spec` to the stored original.
    ///
    /// On failure the previous processed surface is kept.
    pub fn reprocess_image(
        &mut self,
        detection: &DetectionResult,
        spec: EffectSpec,
    ) -> Result<&PixelSurface, ProcessingError> {
        let mut working = match &self.original {
            Some(original) => original.clone(),
            None => return Err(self.fail(ProcessingError::NoOriginalImage)),
        };

        if let Err(e) = self.effects.apply_effect(
            &mut working,
            detection.regions(),
            spec.effect_type,
            spec.strength,
        ) {
            return Err(self.fail(e.into()));
        }

        log::debug!(
            "Applied {} (strength {}) to {} regions",
            spec.effect_type,
            spec.strength.get(),
            detection.count()
        );
        self.last_error = None;
        let processed: &PixelSurface = self.processed.insert(working);
        Ok(processed)
    }

    /// Drops both surfaces and any recorded error.
    pub fn reset(&mut self) {
        self.original = None;
        self.processed = None;
        self.last_error = None;
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn original_surface(&self) -> Option<&PixelSurface> {
        self.original.as_ref()
    }

    pub fn processed_surface(&self) -> Option<&PixelSurface> {
        self.processed.as_ref()
    }

    fn fail(&mut self, error: ProcessingError) -> ProcessingError {
        log::warn!("Processing failed: {error}");
        self.last_error = Some(error.to_string());
        error
    }
}

impl Default for ProcessingOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
