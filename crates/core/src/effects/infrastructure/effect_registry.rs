use std::collections::BTreeMap;

use crate::effects::domain::effect_error::EffectError;
use crate::effects::domain::effect_spec::{EffectStrength, EffectType};
use crate::effects::domain::region_effect::RegionEffect;
use crate::shared::region::FaceRegion;
use crate::shared::surface::PixelSurface;

use super::blur_effect::BlurEffect;
use super::mosaic_effect::MosaicEffect;

/// Maps effect identifiers to their implementations.
///
/// Callers select an effect by type only; nothing outside this registry
/// branches on which effect is in use.
pub struct EffectRegistry {
    effects: BTreeMap<EffectType, Box<dyn RegionEffect>>,
}

impl EffectRegistry {
    /// A registry with no effects. Every lookup fails until one is registered.
    pub fn empty() -> Self {
        Self {
            effects: BTreeMap::new(),
        }
    }

    /// Adds or replaces the implementation for `effect_type`.
    pub fn register(&mut self, effect_type: EffectType, effect: Box<dyn RegionEffect>) {
        log::debug!("Registering {effect_type} effect");
        self.effects.insert(effect_type, effect);
    }

    pub fn supported_effects(&self) -> Vec<EffectType> {
        self.effects.keys().copied().collect()
    }

    /// Applies the registered effect to every region of `surface` in place.
    ///
    /// An empty region list is a no-op. Any failure aborts the whole call.
    pub fn apply_effect(
        &self,
        surface: &mut PixelSurface,
        regions: &[FaceRegion],
        effect_type: EffectType,
        strength: EffectStrength,
    ) -> Result<(), EffectError> {
        let effect = self
            .effects
            .get(&effect_type)
            .ok_or_else(|| EffectError::UnknownEffect(effect_type.to_string()))?;
        effect.apply(surface, regions, strength)
    }

    /// Like [`apply_effect`](Self::apply_effect), selecting the effect by its
    /// string identifier.
    pub fn apply_named(
        &self,
        surface: &mut PixelSurface,
        regions: &[FaceRegion],
        effect_id: &str,
        strength: EffectStrength,
    ) -> Result<(), EffectError> {
        self.apply_effect(surface, regions, effect_id.parse()?, strength)
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(EffectType::Blur, Box::new(BlurEffect::new()));
        registry.register(EffectType::Mosaic, Box::new(MosaicEffect::new()));
        registry
    }
}
