use crate::shared::region::FaceRegion;
use crate::shared::surface::PixelSurface;

use super::effect_error::EffectError;
use super::effect_spec::EffectStrength;

/// Domain interface for an effect applied to face regions of a surface.
///
/// Implementations modify the surface in place and keep no reference to it
/// after returning. Pixels outside every region must stay untouched.
pub trait RegionEffect: Send + Sync {
    fn apply(
        &self,
        surface: &mut PixelSurface,
        regions: &[FaceRegion],
        strength: EffectStrength,
    ) -> Result<(), EffectError>;
}

/// Common precondition for effects: the surface must have a backing store.
pub fn ensure_drawable(surface: &PixelSurface) -> Result<(), EffectError> {
    if surface.is_drawable() {
        Ok(())
    } else {
        Err(EffectError::TargetUnavailable {
            width: surface.width(),
            height: surface.height(),
        })
    }
}
