pub mod blur_effect;
pub mod effect_registry;
mod gaussian;
pub mod mosaic_effect;
