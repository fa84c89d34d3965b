use thiserror::Error;

use crate::effects::domain::effect_error::EffectError;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to apply effect: {0}")]
    Effect(#[from] EffectError),
    #[error("no original image to reprocess")]
    NoOriginalImage,
}
