use std::time::Duration;

use thiserror::Error;

use super::face_model::BoxError;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("face detection is unavailable in this environment: {0}")]
    Environment(String),
    #[error("face detection model initialization failed: {0}")]
    ModelInitialization(String),
    #[error("face detection initialization timed out after {}s", .0.as_secs())]
    InitializationTimeout(Duration),
    #[error("face detector not initialized")]
    NotInitialized,
    #[error("face detection failed")]
    DetectionFailed(#[source] BoxError),
}
