pub mod detection_filter;
pub mod detection_result;
pub mod detector_error;
pub mod face_detector;
pub mod face_model;
pub mod fallback_chain;
pub mod model_runtime;
