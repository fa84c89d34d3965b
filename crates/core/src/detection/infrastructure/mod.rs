pub mod execution_provider;
mod math;
pub mod model_resolver;
pub mod onnx_model_runtime;
pub mod onnx_ultraface_model;
pub mod onnx_yolo_model;
