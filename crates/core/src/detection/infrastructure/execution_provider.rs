use ort::execution_providers::ExecutionProviderDispatch;

/// Hardware-accelerated ONNX execution providers for the current platform.
///
/// Empty when the platform has none, in which case sessions run on the
/// CPU provider ort always registers.
pub fn accelerated_execution_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Builds an ONNX session for `model_path`, registering the accelerated
/// providers only when `accelerated` is set.
pub fn build_session(
    model_path: &std::path::Path,
    accelerated: bool,
) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    let mut builder = ort::session::Session::builder()?;
    if accelerated {
        let providers = accelerated_execution_providers();
        if !providers.is_empty() {
            builder = builder.with_execution_providers(providers)?;
        }
    }
    Ok(builder.commit_from_file(model_path)?)
}
