use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;

use faceveil_core::detection::domain::detection_result::DetectionResult;
use faceveil_core::detection::domain::face_detector::{DetectorConfig, FaceDetector};
use faceveil_core::detection::infrastructure::onnx_model_runtime::OnnxModelRuntime;
use faceveil_core::effects::domain::effect_spec::{EffectStrength, EffectType};
use faceveil_core::pipeline::anonymization_session::AnonymizationSession;
use faceveil_core::shared::constants::IMAGE_EXTENSIONS;

/// Face anonymization for still images.
#[derive(Parser)]
#[command(name = "faceveil")]
struct Cli {
    /// Input image file.
    input: PathBuf,

    /// Output image file. The format follows the extension.
    output: PathBuf,

    /// Effect applied to each face: blur or mosaic.
    #[arg(long, default_value = "blur")]
    effect: String,

    /// Effect strength (1-5).
    #[arg(long, default_value = "3")]
    strength: u8,

    /// Seconds to wait for the face model to load.
    #[arg(long, default_value = "30")]
    init_timeout: u64,

    /// Face detection confidence threshold (0.0-1.0). Defaults per model.
    #[arg(long)]
    confidence: Option<f64>,

    /// Write detected face regions as JSON to this file.
    #[arg(long)]
    detections: Option<PathBuf>,

    /// Directory holding pre-downloaded model files.
    #[arg(long)]
    models_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let effect_type: EffectType = cli.effect.parse()?;
    let strength = EffectStrength::new(cli.strength)?;

    let mut session = AnonymizationSession::new(build_detector(&cli));
    log::info!("Loading face detection model");
    session.initialize_detector()?;
    session.set_effect_type(effect_type)?;
    session.set_strength(strength);

    let bytes = fs::read(&cli.input)?;
    let detection = session.load_image(&bytes)?;
    log::info!(
        "Applied {effect_type} (strength {}) to {} faces",
        strength.get(),
        detection.count()
    );

    let processed = session
        .processed_surface()
        .and_then(|surface| surface.to_rgba_image())
        .ok_or("No processed image was produced")?;
    processed.save(&cli.output)?;
    log::info!("Wrote {}", cli.output.display());

    if let Some(path) = &cli.detections {
        write_detections(path, &detection)?;
    }

    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !is_image(&cli.output) {
        return Err(format!(
            "Output must be an image file ({}), got {}",
            IMAGE_EXTENSIONS.join(", "),
            cli.output.display()
        )
        .into());
    }
    if cli.effect != "blur" && cli.effect != "mosaic" {
        return Err(format!("Effect must be 'blur' or 'mosaic', got '{}'", cli.effect).into());
    }
    if !(EffectStrength::MIN..=EffectStrength::MAX).contains(&cli.strength) {
        return Err(format!(
            "Strength must be between {} and {}, got {}",
            EffectStrength::MIN,
            EffectStrength::MAX,
            cli.strength
        )
        .into());
    }
    if cli.init_timeout == 0 {
        return Err("Init timeout must be at least 1 second".into());
    }
    if let Some(c) = cli.confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(format!("Confidence must be between 0.0 and 1.0, got {c}").into());
        }
    }
    if let Some(dir) = &cli.models_dir {
        if !dir.is_dir() {
            return Err(format!("Models directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn build_detector(cli: &Cli) -> FaceDetector {
    let mut runtime = OnnxModelRuntime::new();
    if let Some(dir) = &cli.models_dir {
        runtime = runtime.with_bundled_dir(dir);
    }
    if let Some(c) = cli.confidence {
        runtime = runtime.with_confidence(c);
    }
    let config = DetectorConfig {
        init_timeout: Duration::from_secs(cli.init_timeout),
        ..DetectorConfig::default()
    };
    FaceDetector::with_config(Box::new(runtime), config)
}

fn write_detections(path: &Path, detection: &DetectionResult) -> Result<(), Box<dyn std::error::Error>> {
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, detection)?;
    log::info!("Wrote {} detections to {}", detection.count(), path.display());
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
