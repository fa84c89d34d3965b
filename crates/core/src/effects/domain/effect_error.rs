use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    #[error("no drawable backing store for a {width}x{height} surface")]
    TargetUnavailable { width: u32, height: u32 },
    #[error("unknown effect type: {0}")]
    UnknownEffect(String),
    #[error("effect strength must be between 1 and 5, got {0}")]
    InvalidStrength(u8),
}
