use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::effect_error::EffectError;

/// Anonymization effect applied to face regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectType {
    Blur,
    Mosaic,
}

impl EffectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectType::Blur => "blur",
            EffectType::Mosaic => "mosaic",
        }
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectType {
    type Err = EffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blur" => Ok(EffectType::Blur),
            "mosaic" => Ok(EffectType::Mosaic),
            other => Err(EffectError::UnknownEffect(other.to_string())),
        }
    }
}

/// Ordinal intensity on a closed 1..=5 scale.
///
/// Each effect maps the ordinal onto its own physical parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct EffectStrength(u8);

impl EffectStrength {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, EffectError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(EffectError::InvalidStrength(value))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Zero-based position for indexing per-effect lookup tables.
    pub fn index(&self) -> usize {
        (self.0 - Self::MIN) as usize
    }

    /// Every strength, weakest first.
    pub fn all() -> impl Iterator<Item = EffectStrength> {
        (Self::MIN..=Self::MAX).map(EffectStrength)
    }
}

impl Default for EffectStrength {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for EffectStrength {
    type Error = EffectError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EffectStrength> for u8 {
    fn from(strength: EffectStrength) -> Self {
        strength.0
    }
}

/// The user's selected effect and intensity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub effect_type: EffectType,
    pub strength: EffectStrength,
}

impl EffectSpec {
    pub fn new(effect_type: EffectType, strength: EffectStrength) -> Self {
        Self {
            effect_type,
            strength,
        }
    }
}

impl Default for EffectSpec {
    fn default() -> Self {
        Self::new(EffectType::Blur, EffectStrength::default())
    }
}
