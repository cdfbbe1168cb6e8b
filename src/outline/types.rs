//! Common types for the outline module

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Smallest width/height any strategy accepts
pub const MIN_DIMENSION: u32 = 2;

/// Outline extraction error types
#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("Image too small: {width}x{height} (need at least {min}x{min})", min = MIN_DIMENSION)]
    ImageTooSmall { width: u32, height: u32 },

    #[error("Invalid channel count: expected 3, got {0}")]
    InvalidChannels(usize),

    #[error("Invalid image shape: {0}")]
    InvalidShape(String),
}

pub type Result<T> = std::result::Result<T, OutlineError>;

/// Reject images the gradient pipeline cannot produce a difference map for
pub(crate) fn ensure_min_size(width: u32, height: u32) -> Result<()> {
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(OutlineError::ImageTooSmall { width, height });
    }
    Ok(())
}

/// Outline extraction strategy selection
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutlineStrategy {
    /// Inverse-threshold the luma plane and draw traced contour borders
    Contour,

    /// Canny edge detector, inverted
    Canny,

    /// Adjacent-pixel color difference with morphological cleanup
    #[default]
    Gradient,
}

impl OutlineStrategy {
    /// All strategies, in declaration order
    pub const ALL: [OutlineStrategy; 3] = [
        OutlineStrategy::Contour,
        OutlineStrategy::Canny,
        OutlineStrategy::Gradient,
    ];

    /// Lowercase name used in config files and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            OutlineStrategy::Contour => "contour",
            OutlineStrategy::Canny => "canny",
            OutlineStrategy::Gradient => "gradient",
        }
    }
}

impl fmt::Display for OutlineStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutlineStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown outline strategy: {s}"))
    }
}
