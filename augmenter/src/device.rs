//! Device selection for transform execution.
//!
//! The host lists devices as `"CPU"` followed by one `"GPU <n> - <name>"` entry
//! per accelerator. The engine only carries the parsed value through to the
//! volumes it hands to transforms.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AugmentError, AugmentResult};

/// Where transforms run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    /// Host memory.
    #[default]
    Cpu,
    /// Accelerator with the given ordinal.
    Accelerator(usize),
}

impl Device {
    /// Parse a device selector as displayed by the host application.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::InvalidDevice`] when the text is neither `CPU` nor
    /// a `GPU <n> - <name>` entry.
    pub fn from_selector(selector: &str) -> AugmentResult<Self> {
        let trimmed = selector.trim();
        if trimmed.eq_ignore_ascii_case("cpu") {
            return Ok(Self::Cpu);
        }

        accelerator_ordinal(trimmed)
            .map(Self::Accelerator)
            .ok_or_else(|| AugmentError::InvalidDevice {
                value: selector.to_string(),
            })
    }
}

static ACCELERATOR: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"GPU (\d+) -").ok());

/// Extracts `n` from text containing `GPU <n> -`.
fn accelerator_ordinal(text: &str) -> Option<usize> {
    let captures = ACCELERATOR.as_ref()?.captures(text)?;
    captures.get(1)?.as_str().parse().ok()
}

impl FromStr for Device {
    type Err = AugmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_selector(s)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Accelerator(ordinal) => write!(f, "cuda:{ordinal}"),
        }
    }
}
