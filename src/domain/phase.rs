//! Pipeline phases.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One of the four fixed pipeline phases, declared in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Spec,
    Dev,
    Test,
    Rollout,
}

impl Phase {
    /// All phases in pipeline order
    pub const ALL: [Phase; 4] = [Phase::Spec, Phase::Dev, Phase::Test, Phase::Rollout];

    /// Position of the phase in the pipeline (0-based)
    pub fn index(&self) -> usize {
        match self {
            Self::Spec => 0,
            Self::Dev => 1,
            Self::Test => 2,
            Self::Rollout => 3,
        }
    }

    /// Lowercase identifier used in files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spec => "spec",
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Rollout => "rollout",
        }
    }

    /// Display name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Spec => "Specification",
            Self::Dev => "Development",
            Self::Test => "Testing",
            Self::Rollout => "Rollout",
        }
    }

    /// Single-letter code used in compact history columns
    pub fn short_code(&self) -> &'static str {
        match self {
            Self::Spec => "S",
            Self::Dev => "D",
            Self::Test => "T",
            Self::Rollout => "R",
        }
    }

    /// Uppercase label used as report column prefix
    pub fn label(&self) -> &'static str {
        match self {
            Self::Spec => "SPEC",
            Self::Dev => "DEV",
            Self::Test => "TEST",
            Self::Rollout => "ROLLOUT",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spec" | "specification" => Ok(Self::Spec),
            "dev" | "development" => Ok(Self::Dev),
            "test" | "testing" => Ok(Self::Test),
            "rollout" => Ok(Self::Rollout),
            other => Err(format!("unknown phase '{}'", other)),
        }
    }
}
