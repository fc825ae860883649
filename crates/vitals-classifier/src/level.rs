//! Risk level shared across the pipeline

use serde::{Deserialize, Serialize};

/// Driver risk level with total severity order Critical > Warning > Normal
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum RiskLevel {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl RiskLevel {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Normal => "NORMAL",
            RiskLevel::Warning => "WARNING",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    /// Index into a class-probability array
    pub fn index(self) -> usize {
        match self {
            RiskLevel::Normal => 0,
            RiskLevel::Warning => 1,
            RiskLevel::Critical => 2,
        }
    }

    /// Level for a class-probability index; out-of-range saturates to Critical
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => RiskLevel::Normal,
            1 => RiskLevel::Warning,
            _ => RiskLevel::Critical,
        }
    }
}
