//! Commands accepted by the studio world, plus the request payloads behind them.

use serde::{Deserialize, Serialize};

use crate::simulation::StudioConfig;

fn default_days() -> u32 {
    StudioConfig::default().default_days
}

/// A complete fresh-phase request: `{ baseline, factors, days }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRequest {
    #[serde(default)]
    pub baseline: usize,
    #[serde(default)]
    pub factors: Vec<String>,
    #[serde(default = "default_days")]
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendRequest {
    #[serde(default)]
    pub factors: Vec<String>,
    #[serde(default = "default_days")]
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StudioCommand {
    SelectBaseline { index: usize },
    CycleBaseline,
    ToggleFactor { key: String },
    /// Moves the phase length by whole `days_step` increments.
    AdjustDays { steps: i32 },
    SetDays { days: u32 },
    /// Fresh phase from the selected baseline.
    RunFresh,
    /// Fresh phase seeded from the community the last phase ended with.
    RunContinued,
    /// Append using the current selection's factors and days.
    Append,
    /// Replace the selection with `request`, then run a fresh phase.
    Submit { request: PhaseRequest },
    /// Replace selected factors and days, then append.
    SubmitAppend { request: AppendRequest },
    /// Clear history and restore the default selection.
    Reset,
}
