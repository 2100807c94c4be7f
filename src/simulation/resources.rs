//! Shared resources held by the studio world.

use std::collections::VecDeque;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::simulation::{BASELINES, DIETARY_FACTORS, NoiseSource, StudioCommand, dietary_factor};

#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Phase length used on startup and after a reset.
    pub default_days: u32,
    pub min_days: u32,
    pub max_days: u32,
    /// Increment applied by the days control.
    pub days_step: u32,
    pub journal_capacity: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            default_days: 180,
            min_days: 7,
            max_days: 720,
            days_step: 7,
            journal_capacity: 64,
        }
    }
}

/// Inputs for the next phase, as chosen in the control deck.
#[derive(Debug, Clone, PartialEq, Eq, Resource, Serialize, Deserialize)]
pub struct PhaseSelection {
    pub baseline: usize,
    /// Factor keys in catalog order.
    pub factors: Vec<String>,
    pub days: u32,
}

impl PhaseSelection {
    pub fn new(config: &StudioConfig) -> Self {
        Self {
            baseline: 0,
            factors: Vec::new(),
            days: config.default_days,
        }
    }

    pub fn cycle_baseline(&mut self) {
        self.baseline = (self.baseline + 1) % BASELINES.len();
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.factors.iter().any(|f| f == key)
    }

    /// Flips a factor on or off. Keys outside the catalog are ignored.
    pub fn toggle_factor(&mut self, key: &str) {
        if dietary_factor(key).is_none() {
            return;
        }
        if self.is_active(key) {
            self.factors.retain(|f| f != key);
        } else {
            self.factors.push(key.to_string());
            self.sort_factors();
        }
    }

    pub fn set_factors<S: AsRef<str>>(&mut self, keys: &[S]) {
        self.factors.clear();
        for key in keys {
            let key = key.as_ref();
            if dietary_factor(key).is_some() && !self.is_active(key) {
                self.factors.push(key.to_string());
            }
        }
        self.sort_factors();
    }

    pub fn adjust_days(&mut self, steps: i32, config: &StudioConfig) {
        let shifted = self.days as i64 + steps as i64 * config.days_step as i64;
        self.days = shifted.clamp(config.min_days as i64, config.max_days as i64) as u32;
    }

    fn sort_factors(&mut self) {
        self.factors.sort_by_key(|key| {
            DIETARY_FACTORS
                .iter()
                .position(|factor| factor.key == key.as_str())
                .unwrap_or(usize::MAX)
        });
    }
}

/// Commands waiting for the next schedule run, oldest first.
#[derive(Debug, Default, Resource)]
pub struct CommandQueue(VecDeque<StudioCommand>);

impl CommandQueue {
    pub fn push(&mut self, command: StudioCommand) {
        self.0.push_back(command);
    }

    pub fn pop(&mut self) -> Option<StudioCommand> {
        self.0.pop_front()
    }
}

#[derive(Resource)]
pub struct StudioNoise(pub Box<dyn NoiseSource + Send + Sync>);

/// Outcome of the most recently processed command.
#[derive(Debug, Clone, Default, Resource, Serialize, Deserialize)]
pub struct StudioStatus {
    pub commands_processed: u64,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalKind {
    Fresh,
    Append,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub seq: u64,
    pub kind: JournalKind,
    /// Baseline the phase was seeded from; `None` for appends, continued runs and resets.
    pub baseline: Option<usize>,
    pub start_day: u32,
    pub end_day: u32,
    pub factors: Vec<String>,
    pub shannon: Option<f64>,
    pub simpson: Option<f64>,
}

/// Bounded record of completed phases and resets.
#[derive(Debug, Clone, Resource)]
pub struct PhaseJournal {
    entries: VecDeque<JournalEntry>,
    capacity: usize,
    recorded: u64,
}

impl PhaseJournal {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            recorded: 0,
        }
    }

    /// Assigns the next sequence number and stores the entry.
    pub fn push(&mut self, mut entry: JournalEntry) {
        self.recorded += 1;
        entry.seq = self.recorded;
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    pub fn since(&self, seq: u64) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(move |entry| entry.seq > seq)
    }

    pub fn snapshot(&self) -> Vec<JournalEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for PhaseJournal {
    fn default() -> Self {
        Self::new(StudioConfig::default().journal_capacity)
    }
}
