//! Cumulative phase history and the fresh/append/reset lifecycle.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::simulation::{AbundanceVector, NoiseSource, PhaseSample, SPECIES_COUNT, baseline, run_phase};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no phase has been run yet; start a fresh phase before appending")]
    NotPopulated,
    #[error("baseline {0} is not in the catalog")]
    UnknownBaseline(usize),
    #[error("phase length must be at least one day")]
    ZeroLengthPhase,
    #[error("a phase of {0} days is longer than allowed")]
    PhaseTooLong(u32),
    #[error("stored history is inconsistent: {0}")]
    MisalignedHistory(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Empty,
    Populated,
}

/// Where a fresh phase takes its starting community from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum PhaseSeed {
    Baseline(usize),
    /// Restart the day axis from the community the last phase ended with.
    Continue,
}

/// Summary of one completed phase run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub start_day: u32,
    pub end_day: u32,
    pub samples_added: usize,
}

#[derive(Debug, Clone, PartialEq, Resource, Serialize, Deserialize)]
#[serde(try_from = "SessionRecord")]
pub struct Session {
    time_axis: Vec<u32>,
    series: Vec<Vec<f64>>,
    cumulative_days: u32,
    current_abundances: Option<AbundanceVector>,
}

/// Unchecked wire form of a [`Session`].
#[derive(Deserialize)]
struct SessionRecord {
    time_axis: Vec<u32>,
    series: Vec<Vec<f64>>,
    cumulative_days: u32,
    current_abundances: Option<AbundanceVector>,
}

impl TryFrom<SessionRecord> for Session {
    type Error = SessionError;

    fn try_from(record: SessionRecord) -> Result<Self, Self::Error> {
        if record.series.len() != SPECIES_COUNT {
            return Err(SessionError::MisalignedHistory("wrong number of species series"));
        }
        if record.series.iter().any(|s| s.len() != record.time_axis.len()) {
            return Err(SessionError::MisalignedHistory("series length differs from time axis"));
        }
        if !record.time_axis.windows(2).all(|w| w[0] < w[1]) {
            return Err(SessionError::MisalignedHistory("time axis is not strictly increasing"));
        }
        if record.current_abundances.is_some() == record.time_axis.is_empty() {
            return Err(SessionError::MisalignedHistory("current community does not match history"));
        }
        Ok(Self {
            time_axis: record.time_axis,
            series: record.series,
            cumulative_days: record.cumulative_days,
            current_abundances: record.current_abundances,
        })
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            time_axis: Vec::new(),
            series: vec![Vec::new(); SPECIES_COUNT],
            cumulative_days: 0,
            current_abundances: None,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.current_abundances.is_some() {
            SessionState::Populated
        } else {
            SessionState::Empty
        }
    }

    pub fn time_axis(&self) -> &[u32] {
        &self.time_axis
    }

    /// Per-species series, each the same length as [`Session::time_axis`].
    pub fn series(&self) -> &[Vec<f64>] {
        &self.series
    }

    pub fn cumulative_days(&self) -> u32 {
        self.cumulative_days
    }

    pub fn current_abundances(&self) -> Option<&AbundanceVector> {
        self.current_abundances.as_ref()
    }

    /// Clears history and runs a phase from day 0, keeping the seed sample.
    pub fn run_fresh_phase<S: AsRef<str>>(
        &mut self,
        seed: PhaseSeed,
        factors: &[S],
        days: u32,
        noise: &mut dyn NoiseSource,
    ) -> Result<PhaseOutcome, SessionError> {
        if days == 0 {
            return Err(SessionError::ZeroLengthPhase);
        }
        let start = match seed {
            PhaseSeed::Baseline(index) => {
                baseline(index)
                    .ok_or(SessionError::UnknownBaseline(index))?
                    .abundances
            }
            PhaseSeed::Continue => *self
                .current_abundances
                .as_ref()
                .ok_or(SessionError::NotPopulated)?,
        };

        let samples = run_phase(&start, factors, days, 0, noise)?;
        self.clear();
        let samples_added = self.extend(&samples);
        self.cumulative_days = days;
        self.current_abundances = samples.last().map(|sample| sample.abundances);
        debug!(?seed, days, samples_added, "fresh phase stored");

        Ok(PhaseOutcome {
            start_day: 0,
            end_day: days,
            samples_added,
        })
    }

    /// Continues from the current community, offsetting days by the elapsed total.
    ///
    /// The seed sample duplicates the previous phase's final state and is skipped.
    pub fn append_phase<S: AsRef<str>>(
        &mut self,
        factors: &[S],
        days: u32,
        noise: &mut dyn NoiseSource,
    ) -> Result<PhaseOutcome, SessionError> {
        if days == 0 {
            return Err(SessionError::ZeroLengthPhase);
        }
        let start = *self
            .current_abundances
            .as_ref()
            .ok_or(SessionError::NotPopulated)?;
        let start_day = self.cumulative_days;
        let end_day = start_day
            .checked_add(days)
            .ok_or(SessionError::PhaseTooLong(days))?;

        let samples = run_phase(&start, factors, days, start_day, noise)?;
        let samples_added = self.extend(&samples[1..]);
        self.cumulative_days = end_day;
        if let Some(last) = samples.last() {
            self.current_abundances = Some(last.abundances);
        }
        debug!(start_day, days, samples_added, "phase appended");

        Ok(PhaseOutcome {
            start_day,
            end_day,
            samples_added,
        })
    }

    /// Returns the session to `Empty` regardless of prior state.
    pub fn reset(&mut self) {
        self.clear();
        self.current_abundances = None;
    }

    fn clear(&mut self) {
        self.time_axis.clear();
        self.series = vec![Vec::new(); SPECIES_COUNT];
        self.cumulative_days = 0;
    }

    fn extend(&mut self, samples: &[PhaseSample]) -> usize {
        for sample in samples {
            self.time_axis.push(sample.day);
            for (series, value) in self.series.iter_mut().zip(sample.abundances.iter()) {
                series.push(*value);
            }
        }
        samples.len()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{BASELINES, ConstantNoise, EntropyNoise};

    fn assert_aligned(session: &Session) {
        assert_eq!(session.series().len(), SPECIES_COUNT);
        for series in session.series() {
            assert_eq!(series.len(), session.time_axis().len());
        }
        assert!(session.time_axis().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn new_session_is_empty() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.time_axis().is_empty());
        assert_eq!(session.cumulative_days(), 0);
        assert!(session.current_abundances().is_none());
    }

    #[test]
    fn default_session_behaves_like_new() {
        let mut a = Session::default();
        let mut b = Session::new();
        a.run_fresh_phase::<&str>(PhaseSeed::Baseline(0), &[], 14, &mut ConstantNoise(1.0))
            .unwrap();
        b.run_fresh_phase::<&str>(PhaseSeed::Baseline(0), &[], 14, &mut ConstantNoise(1.0))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fresh_phase_keeps_seed_and_weekly_samples() {
        let mut session = Session::new();
        let outcome = session
            .run_fresh_phase::<&str>(PhaseSeed::Baseline(0), &[], 180, &mut EntropyNoise::new())
            .unwrap();

        let expected: Vec<u32> = (0..26).map(|week| week * 7).collect();
        assert_eq!(session.time_axis(), expected.as_slice());
        assert_eq!(*session.time_axis().last().unwrap(), 175);
        assert_eq!(outcome.samples_added, 26);
        assert_eq!(session.cumulative_days(), 180);
        assert_eq!(session.series()[0][0], BASELINES[0].abundances[0]);
        assert_aligned(&session);
    }

    #[test]
    fn append_continues_without_duplicating_seed() {
        let mut session = Session::new();
        let mut noise = EntropyNoise::new();
        session
            .run_fresh_phase(PhaseSeed::Baseline(0), &["fiber"], 180, &mut noise)
            .unwrap();
        let before = *session.current_abundances().unwrap();

        let outcome = session.append_phase(&["redmeat"], 180, &mut noise).unwrap();

        assert_eq!(session.cumulative_days(), 360);
        assert_eq!(outcome.start_day, 180);
        assert_eq!(outcome.samples_added, 25);
        assert_eq!(session.time_axis().len(), 26 + 25);
        assert_eq!(session.time_axis()[26], 187);
        assert_eq!(*session.time_axis().last().unwrap(), 355);
        assert_ne!(session.current_abundances(), Some(&before));
        assert_aligned(&session);
    }

    #[test]
    fn append_on_empty_session_is_rejected() {
        let mut session = Session::new();
        let err = session
            .append_phase(&["fiber"], 90, &mut ConstantNoise(1.0))
            .unwrap_err();
        assert_eq!(err, SessionError::NotPopulated);
        assert_eq!(session, Session::new());
    }

    #[test]
    fn short_append_only_advances_day_counter() {
        let mut session = Session::new();
        session
            .run_fresh_phase::<&str>(PhaseSeed::Baseline(2), &[], 30, &mut ConstantNoise(1.0))
            .unwrap();
        let len = session.time_axis().len();
        let outcome = session.append_phase::<&str>(&[], 5, &mut ConstantNoise(1.0)).unwrap();
        assert_eq!(outcome.samples_added, 0);
        assert_eq!(session.time_axis().len(), len);
        assert_eq!(session.cumulative_days(), 35);
    }

    #[test]
    fn invalid_requests_leave_session_untouched() {
        let mut session = Session::new();
        session
            .run_fresh_phase::<&str>(PhaseSeed::Baseline(1), &[], 14, &mut ConstantNoise(1.0))
            .unwrap();
        let snapshot = session.clone();

        assert_eq!(
            session.run_fresh_phase::<&str>(PhaseSeed::Baseline(9), &[], 14, &mut ConstantNoise(1.0)),
            Err(SessionError::UnknownBaseline(9))
        );
        assert_eq!(
            session.append_phase::<&str>(&[], 0, &mut ConstantNoise(1.0)),
            Err(SessionError::ZeroLengthPhase)
        );
        assert_eq!(session, snapshot);
    }

    #[test]
    fn continue_seed_restarts_axis_from_current_community() {
        let mut session = Session::new();
        session
            .run_fresh_phase(PhaseSeed::Baseline(0), &["fiber"], 70, &mut ConstantNoise(1.0))
            .unwrap();
        let current = *session.current_abundances().unwrap();

        session
            .run_fresh_phase::<&str>(PhaseSeed::Continue, &[], 14, &mut ConstantNoise(1.0))
            .unwrap();
        assert_eq!(session.time_axis(), &[0, 7, 14]);
        assert_eq!(session.cumulative_days(), 14);
        for (series, value) in session.series().iter().zip(current.iter()) {
            assert_eq!(series[0], *value);
        }

        session.reset();
        assert_eq!(
            session.run_fresh_phase::<&str>(PhaseSeed::Continue, &[], 14, &mut ConstantNoise(1.0)),
            Err(SessionError::NotPopulated)
        );
    }

    #[test]
    fn reset_matches_a_never_used_session() {
        let mut used = Session::new();
        used.run_fresh_phase(PhaseSeed::Baseline(1), &["soda"], 90, &mut ConstantNoise(1.0))
            .unwrap();
        used.append_phase(&["olive"], 60, &mut ConstantNoise(1.0)).unwrap();
        used.reset();
        assert_eq!(used.state(), SessionState::Empty);
        assert_eq!(used, Session::new());

        let mut fresh = Session::new();
        used.run_fresh_phase(PhaseSeed::Baseline(0), &["fiber"], 49, &mut ConstantNoise(1.0))
            .unwrap();
        fresh
            .run_fresh_phase(PhaseSeed::Baseline(0), &["fiber"], 49, &mut ConstantNoise(1.0))
            .unwrap();
        assert_eq!(used, fresh);
    }

    #[test]
    fn append_past_the_day_range_is_rejected() {
        let mut session = Session::new();
        session
            .run_fresh_phase::<&str>(PhaseSeed::Baseline(0), &[], 14, &mut ConstantNoise(1.0))
            .unwrap();
        let mut json = serde_json::to_value(&session).unwrap();
        json["cumulative_days"] = serde_json::json!(u32::MAX - 3);
        let mut late: Session = serde_json::from_value(json).unwrap();
        let before = late.clone();

        assert_eq!(
            late.append_phase::<&str>(&[], 14, &mut ConstantNoise(1.0)),
            Err(SessionError::PhaseTooLong(14))
        );
        assert_eq!(late, before);
        assert_eq!(
            session.run_fresh_phase::<&str>(PhaseSeed::Baseline(0), &[], u32::MAX, &mut ConstantNoise(1.0)),
            Err(SessionError::PhaseTooLong(u32::MAX))
        );
    }

    #[test]
    fn misaligned_history_does_not_deserialize() {
        let mut session = Session::new();
        session
            .run_fresh_phase::<&str>(PhaseSeed::Baseline(0), &[], 21, &mut ConstantNoise(1.0))
            .unwrap();
        let valid = serde_json::to_value(&session).unwrap();

        let mut short_series = valid.clone();
        short_series["series"][3].as_array_mut().unwrap().pop();
        assert!(serde_json::from_value::<Session>(short_series).is_err());

        let mut missing_species = valid.clone();
        missing_species["series"].as_array_mut().unwrap().pop();
        assert!(serde_json::from_value::<Session>(missing_species).is_err());

        let mut unordered = valid.clone();
        unordered["time_axis"][1] = serde_json::json!(0);
        assert!(serde_json::from_value::<Session>(unordered).is_err());

        let mut orphan = valid.clone();
        orphan["current_abundances"] = serde_json::Value::Null;
        assert!(serde_json::from_value::<Session>(orphan).is_err());

        let restored: Session = serde_json::from_value(valid).unwrap();
        assert_eq!(restored, session);
        let empty: Session = serde_json::from_value(serde_json::to_value(Session::new()).unwrap()).unwrap();
        assert_eq!(empty, Session::new());
    }
}
