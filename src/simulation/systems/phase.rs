use bevy_ecs::prelude::*;
use tracing::warn;

use crate::simulation::{
    BASELINES, CommandQueue, JournalEntry, JournalKind, PhaseJournal, PhaseOutcome, PhaseSeed,
    PhaseSelection, Session, SessionError, SessionState, StudioCommand, StudioConfig, StudioNoise,
    StudioStatus, diversity::DiversitySample,
};

/// Drains queued commands and applies them to the selection and session, in order.
pub fn command_system(
    config: Res<StudioConfig>,
    mut queue: ResMut<CommandQueue>,
    mut selection: ResMut<PhaseSelection>,
    mut session: ResMut<Session>,
    mut noise: ResMut<StudioNoise>,
    mut journal: ResMut<PhaseJournal>,
    mut status: ResMut<StudioStatus>,
) {
    while let Some(command) = queue.pop() {
        let result = apply_command(
            command,
            &config,
            &mut selection,
            &mut session,
            &mut noise,
            &mut journal,
        );
        status.commands_processed += 1;
        match result {
            Ok(()) => status.last_error = None,
            Err(err) => {
                warn!(error = %err, "command rejected");
                status.last_error = Some(err.to_string());
            }
        }
    }
}

fn apply_command(
    command: StudioCommand,
    config: &StudioConfig,
    selection: &mut PhaseSelection,
    session: &mut Session,
    noise: &mut StudioNoise,
    journal: &mut PhaseJournal,
) -> Result<(), SessionError> {
    match command {
        StudioCommand::SelectBaseline { index } => {
            if index >= BASELINES.len() {
                return Err(SessionError::UnknownBaseline(index));
            }
            selection.baseline = index;
        }
        StudioCommand::CycleBaseline => selection.cycle_baseline(),
        StudioCommand::ToggleFactor { key } => selection.toggle_factor(&key),
        StudioCommand::AdjustDays { steps } => selection.adjust_days(steps, config),
        StudioCommand::SetDays { days } => {
            check_days(days, config)?;
            selection.days = days;
        }
        StudioCommand::RunFresh => {
            let seed = PhaseSeed::Baseline(selection.baseline);
            run_fresh(seed, selection, session, noise, journal)?;
        }
        StudioCommand::RunContinued => {
            run_fresh(PhaseSeed::Continue, selection, session, noise, journal)?;
        }
        StudioCommand::Append => run_append(selection, session, noise, journal)?,
        StudioCommand::Submit { request } => {
            if request.baseline >= BASELINES.len() {
                return Err(SessionError::UnknownBaseline(request.baseline));
            }
            check_days(request.days, config)?;
            selection.baseline = request.baseline;
            selection.set_factors(&request.factors);
            selection.days = request.days;
            let seed = PhaseSeed::Baseline(selection.baseline);
            run_fresh(seed, selection, session, noise, journal)?;
        }
        StudioCommand::SubmitAppend { request } => {
            check_days(request.days, config)?;
            if session.state() == SessionState::Empty {
                return Err(SessionError::NotPopulated);
            }
            selection.set_factors(&request.factors);
            selection.days = request.days;
            run_append(selection, session, noise, journal)?;
        }
        StudioCommand::Reset => {
            session.reset();
            *selection = PhaseSelection::new(config);
            journal.push(JournalEntry {
                seq: 0,
                kind: JournalKind::Reset,
                baseline: None,
                start_day: 0,
                end_day: 0,
                factors: Vec::new(),
                shannon: None,
                simpson: None,
            });
        }
    }
    Ok(())
}

/// Phase lengths accepted from commands: `1..=max_days`.
fn check_days(days: u32, config: &StudioConfig) -> Result<(), SessionError> {
    if days == 0 {
        return Err(SessionError::ZeroLengthPhase);
    }
    if days > config.max_days {
        return Err(SessionError::PhaseTooLong(days));
    }
    Ok(())
}

fn run_fresh(
    seed: PhaseSeed,
    selection: &PhaseSelection,
    session: &mut Session,
    noise: &mut StudioNoise,
    journal: &mut PhaseJournal,
) -> Result<(), SessionError> {
    let outcome = session.run_fresh_phase(seed, &selection.factors, selection.days, &mut *noise.0)?;
    let baseline = match seed {
        PhaseSeed::Baseline(index) => Some(index),
        PhaseSeed::Continue => None,
    };
    record(JournalKind::Fresh, baseline, outcome, selection, session, journal);
    Ok(())
}

fn run_append(
    selection: &PhaseSelection,
    session: &mut Session,
    noise: &mut StudioNoise,
    journal: &mut PhaseJournal,
) -> Result<(), SessionError> {
    let outcome = session.append_phase(&selection.factors, selection.days, &mut *noise.0)?;
    record(JournalKind::Append, None, outcome, selection, session, journal);
    Ok(())
}

fn record(
    kind: JournalKind,
    baseline: Option<usize>,
    outcome: PhaseOutcome,
    selection: &PhaseSelection,
    session: &Session,
    journal: &mut PhaseJournal,
) {
    let latest = session.current_abundances().map(|v| DiversitySample::of(v.as_slice()));
    journal.push(JournalEntry {
        seq: 0,
        kind,
        baseline,
        start_day: outcome.start_day,
        end_day: outcome.end_day,
        factors: selection.factors.clone(),
        shannon: latest.map(|s| s.shannon),
        simpson: latest.map(|s| s.simpson),
    });
}
