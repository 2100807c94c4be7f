//! Shared observer snapshot structures exported to the TUI and the API.

use serde::Serialize;

use crate::simulation::{
    BASELINES, DiversitySeries, JournalEntry, PhaseSelection, Session, SessionState, StudioConfig,
    diversity_series,
};

#[derive(Debug, Clone, Serialize)]
pub struct SelectionSnapshot {
    pub baseline: usize,
    pub baseline_label: String,
    pub factors: Vec<String>,
    pub days: u32,
}

impl SelectionSnapshot {
    fn from_selection(selection: &PhaseSelection) -> Self {
        Self {
            baseline: selection.baseline,
            baseline_label: BASELINES
                .get(selection.baseline)
                .map(|b| b.label.to_string())
                .unwrap_or_else(|| format!("#{}", selection.baseline)),
            factors: selection.factors.clone(),
            days: selection.days,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObserverSnapshot {
    pub revision: u64,
    pub state: SessionState,
    pub status_line: String,
    pub last_error: Option<String>,
    pub selection: SelectionSnapshot,
    pub session: Session,
    pub diversity: DiversitySeries,
    pub journal: Vec<JournalEntry>,
}

impl ObserverSnapshot {
    pub fn new() -> Self {
        let config = StudioConfig::default();
        let session = Session::new();
        Self {
            revision: 0,
            state: session.state(),
            status_line: status_line(&session),
            last_error: None,
            selection: SelectionSnapshot::from_selection(&PhaseSelection::new(&config)),
            diversity: DiversitySeries::default(),
            session,
            journal: Vec::new(),
        }
    }

    pub fn update(
        &mut self,
        revision: u64,
        selection: &PhaseSelection,
        session: &Session,
        last_error: Option<String>,
        journal: Vec<JournalEntry>,
    ) {
        self.revision = revision;
        self.state = session.state();
        self.status_line = status_line(session);
        self.last_error = last_error;
        self.selection = SelectionSnapshot::from_selection(selection);
        self.session = session.clone();
        self.diversity = diversity_series(session);
        self.journal = journal;
    }

    /// Append is only offered once a phase has produced a current community.
    pub fn can_append(&self) -> bool {
        self.state == SessionState::Populated
    }
}

impl Default for ObserverSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

pub fn status_line(session: &Session) -> String {
    match session.state() {
        SessionState::Populated => format!(
            "Phase end: day {} — ready to append",
            session.cumulative_days()
        ),
        SessionState::Empty => "Select baseline & dietary factors, then run first phase".to_string(),
    }
}
