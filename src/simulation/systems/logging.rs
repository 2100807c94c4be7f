//! Colorized phase summaries for quick log scanning.

use bevy_ecs::prelude::*;
use colored::{Color, Colorize};
use tracing::info;

use crate::simulation::{
    BASELINES, JournalEntry, JournalKind, PhaseJournal, SPECIES, Session,
    dietary_factor,
};

fn badge(label: &str, color: Color) -> String {
    format!("[{}]", label).color(color).to_string()
}

fn kind_badge(kind: JournalKind) -> String {
    match kind {
        JournalKind::Fresh => badge("Fresh", Color::BrightGreen),
        JournalKind::Append => badge("Append", Color::BrightCyan),
        JournalKind::Reset => badge("Reset", Color::BrightRed),
    }
}

fn species_color(index: usize) -> Color {
    let (r, g, b) = SPECIES[index].color;
    Color::TrueColor { r, g, b }
}

fn factor_badges(factors: &[String]) -> String {
    if factors.is_empty() {
        return badge("No dietary factors", Color::BrightBlack);
    }
    factors
        .iter()
        .map(|key| {
            let label = dietary_factor(key).map(|f| f.label).unwrap_or(key.as_str());
            badge(label, Color::Yellow)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_entry(entry: &JournalEntry) -> String {
    let kind = kind_badge(entry.kind);
    if entry.kind == JournalKind::Reset {
        return format!(
            "{} {} session cleared",
            kind,
            badge(&format!("#{}", entry.seq), Color::BrightBlack)
        );
    }
    let seed = match (entry.kind, entry.baseline) {
        (_, Some(index)) => badge(
            BASELINES.get(index).map(|b| b.label).unwrap_or("Custom"),
            Color::BrightWhite,
        ),
        (JournalKind::Append, None) => badge("Continues", Color::BrightWhite),
        (_, None) => badge("From current", Color::BrightWhite),
    };
    let days = badge(
        &format!("Day {} → {}", entry.start_day, entry.end_day),
        Color::BrightBlue,
    );
    let diversity = match (entry.shannon, entry.simpson) {
        (Some(h), Some(d)) => format!(
            "H' {} | 1-D {}",
            format!("{h:.3}").color(Color::BrightMagenta),
            format!("{d:.3}").color(Color::BrightGreen)
        ),
        _ => "diversity n/a".color(Color::BrightBlack).to_string(),
    };
    format!(
        "{} {} {} {} {} | {}",
        kind,
        badge(&format!("#{}", entry.seq), Color::BrightBlack),
        seed,
        days,
        factor_badges(&entry.factors),
        diversity
    )
}

fn format_leaders(session: &Session) -> Option<String> {
    let current = session.current_abundances()?;
    let mut ranked: Vec<(usize, f64)> = current.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let leaders = ranked
        .iter()
        .take(3)
        .map(|(index, value)| {
            format!("{} {:.1}%", SPECIES[*index].name, value)
                .color(species_color(*index))
                .to_string()
        })
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("{} {}", badge("Leaders", Color::BrightWhite), leaders))
}

/// Logs journal entries recorded since the previous run.
pub fn phase_logging_system(
    journal: Res<PhaseJournal>,
    session: Res<Session>,
    mut last_logged: Local<u64>,
) {
    if journal.recorded() == *last_logged {
        return;
    }

    let mut lines: Vec<String> = journal
        .since(*last_logged)
        .map(format_entry)
        .collect();
    if let Some(leaders) = format_leaders(&session) {
        lines.push(leaders);
    }
    *last_logged = journal.recorded();

    info!("\n{}", lines.join("\n"));
}
