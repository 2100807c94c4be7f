use ratatui::{
    prelude::*,
    style::Stylize,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use crate::simulation::{
    DiversitySample, JournalKind, ObserverSnapshot, SPECIES, diversity::snapshot_at,
};

use super::charts::species_color;
use super::{ChartView, ControlState};

const SHANNON_COLOR: Color = Color::Rgb(0xd2, 0xa8, 0xff);
const SIMPSON_COLOR: Color = Color::Rgb(0x7e, 0xe7, 0x87);

/// Latest Shannon/Simpson values, or a dash before the first phase.
pub fn render_diversity_cards(frame: &mut Frame, area: Rect, snapshot: &ObserverSnapshot) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(area);

    let latest = snapshot.diversity.latest();
    let shannon = latest
        .map(|s| format!("{:.3}", s.shannon))
        .unwrap_or_else(|| "\u{2014}".to_string());
    let simpson = latest
        .map(|s| format!("{:.3}", s.simpson))
        .unwrap_or_else(|| "\u{2014}".to_string());

    let shannon_card = Paragraph::new(Line::from(Span::styled(
        shannon,
        Style::default().fg(SHANNON_COLOR).bold(),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().title("Shannon H'").borders(Borders::ALL));
    frame.render_widget(shannon_card, cards[0]);

    let simpson_card = Paragraph::new(Line::from(Span::styled(
        simpson,
        Style::default().fg(SIMPSON_COLOR).bold(),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().title("Simpson 1-D").borders(Borders::ALL));
    frame.render_widget(simpson_card, cards[1]);
}

/// Per-sample readout: species ranked by abundance, then both indices.
pub fn render_readout(
    frame: &mut Frame,
    area: Rect,
    snapshot: &ObserverSnapshot,
    control: &ControlState,
) {
    let block = Block::default()
        .title("Readout — ←/→ move, Esc follow latest")
        .borders(Borders::ALL);

    let samples = snapshot.session.time_axis().len();
    let Some(index) = control.focus_index(samples) else {
        let legend: Vec<Line> = SPECIES
            .iter()
            .enumerate()
            .map(|(i, species)| {
                Line::from(vec![
                    Span::styled("■ ", Style::default().fg(species_color(i))),
                    Span::raw(species.name),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(legend).block(block), area);
        return;
    };

    let day = snapshot.session.time_axis()[index];
    let abundances = snapshot_at(&snapshot.session, index);
    let sample = DiversitySample::of(&abundances);

    let mut lines = vec![Line::from(Span::styled(
        format!("Day {day}"),
        Style::default().fg(Color::White).bold(),
    ))];

    let precision = if control.view == ChartView::Diversity {
        4
    } else {
        let mut ranked: Vec<(usize, f64)> = abundances.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        for (i, value) in ranked {
            lines.push(Line::from(vec![
                Span::styled("■ ", Style::default().fg(species_color(i))),
                Span::raw(format!("{:<32}", SPECIES[i].name)),
                Span::styled(format!("{value:>5.1}%"), Style::default().fg(Color::White)),
            ]));
        }
        lines.push(Line::from(Span::styled(
            "─".repeat(20),
            Style::default().fg(Color::DarkGray),
        )));
        3
    };

    lines.push(Line::from(vec![
        Span::styled("■ ", Style::default().fg(SHANNON_COLOR)),
        Span::raw("Shannon H'  "),
        Span::styled(
            format!("{:.*}", precision, sample.shannon),
            Style::default().fg(SHANNON_COLOR),
        ),
    ]));
    lines.push(Line::from(vec![
        Span::styled("■ ", Style::default().fg(SIMPSON_COLOR)),
        Span::raw("Simpson 1-D "),
        Span::styled(
            format!("{:.*}", precision, sample.simpson),
            Style::default().fg(SIMPSON_COLOR),
        ),
    ]));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn render_journal(frame: &mut Frame, area: Rect, snapshot: &ObserverSnapshot) {
    let header = Row::new(["#", "Phase", "Days", "H'", "1-D"].map(|h| {
        Cell::from(h).style(Style::default().fg(Color::White).bold())
    }));

    let rows: Vec<Row> = snapshot
        .journal
        .iter()
        .rev()
        .map(|entry| {
            let (label, color) = match entry.kind {
                JournalKind::Fresh => ("Fresh", Color::LightGreen),
                JournalKind::Append => ("Append", Color::LightCyan),
                JournalKind::Reset => ("Reset", Color::LightRed),
            };
            let fmt = |value: Option<f64>| value.map(|v| format!("{v:.3}")).unwrap_or_default();
            Row::new(vec![
                Cell::from(entry.seq.to_string()),
                Cell::from(label).style(Style::default().fg(color)),
                Cell::from(format!("{}–{}", entry.start_day, entry.end_day)),
                Cell::from(fmt(entry.shannon)),
                Cell::from(fmt(entry.simpson)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(7),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(Block::default().title("Phase Journal").borders(Borders::ALL));
    frame.render_widget(table, area);
}
