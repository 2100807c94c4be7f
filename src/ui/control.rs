use ratatui::{
    prelude::*,
    style::Stylize,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::simulation::{BASELINES, DIETARY_FACTORS, ObserverSnapshot};

use super::{ControlState, factor_hotkey};

/// Renders the control deck: baseline, dietary factors, phase length, and key help.
pub fn render_control_deck(
    frame: &mut Frame,
    area: Rect,
    snapshot: &ObserverSnapshot,
    control: &ControlState,
) {
    let block = Block::default()
        .title("CONTROLS — baseline / diet / phase length")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(2, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(inner);

    let selection = &snapshot.selection;
    let mut baseline_lines = vec![Line::from(Span::styled(
        "Baseline [b]",
        Style::default().fg(Color::White).bold(),
    ))];
    for (index, baseline) in BASELINES.iter().enumerate() {
        let active = index == selection.baseline;
        baseline_lines.push(Line::from(vec![
            Span::raw(if active { "● " } else { "○ " }),
            Span::styled(
                baseline.label,
                if active {
                    Style::default().fg(Color::LightCyan).bold()
                } else {
                    Style::default().fg(Color::Gray)
                },
            ),
        ]));
    }
    baseline_lines.push(Line::from(vec![
        Span::raw("Days [-/+] "),
        Span::styled(
            format!("{} days", selection.days),
            Style::default().fg(Color::Yellow).bold(),
        ),
    ]));
    frame.render_widget(Paragraph::new(baseline_lines), columns[0]);

    let factor_spans: Vec<Line> = DIETARY_FACTORS
        .chunks(5)
        .enumerate()
        .map(|(row, chunk)| {
            let spans: Vec<Span> = chunk
                .iter()
                .enumerate()
                .flat_map(|(col, factor)| {
                    let index = row * 5 + col;
                    let active = selection.factors.iter().any(|f| f == factor.key);
                    let style = if active {
                        Style::default().fg(Color::LightGreen).bold()
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    [
                        Span::styled(
                            format!("[{}]{} ", factor_hotkey(index), if active { "✓" } else { " " }),
                            style,
                        ),
                        Span::styled(format!("{:<15}", factor.label), style),
                    ]
                })
                .collect();
            Line::from(spans)
        })
        .collect();
    let mut diet_lines = vec![Line::from(Span::styled(
        "Dietary factors [1-9, 0]",
        Style::default().fg(Color::White).bold(),
    ))];
    diet_lines.extend(factor_spans);
    if let Some(error) = &snapshot.last_error {
        diet_lines.push(Line::from(Span::styled(
            format!("! {error}"),
            Style::default().fg(Color::LightRed),
        )));
    }
    frame.render_widget(
        Paragraph::new(diet_lines).wrap(Wrap { trim: true }),
        columns[1],
    );

    let mut key_lines = vec![
        Line::from(Span::styled("Keys", Style::default().fg(Color::White).bold())),
        Line::from("Enter  run fresh phase"),
        Line::from("c      fresh from current"),
    ];
    key_lines.push(Line::from(Span::styled(
        "a      append phase",
        if snapshot.can_append() {
            Style::default().fg(Color::LightGreen)
        } else {
            Style::default().fg(Color::DarkGray)
        },
    )));
    key_lines.push(Line::from("x      reset all"));
    key_lines.push(Line::from(format!("Tab    view: {}", control.view.label())));
    key_lines.push(Line::from("q      quit"));
    frame.render_widget(Paragraph::new(key_lines), columns[2]);
}
