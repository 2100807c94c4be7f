mod charts;
mod control;
mod panels;

use crate::simulation::{DIETARY_FACTORS, DietaryFactor, ObserverSnapshot};
use charts::{render_diversity_chart, render_line_chart, render_stacked_chart};
use control::render_control_deck;
use panels::{render_diversity_cards, render_journal, render_readout};
use ratatui::{
    prelude::*,
    style::Stylize,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

#[derive(Debug, Clone, Default)]
pub struct ControlState {
    pub view: ChartView,
    /// Sample index under the cursor; `None` follows the latest sample.
    pub cursor: Option<usize>,
}

impl ControlState {
    pub fn move_cursor(&mut self, delta: i64, samples: usize) {
        if samples == 0 {
            self.cursor = None;
            return;
        }
        let last = samples as i64 - 1;
        let current = self.cursor.map(|c| c as i64).unwrap_or(last);
        self.cursor = Some((current + delta).clamp(0, last) as usize);
    }

    pub fn clear_cursor(&mut self) {
        self.cursor = None;
    }

    /// Index the readout should describe, clamped to the available samples.
    pub fn focus_index(&self, samples: usize) -> Option<usize> {
        if samples == 0 {
            return None;
        }
        Some(self.cursor.unwrap_or(samples - 1).min(samples - 1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartView {
    #[default]
    Line,
    Stacked,
    Diversity,
}

impl ChartView {
    pub fn label(&self) -> &'static str {
        match self {
            ChartView::Line => "Species lines",
            ChartView::Stacked => "Stacked composition",
            ChartView::Diversity => "Diversity indices",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ChartView::Line => ChartView::Stacked,
            ChartView::Stacked => ChartView::Diversity,
            ChartView::Diversity => ChartView::Line,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ChartView::Line => ChartView::Diversity,
            ChartView::Stacked => ChartView::Line,
            ChartView::Diversity => ChartView::Stacked,
        }
    }
}

/// Hotkey for the factor at `index`: `1`..`9`, then `0`.
pub fn factor_hotkey(index: usize) -> char {
    char::from_digit(((index + 1) % 10) as u32, 10).unwrap_or('?')
}

pub fn factor_for_hotkey(key: char) -> Option<&'static DietaryFactor> {
    let digit = key.to_digit(10)? as usize;
    let index = if digit == 0 { 9 } else { digit - 1 };
    DIETARY_FACTORS.get(index)
}

pub fn render(frame: &mut Frame, snapshot: &ObserverSnapshot, control: &ControlState) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(9),
            Constraint::Min(0),
        ])
        .split(frame.size());

    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(" Microbiome Studio ", Style::default().bold()),
            Span::raw(" | "),
            Span::styled(control.view.label(), Style::default().fg(Color::Cyan).bold()),
            Span::raw(" | "),
            Span::styled(
                format!("{} samples", snapshot.session.time_axis().len()),
                Style::default().fg(Color::Gray),
            ),
        ]),
        Line::from(vec![
            Span::styled("Status ", Style::default().fg(Color::LightYellow).bold()),
            Span::raw("→ "),
            Span::styled(&snapshot.status_line, Style::default().fg(Color::White)),
        ]),
    ])
    .block(Block::new().borders(Borders::TOP));
    frame.render_widget(header, main_layout[0]);

    render_control_deck(frame, main_layout[1], snapshot, control);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(main_layout[2]);

    let chart_area = if control.view == ChartView::Diversity {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(content[0]);
        render_diversity_cards(frame, split[0], snapshot);
        split[1]
    } else {
        content[0]
    };

    match control.view {
        ChartView::Line => render_line_chart(frame, chart_area, snapshot, control),
        ChartView::Stacked => render_stacked_chart(frame, chart_area, snapshot, control),
        ChartView::Diversity => render_diversity_chart(frame, chart_area, snapshot, control),
    }

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(14), Constraint::Length(10)])
        .split(content[1]);
    render_readout(frame, side[0], snapshot, control);
    render_journal(frame, side[1], snapshot);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotkeys_cover_every_factor() {
        for (index, factor) in DIETARY_FACTORS.iter().enumerate() {
            let key = factor_hotkey(index);
            assert_eq!(factor_for_hotkey(key).map(|f| f.key), Some(factor.key));
        }
        assert!(factor_for_hotkey('x').is_none());
    }

    #[test]
    fn cursor_is_clamped_to_samples() {
        let mut control = ControlState::default();
        assert_eq!(control.focus_index(0), None);
        assert_eq!(control.focus_index(26), Some(25));

        control.move_cursor(-3, 26);
        assert_eq!(control.cursor, Some(22));
        control.move_cursor(100, 26);
        assert_eq!(control.cursor, Some(25));
        assert_eq!(control.focus_index(10), Some(9));

        control.clear_cursor();
        assert_eq!(control.focus_index(5), Some(4));
    }

    #[test]
    fn views_cycle_both_ways() {
        let view = ChartView::default();
        assert_eq!(view.next().next().next(), view);
        assert_eq!(view.prev(), ChartView::Diversity);
    }
}
