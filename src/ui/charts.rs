use ratatui::{
    prelude::*,
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
};

use crate::simulation::{ObserverSnapshot, SPECIES, Session};

use super::ControlState;

const SHANNON_COLOR: Color = Color::Rgb(0xd2, 0xa8, 0xff);
const SIMPSON_COLOR: Color = Color::Rgb(0x7e, 0xe7, 0x87);

pub fn species_color(index: usize) -> Color {
    let (r, g, b) = SPECIES[index].color;
    Color::Rgb(r, g, b)
}

/// `(day, value)` points per species.
pub fn abundance_points(session: &Session) -> Vec<Vec<(f64, f64)>> {
    session
        .series()
        .iter()
        .map(|series| {
            session
                .time_axis()
                .iter()
                .zip(series.iter())
                .map(|(day, value)| (*day as f64, *value))
                .collect()
        })
        .collect()
}

/// Running totals across species, so each line is the upper edge of its band.
pub fn stacked_points(session: &Session) -> Vec<Vec<(f64, f64)>> {
    let mut running = vec![0.0; session.time_axis().len()];
    session
        .series()
        .iter()
        .map(|series| {
            session
                .time_axis()
                .iter()
                .enumerate()
                .map(|(t, day)| {
                    running[t] += series.get(t).copied().unwrap_or(0.0);
                    (*day as f64, running[t])
                })
                .collect()
        })
        .collect()
}

fn x_bounds(session: &Session) -> [f64; 2] {
    let axis = session.time_axis();
    let first = axis.first().copied().unwrap_or(0) as f64;
    let last = axis.last().copied().unwrap_or(0) as f64;
    [first, last.max(first + 1.0)]
}

fn x_axis<'a>(session: &Session) -> Axis<'a> {
    let [low, high] = x_bounds(session);
    let mid = (low + high) / 2.0;
    Axis::default()
        .title("Cumulative Days")
        .style(Style::default().fg(Color::Gray))
        .bounds([low, high])
        .labels(vec![
            Span::raw(format!("{low:.0}")),
            Span::raw(format!("{mid:.0}")),
            Span::raw(format!("{high:.0}")),
        ])
}

fn y_axis<'a>(title: &'a str, high: f64, precision: usize) -> Axis<'a> {
    Axis::default()
        .title(title)
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, high])
        .labels(vec![
            Span::raw(format!("{:.*}", precision, 0.0)),
            Span::raw(format!("{:.*}", precision, high / 2.0)),
            Span::raw(format!("{:.*}", precision, high)),
        ])
}

/// Vertical marker at the focused sample.
fn cursor_points(
    snapshot: &ObserverSnapshot,
    control: &ControlState,
    high: f64,
) -> Option<Vec<(f64, f64)>> {
    let axis = snapshot.session.time_axis();
    let index = control.cursor?;
    let day = *axis.get(index.min(axis.len().checked_sub(1)?))? as f64;
    Some(vec![(day, 0.0), (day, high)])
}

fn render_placeholder(frame: &mut Frame, area: Rect, title: &str) {
    let empty = Paragraph::new("No samples yet — press Enter to run a phase")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(empty, area);
}

fn species_datasets<'a>(points: &'a [Vec<(f64, f64)>]) -> Vec<Dataset<'a>> {
    points
        .iter()
        .enumerate()
        .map(|(index, data)| {
            Dataset::default()
                .name(SPECIES[index].name)
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(species_color(index)))
                .data(data)
        })
        .collect()
}

fn cursor_dataset(points: &[(f64, f64)]) -> Dataset<'_> {
    Dataset::default()
        .marker(symbols::Marker::Dot)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::DarkGray))
        .data(points)
}

pub fn render_line_chart(
    frame: &mut Frame,
    area: Rect,
    snapshot: &ObserverSnapshot,
    control: &ControlState,
) {
    let title = "Relative Abundance (%)";
    if snapshot.session.time_axis().is_empty() {
        render_placeholder(frame, area, title);
        return;
    }
    let points = abundance_points(&snapshot.session);
    let cursor = cursor_points(snapshot, control, 100.0);
    let mut datasets = species_datasets(&points);
    if let Some(cursor) = cursor.as_deref() {
        datasets.push(cursor_dataset(cursor));
    }

    let chart = Chart::new(datasets)
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(x_axis(&snapshot.session))
        .y_axis(y_axis("%", 100.0, 0));
    frame.render_widget(chart, area);
}

pub fn render_stacked_chart(
    frame: &mut Frame,
    area: Rect,
    snapshot: &ObserverSnapshot,
    control: &ControlState,
) {
    let title = "Cumulative Abundance (%)";
    if snapshot.session.time_axis().is_empty() {
        render_placeholder(frame, area, title);
        return;
    }
    let points = stacked_points(&snapshot.session);
    let cursor = cursor_points(snapshot, control, 100.0);
    let mut datasets = species_datasets(&points);
    if let Some(cursor) = cursor.as_deref() {
        datasets.push(cursor_dataset(cursor));
    }

    let chart = Chart::new(datasets)
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(x_axis(&snapshot.session))
        .y_axis(y_axis("% stacked", 100.0, 0));
    frame.render_widget(chart, area);
}

/// Shannon and Simpson live on different scales, so each gets its own panel.
pub fn render_diversity_chart(
    frame: &mut Frame,
    area: Rect,
    snapshot: &ObserverSnapshot,
    control: &ControlState,
) {
    if snapshot.session.time_axis().is_empty() {
        render_placeholder(frame, area, "Diversity");
        return;
    }
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(area);

    let axis = snapshot.session.time_axis();
    let shannon: Vec<(f64, f64)> = axis
        .iter()
        .zip(snapshot.diversity.shannon.iter())
        .map(|(day, h)| (*day as f64, *h))
        .collect();
    let simpson: Vec<(f64, f64)> = axis
        .iter()
        .zip(snapshot.diversity.simpson.iter())
        .map(|(day, d)| (*day as f64, *d))
        .collect();

    let shannon_max = (SPECIES.len() as f64).ln();
    let shannon_cursor = cursor_points(snapshot, control, shannon_max);
    let mut shannon_sets = vec![
        Dataset::default()
            .name("Shannon (H')")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(SHANNON_COLOR))
            .data(&shannon),
    ];
    if let Some(cursor) = shannon_cursor.as_deref() {
        shannon_sets.push(cursor_dataset(cursor));
    }
    let shannon_chart = Chart::new(shannon_sets)
        .block(
            Block::default()
                .title(Span::styled("Shannon (H')", Style::default().fg(SHANNON_COLOR)))
                .borders(Borders::ALL),
        )
        .x_axis(x_axis(&snapshot.session))
        .y_axis(y_axis("H'", shannon_max, 2));
    frame.render_widget(shannon_chart, halves[0]);

    let simpson_cursor = cursor_points(snapshot, control, 1.0);
    let mut simpson_sets = vec![
        Dataset::default()
            .name("Simpson (1-D)")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(SIMPSON_COLOR))
            .data(&simpson),
    ];
    if let Some(cursor) = simpson_cursor.as_deref() {
        simpson_sets.push(cursor_dataset(cursor));
    }
    let simpson_chart = Chart::new(simpson_sets)
        .block(
            Block::default()
                .title(Span::styled("Simpson (1-D)", Style::default().fg(SIMPSON_COLOR)))
                .borders(Borders::ALL),
        )
        .x_axis(x_axis(&snapshot.session))
        .y_axis(y_axis("1-D", 1.0, 2));
    frame.render_widget(simpson_chart, halves[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{ConstantNoise, PhaseSeed};

    #[test]
    fn stacked_top_band_reaches_total() {
        let mut session = Session::new();
        session
            .run_fresh_phase(PhaseSeed::Baseline(0), &["fiber"], 28, &mut ConstantNoise(1.0))
            .unwrap();
        let stacked = stacked_points(&session);
        let top = stacked.last().unwrap();
        assert_eq!(top.len(), session.time_axis().len());
        for (_, total) in top.iter().skip(1) {
            assert!((total - 100.0).abs() < 1e-9);
        }
        for pair in stacked.windows(2) {
            for (lower, upper) in pair[0].iter().zip(pair[1].iter()) {
                assert!(upper.1 >= lower.1);
            }
        }
    }

    #[test]
    fn line_points_follow_time_axis() {
        let mut session = Session::new();
        session
            .run_fresh_phase::<&str>(PhaseSeed::Baseline(2), &[], 14, &mut ConstantNoise(1.0))
            .unwrap();
        let points = abundance_points(&session);
        assert_eq!(points.len(), SPECIES.len());
        assert_eq!(points[0][0], (0.0, 32.0));
        assert_eq!(points[0].iter().map(|p| p.0).collect::<Vec<_>>(), vec![0.0, 7.0, 14.0]);
    }
}
