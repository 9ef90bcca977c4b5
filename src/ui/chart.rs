//! Monthly distance chart: one point per day with runs, x = day of month.

use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::theme::Theme;
use crate::data::{display_distance, DayRecord};

/// Number of days in the given month (28-31)
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 31,
    }
}

/// Convert a day summary into chart points. Input order is kept, so points
/// arrive with increasing x as long as the summary is ascending.
pub fn chart_points(days: &[DayRecord]) -> Vec<(f64, f64)> {
    days.iter()
        .map(|d| (d.day as f64, d.distance))
        .collect()
}

/// Line chart of the distance run on each day of a month
pub struct MonthChart<'a> {
    days: &'a [DayRecord],
    year: i32,
    month: u32,
    theme: &'a Theme,
}

impl<'a> MonthChart<'a> {
    pub fn new(days: &'a [DayRecord], year: i32, month: u32, theme: &'a Theme) -> Self {
        MonthChart {
            days,
            year,
            month,
            theme,
        }
    }

    fn title(&self) -> String {
        let name = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| format!("{:04}-{:02}", self.year, self.month));
        format!(" Distance per day, {name} ")
    }

    fn block(&self) -> Block<'static> {
        Block::default()
            .title(self.title())
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title_style(self.theme.title_style())
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if self.days.is_empty() {
            self.render_empty(frame, area);
            return;
        }

        let points = chart_points(self.days);
        let x_max = days_in_month(self.year, self.month) as f64;
        let y_max = points
            .iter()
            .map(|(_, y)| *y)
            .fold(0.0_f64, f64::max)
            .max(1.0)
            * 1.1;

        let datasets = vec![
            Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(self.theme.chart_color(0)))
                .data(&points),
            Dataset::default()
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(self.theme.chart_color(1)))
                .data(&points),
        ];

        let x_labels = vec![
            Span::raw("1"),
            Span::raw(format!("{:.0}", (1.0 + x_max) / 2.0)),
            Span::raw(format!("{x_max:.0}")),
        ];
        let y_labels = vec![
            Span::raw("0"),
            Span::raw(display_distance((y_max / 2.0) as i64)),
            Span::raw(display_distance(y_max as i64)),
        ];

        let chart = Chart::new(datasets)
            .block(self.block())
            .x_axis(
                Axis::default()
                    .title(Span::styled("day", Style::default().add_modifier(Modifier::DIM)))
                    .style(self.theme.normal_style())
                    .bounds([1.0, x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(self.theme.normal_style())
                    .bounds([0.0, y_max])
                    .labels(y_labels),
            );

        frame.render_widget(chart, area);
    }

    fn render_empty(&self, frame: &mut Frame, area: Rect) {
        let block = self.block();
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let message = Paragraph::new("No runs this month")
            .style(self.theme.dimmed_style())
            .alignment(Alignment::Center);
        frame.render_widget(message, inner);
    }
}

/// The month `delta` months away from `year`-`month`
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Whether `date` falls in the given month
pub fn in_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}
