//! Panels for the runlog dashboard.

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::theme::Theme;
use crate::commands::format_duration;
use crate::data::{display_distance, RunRecord, Stats};

fn panel<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title_style(theme.title_style())
}

/// Today's distance, switching to kilometers past 1000 m
pub struct TodayPanel<'a> {
    meters: i64,
    theme: &'a Theme,
}

impl<'a> TodayPanel<'a> {
    pub fn new(meters: i64, theme: &'a Theme) -> Self {
        TodayPanel { meters, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                display_distance(self.meters),
                self.theme.figure_style(),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(panel(" Today ", self.theme))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }
}

/// Personal bests and totals
pub struct StatsPanel<'a> {
    stats: &'a Stats,
    theme: &'a Theme,
}

impl<'a> StatsPanel<'a> {
    pub fn new(stats: &'a Stats, theme: &'a Theme) -> Self {
        StatsPanel { stats, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let rows = [
            ("Best distance", display_distance(self.stats.best_distance.trunc() as i64)),
            ("Best speed", format!("{:.2} m/s", self.stats.best_speed)),
            ("Longest run", format_duration(self.stats.best_duration)),
            ("Total distance", display_distance(self.stats.total_distance)),
            ("Runs", self.stats.total_runs.to_string()),
            ("Running days", self.stats.running_days.to_string()),
        ];

        let lines: Vec<Line> = rows
            .into_iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!("{label:<15}"), self.theme.dimmed_style()),
                    Span::styled(value, self.theme.normal_style()),
                ])
            })
            .collect();

        let paragraph = Paragraph::new(lines).block(panel(" Records ", self.theme));
        frame.render_widget(paragraph, area);
    }
}

/// Runs in the displayed month, newest first
pub struct RunList<'a> {
    runs: &'a [RunRecord],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> RunList<'a> {
    pub fn new(runs: &'a [RunRecord], selected: usize, theme: &'a Theme) -> Self {
        RunList {
            runs,
            selected,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .runs
            .iter()
            .map(|r| {
                ListItem::new(format!(
                    "{}  {:>9}  {}",
                    r.start_time.format("%d %H:%M"),
                    display_distance(r.distance.trunc() as i64),
                    format_duration(r.duration)
                ))
            })
            .collect();

        let title = format!(" Runs ({}) ", self.runs.len());
        let list = List::new(items)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style())
                    .title_style(self.theme.title_style()),
            )
            .highlight_style(self.theme.highlight_style())
            .highlight_symbol("> ");

        let mut state = ListState::default();
        if !self.runs.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    db_path: &'a str,
    error: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(db_path: &'a str, error: Option<&'a str>, theme: &'a Theme) -> Self {
        StatusBar {
            db_path,
            error,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let line = match self.error {
            Some(e) => Line::from(Span::styled(format!("Error: {e}"), self.theme.error_style())),
            None => Line::from(format!(
                "runlog: {} | [←/→] Month [r] Refresh [?] Help [q] Quit",
                self.db_path
            )),
        };

        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::TOP));
        frame.render_widget(paragraph, area);
    }
}
