//! Dashboard state and TUI event loop.

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use tracing::debug;

use crate::data::{today_distance, DayRecord, RecordStore, RunRecord, Stats};
use crate::ui::{
    chart::{in_month, shift_month, MonthChart},
    widgets::{RunList, StatsPanel, StatusBar, TodayPanel},
    HelpOverlay, Theme,
};

/// Dashboard state. Reads everything through the store it was given.
pub struct App<'s> {
    store: &'s RecordStore,
    db_label: String,
    theme: Theme,

    today: NaiveDate,
    year: i32,
    month: u32,

    today_meters: i64,
    stats: Stats,
    runs: Vec<RunRecord>,
    days: Vec<DayRecord>,

    selected_run: usize,
    show_help: bool,
    should_quit: bool,
    error_message: Option<String>,
}

impl<'s> App<'s> {
    pub fn new(
        store: &'s RecordStore,
        db_label: String,
        today: NaiveDate,
        year: i32,
        month: u32,
    ) -> Result<Self> {
        let mut app = App {
            store,
            db_label,
            theme: Theme::default(),
            today,
            year,
            month,
            today_meters: 0,
            stats: Stats::default(),
            runs: Vec::new(),
            days: Vec::new(),
            selected_run: 0,
            show_help: false,
            should_quit: false,
            error_message: None,
        };
        app.refresh()?;
        Ok(app)
    }

    /// Reload every panel from the store
    fn refresh(&mut self) -> Result<()> {
        self.error_message = None;
        self.today_meters = today_distance(self.store, self.today)?;
        self.stats = self.store.query_stats()?;
        self.load_month()
    }

    fn load_month(&mut self) -> Result<()> {
        self.days = self.store.query_monthly_day_summary(self.year, self.month)?;
        self.runs = self
            .store
            .query_all()?
            .into_iter()
            .filter(|r| in_month(r.date, self.year, self.month))
            .collect();

        if self.selected_run >= self.runs.len() {
            self.selected_run = self.runs.len().saturating_sub(1);
        }
        debug!(
            year = self.year,
            month = self.month,
            runs = self.runs.len(),
            days = self.days.len(),
            "loaded month"
        );
        Ok(())
    }

    fn change_month(&mut self, delta: i32) -> Result<()> {
        let (year, month) = shift_month(self.year, self.month, delta);
        self.year = year;
        self.month = month;
        self.selected_run = 0;
        self.load_month()
    }

    /// Set an error message to display (non-fatal)
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    /// Handle keyboard input
    fn handle_input(&mut self, key: KeyCode) -> Result<()> {
        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Ok(());
            }
            KeyCode::Esc => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.should_quit = true;
                }
                return Ok(());
            }
            KeyCode::Char('?') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
                return Ok(());
            }
            _ => {}
        }

        if self.show_help {
            return Ok(());
        }

        match key {
            KeyCode::Char('r') => self.refresh()?,
            KeyCode::Left | KeyCode::Char('h') => self.change_month(-1)?,
            KeyCode::Right | KeyCode::Char('l') => self.change_month(1)?,
            KeyCode::Char('t') => {
                self.year = self.today.year();
                self.month = self.today.month();
                self.selected_run = 0;
                self.load_month()?;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if !self.runs.is_empty() {
                    self.selected_run = (self.selected_run + 1) % self.runs.len();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if !self.runs.is_empty() {
                    self.selected_run = self
                        .selected_run
                        .checked_sub(1)
                        .unwrap_or(self.runs.len() - 1);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(2)])
            .split(size);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(main_chunks[0]);

        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(8),
                Constraint::Min(3),
            ])
            .split(body[0]);

        TodayPanel::new(self.today_meters, &self.theme).render(frame, sidebar[0]);
        StatsPanel::new(&self.stats, &self.theme).render(frame, sidebar[1]);
        RunList::new(&self.runs, self.selected_run, &self.theme).render(frame, sidebar[2]);

        MonthChart::new(&self.days, self.year, self.month, &self.theme).render(frame, body[1]);

        StatusBar::new(&self.db_label, self.error_message.as_deref(), &self.theme)
            .render(frame, main_chunks[1]);

        if self.show_help {
            HelpOverlay::new(&self.theme).render(frame, size);
        }
    }
}

/// Restore terminal to normal state
fn restore_terminal() {
    // Best effort: we may be unwinding from an error already
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Run the dashboard until the user quits
pub fn run(store: &RecordStore, db_label: String, year: Option<i32>, month: Option<u32>) -> Result<()> {
    let today = Local::now().date_naive();
    let year = year.unwrap_or_else(|| today.year());
    let month = month.unwrap_or_else(|| today.month());

    // Load before touching the terminal so errors print normally
    let mut app = App::new(store, db_label, today, year, month)
        .context("Failed to load dashboard data")?;

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        restore_terminal();
        return Err(e).context("Failed to setup terminal");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to create terminal");
        }
    };

    let result = run_main_loop(&mut terminal, &mut app);

    restore_terminal();
    terminal.show_cursor().ok();

    result
}

fn run_main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Err(e) = app.handle_input(key.code) {
                        app.set_error(format!("{e:#}"));
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
