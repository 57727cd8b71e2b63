//! Main application logic and TUI event loop.

use std::collections::HashSet;
use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    widgets::{Cell, Row, Tabs},
    Terminal,
};

use crate::cli::AppConfig;
use crate::core::{
    build_leaderboard, comparison, timeline, Cohort, GainPeriod, GainStatus, Leaderboard,
    RankKey, WeightProfile,
};
use crate::data::{MetricKind, Storage};
use crate::ui::{
    chart::{ComparisonChart, MetricSelector, TrendChart},
    widgets::{RankTable, RepoList, StatusBar},
    HelpOverlay, Theme,
};

/// Dashboard views, one per tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Leaderboard,
    Today,
    Week,
    Overall,
    Trends,
    Compare,
}

impl View {
    const ALL: [View; 6] = [
        View::Leaderboard,
        View::Today,
        View::Week,
        View::Overall,
        View::Trends,
        View::Compare,
    ];

    fn title(self) -> &'static str {
        match self {
            View::Leaderboard => "Leaderboard",
            View::Today => "Today",
            View::Week => "Week",
            View::Overall => "Overall",
            View::Trends => "Trends",
            View::Compare => "Compare",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&v| v == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Whether the 1-9 metric selector applies to this view
    fn uses_metric(self) -> bool {
        matches!(self, View::Today | View::Week | View::Overall | View::Trends)
    }
}

/// Application state
pub struct App {
    // Configuration
    config: AppConfig,
    theme: Theme,

    // Data
    storage: Storage,
    cohort: Cohort,
    repo_names: Vec<String>,
    last_fetch: Option<DateTime<Utc>>,

    // UI state
    view: View,
    selected_metric: MetricKind,
    selected_repo: usize,
    marked: HashSet<String>,
    show_help: bool,

    // Timing
    last_refresh: Instant,

    // Exit flag
    should_quit: bool,

    // Error message to display (non-fatal)
    error_message: Option<String>,
}

impl App {
    /// Create a new App instance and load the initial cohort
    pub fn new(config: AppConfig) -> Result<Self> {
        let storage = Storage::open(&config.db_path)
            .with_context(|| format!("cannot read the snapshot store at {:?}", config.db_path))?;

        let mut app = App {
            config,
            theme: Theme::default(),
            storage,
            cohort: Cohort::default(),
            repo_names: Vec::new(),
            last_fetch: None,
            view: View::Leaderboard,
            selected_metric: MetricKind::Stars,
            selected_repo: 0,
            marked: HashSet::new(),
            show_help: false,
            last_refresh: Instant::now(),
            should_quit: false,
            error_message: None,
        };
        app.reload_cohort()?;
        Ok(app)
    }

    /// Reload the cohort from the store. The in-memory cohort is the
    /// only cache; staleness is bounded by the refresh interval and the
    /// explicit reload key.
    fn reload_cohort(&mut self) -> Result<()> {
        let snapshots = if self.config.repos.is_empty() {
            self.storage.load_cohort()
        } else {
            self.storage.load_cohort_for(&self.config.repos)
        }
        .context("cannot read the cohort from the snapshot store")?;

        self.cohort = Cohort::from_snapshots(snapshots);
        self.repo_names = self.cohort.repo_names().map(str::to_string).collect();
        self.last_fetch = self.storage.latest_fetch_date().unwrap_or(None);

        // Drop marks for repositories that left the cohort
        let names: HashSet<&str> = self.repo_names.iter().map(String::as_str).collect();
        self.marked.retain(|repo| names.contains(repo.as_str()));

        if self.selected_repo >= self.repo_names.len() {
            self.selected_repo = self.repo_names.len().saturating_sub(1);
        }
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        self.error_message = None;
        self.reload_cohort()?;
        self.last_refresh = Instant::now();
        Ok(())
    }

    /// Set an error message to display (non-fatal)
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    /// Handle keyboard input
    fn handle_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> Result<()> {
        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Ok(());
            }
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
                return Ok(());
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return Ok(());
            }
            KeyCode::Char('r') => {
                self.refresh()?;
                return Ok(());
            }
            KeyCode::Tab => {
                self.view = self.view.next();
                return Ok(());
            }
            KeyCode::BackTab => {
                self.view = self.view.prev();
                return Ok(());
            }
            _ => {}
        }

        if self.show_help {
            return Ok(());
        }

        // Metric selection with number keys
        if let KeyCode::Char(c) = key {
            if let Some(n) = c.to_digit(10) {
                let n = n as usize;
                if n > 0 && n <= MetricKind::ALL.len() {
                    self.selected_metric = MetricKind::ALL[n - 1];
                    return Ok(());
                }
            }
        }

        match key {
            KeyCode::Char('S') => {
                self.marked.clear();
            }
            KeyCode::Char('s') => {
                if let Some(repo) = self.repo_names.get(self.selected_repo) {
                    if !self.marked.remove(repo) {
                        self.marked.insert(repo.clone());
                    }
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if !self.repo_names.is_empty() {
                    self.selected_repo = (self.selected_repo + 1) % self.repo_names.len();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if !self.repo_names.is_empty() {
                    self.selected_repo = self
                        .selected_repo
                        .checked_sub(1)
                        .unwrap_or(self.repo_names.len() - 1);
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Render the UI
    fn render(&self, frame: &mut ratatui::Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Tabs
                Constraint::Min(3),    // Body
                Constraint::Length(1), // Metric selector
                Constraint::Length(2), // Status bar
            ])
            .split(size);

        // Tab bar
        let tabs = Tabs::new(View::ALL.iter().map(|v| v.title()))
            .select(self.view.index())
            .style(self.theme.normal_style())
            .highlight_style(self.theme.highlight_style());
        frame.render_widget(tabs, main_chunks[0]);

        // Body
        match self.view {
            View::Leaderboard => self.render_leaderboard(frame, main_chunks[1]),
            View::Today => self.render_gainers(frame, main_chunks[1], GainPeriod::Daily),
            View::Week => self.render_gainers(frame, main_chunks[1], GainPeriod::Weekly),
            View::Overall => self.render_gainers(frame, main_chunks[1], GainPeriod::Overall),
            View::Trends => self.render_trends(frame, main_chunks[1]),
            View::Compare => self.render_compare(frame, main_chunks[1]),
        }

        // Metric selector, on the views driven by it
        if self.view.uses_metric() {
            let selector = MetricSelector::new(self.selected_metric, &self.theme);
            selector.render(frame, main_chunks[2]);
        }

        // Status bar
        let summary = format!(
            "{} repos | {} cycles | last fetch {}",
            self.cohort.repo_count(),
            self.cohort.max_cycles(),
            self.last_fetch
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string()),
        );
        let status = StatusBar::new(summary, self.error_message.as_deref(), &self.theme);
        status.render(frame, main_chunks[3]);

        if self.show_help {
            let help = HelpOverlay::new(&self.theme);
            help.render(frame, size);
        }
    }

    /// Composite-score leaderboard with supporting metric columns
    fn render_leaderboard(&self, frame: &mut ratatui::Frame, area: ratatui::layout::Rect) {
        let board = build_leaderboard(
            &self.cohort,
            &RankKey::Composite(WeightProfile::default()),
            self.config.top_n,
        );

        let header = ["#", "Repository", "Score", "Stars", "Forks", "Contribs", "Closed PRs"];
        let rows: Vec<Row> = board
            .entries
            .iter()
            .map(|entry| {
                let latest = self.cohort.latest(&entry.repo_name);
                let col = |kind: MetricKind| {
                    latest
                        .and_then(|s| s.values.get(kind))
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "-".to_string())
                };
                Row::new(vec![
                    Cell::from(entry.rank.to_string()),
                    Cell::from(entry.repo_name.clone()),
                    Cell::from(format!("{:.3}", entry.value)),
                    Cell::from(col(MetricKind::Stars)),
                    Cell::from(col(MetricKind::Forks)),
                    Cell::from(col(MetricKind::Contributors)),
                    Cell::from(col(MetricKind::ClosedPrs)),
                ])
            })
            .collect();

        let table = RankTable::new(
            format!("Composite leaderboard (top {})", self.config.top_n),
            &header,
            rows,
            None,
            &self.theme,
        );
        table.render(frame, area);
    }

    /// Top-5 gainer table for the selected metric and a period
    fn render_gainers(&self, frame: &mut ratatui::Frame, area: ratatui::layout::Rect, period: GainPeriod) {
        let board = build_leaderboard(
            &self.cohort,
            &RankKey::Gain(self.selected_metric, period),
            5,
        );

        let header = ["#", "Repository", "Latest", "Base", "Gain", "Score"];
        let rows: Vec<Row> = board
            .entries
            .iter()
            .map(|entry| {
                let fmt = |v: Option<u64>| {
                    v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
                };
                let gain = entry.value as i64;
                Row::new(vec![
                    Cell::from(entry.rank.to_string()),
                    Cell::from(entry.repo_name.clone()),
                    Cell::from(fmt(entry.latest)),
                    Cell::from(fmt(entry.reference)),
                    Cell::from(format!("{gain:+}"))
                        .style(self.theme.gain_status_style(entry.status)),
                    Cell::from(
                        entry
                            .synthetic
                            .map(|s| format!("{s:.2}"))
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                ])
            })
            .collect();

        let table = RankTable::new(
            format!(
                "Top 5 gainers {}: {}",
                period.label(),
                self.selected_metric.display_name()
            ),
            &header,
            rows,
            gain_note(&board, period),
            &self.theme,
        );
        table.render(frame, area);
    }

    /// Repository list plus the selected repository's trend chart
    fn render_trends(&self, frame: &mut ratatui::Frame, area: ratatui::layout::Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(40)])
            .split(area);

        let repo_list = RepoList::new(&self.repo_names, self.selected_repo, &self.marked, &self.theme);
        repo_list.render(frame, chunks[0], true);

        let tl = self
            .repo_names
            .get(self.selected_repo)
            .and_then(|repo| timeline(&self.cohort, repo));
        let chart = TrendChart::new(tl.as_ref(), self.selected_metric, &self.theme);
        chart.render(frame, chunks[1], false);
    }

    /// Repository list plus the normalized comparison of marked repos
    fn render_compare(&self, frame: &mut ratatui::Frame, area: ratatui::layout::Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(40)])
            .split(area);

        let repo_list = RepoList::new(&self.repo_names, self.selected_repo, &self.marked, &self.theme);
        repo_list.render(frame, chunks[0], true);

        let mut requested: Vec<String> = self.marked.iter().cloned().collect();
        requested.sort();
        let cmp = comparison(&self.cohort, &requested);
        let chart = ComparisonChart::new(&cmp, &self.theme);
        chart.render(frame, chunks[1]);
    }
}

/// Footer note for a gainer table: skipped repositories and, for the
/// weekly view, whether the window is still shorter than 7 cycles.
fn gain_note(board: &Leaderboard, period: GainPeriod) -> Option<String> {
    let mut parts = Vec::new();
    if board.skipped > 0 {
        parts.push(format!(
            "{} repositories lack enough data",
            board.skipped
        ));
    }
    if period == GainPeriod::Weekly
        && board
            .entries
            .iter()
            .any(|e| e.status == GainStatus::PartialWindow)
    {
        parts.push("full week not yet available (partial window)".to_string());
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

/// Restore terminal to normal state
fn restore_terminal() {
    // Best effort cleanup - ignore errors since we may be in a panic
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

/// Run the TUI application
pub fn run(config: AppConfig) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
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

    // Create app - if this fails, restore terminal first
    let mut app = match App::new(config) {
        Ok(a) => a,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to initialize application");
        }
    };
    let tick_rate = Duration::from_secs(app.config.refresh_interval_secs.max(1));

    // Main loop - wrap in a closure to ensure cleanup
    let result = run_main_loop(&mut terminal, &mut app, tick_rate);

    // Always restore terminal, regardless of result
    restore_terminal();
    terminal.show_cursor().ok();

    result
}

/// Main application loop
fn run_main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        // Time-boxed cohort expiry (ignore refresh errors, just continue)
        if app.last_refresh.elapsed() >= tick_rate {
            if let Err(e) = app.refresh() {
                app.set_error(format!("Refresh error: {e}"));
            }
        }

        // Handle input with timeout
        let timeout = tick_rate.saturating_sub(app.last_refresh.elapsed());
        if event::poll(timeout.min(Duration::from_millis(100)))? {
            if let Event::Key(key) = event::read()? {
                if let Err(e) = app.handle_input(key.code, key.modifiers) {
                    app.set_error(format!("Input error: {e}"));
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_cycle_is_closed() {
        let mut view = View::Leaderboard;
        for _ in 0..View::ALL.len() {
            view = view.next();
        }
        assert_eq!(view, View::Leaderboard);
        assert_eq!(View::Leaderboard.prev(), View::Compare);
        assert_eq!(View::Compare.next(), View::Leaderboard);
    }

    #[test]
    fn test_metric_selector_applies_to_gain_and_trend_views() {
        assert!(View::Today.uses_metric());
        assert!(View::Week.uses_metric());
        assert!(View::Overall.uses_metric());
        assert!(View::Trends.uses_metric());
        assert!(!View::Leaderboard.uses_metric());
        assert!(!View::Compare.uses_metric());
    }
}
