//! Table and list widgets for the dashboard.

use std::collections::HashSet;

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table},
    Frame,
};

use super::theme::Theme;

/// Repository list panel, with markers for repos selected for comparison
pub struct RepoList<'a> {
    repos: &'a [String],
    selected: usize,
    marked: &'a HashSet<String>,
    theme: &'a Theme,
}

impl<'a> RepoList<'a> {
    pub fn new(
        repos: &'a [String],
        selected: usize,
        marked: &'a HashSet<String>,
        theme: &'a Theme,
    ) -> Self {
        RepoList {
            repos,
            selected,
            marked,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let items: Vec<ListItem> = self
            .repos
            .iter()
            .map(|name| {
                let prefix = if self.marked.contains(name) { "* " } else { "  " };
                ListItem::new(format!("{prefix}{name}"))
            })
            .collect();

        let block = Block::default()
            .title(format!(" Repositories ({}) ", self.repos.len()))
            .borders(Borders::ALL)
            .border_type(if focused {
                BorderType::Double
            } else {
                BorderType::Plain
            })
            .border_style(if focused {
                self.theme.focused_border_style()
            } else {
                self.theme.border_style()
            })
            .title_style(self.theme.title_style());

        let list = List::new(items)
            .block(block)
            .highlight_style(self.theme.highlight_style())
            .highlight_symbol("> ");

        let mut state = ListState::default();
        if !self.repos.is_empty() {
            state.select(Some(self.selected.min(self.repos.len() - 1)));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }
}

/// Generic ranked-rows table used by every leaderboard view
pub struct RankTable<'a> {
    title: String,
    header: &'a [&'a str],
    rows: Vec<Row<'a>>,
    /// Footer note, e.g. skipped-repo counts or partial-window notices
    note: Option<String>,
    theme: &'a Theme,
}

impl<'a> RankTable<'a> {
    pub fn new(
        title: String,
        header: &'a [&'a str],
        rows: Vec<Row<'a>>,
        note: Option<String>,
        theme: &'a Theme,
    ) -> Self {
        RankTable {
            title,
            header,
            rows,
            note,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title_style(self.theme.title_style());

        if self.rows.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let message = Paragraph::new("No data available")
                .style(Style::default().add_modifier(Modifier::DIM))
                .alignment(ratatui::layout::Alignment::Center);
            frame.render_widget(message, inner);
            return;
        }

        let header = Row::new(
            self.header
                .iter()
                .map(|h| Cell::from(*h).style(self.theme.title_style())),
        )
        .bottom_margin(1);

        // First column (rank) stays narrow, second (repo) gets the room
        let mut widths = vec![Constraint::Length(4), Constraint::Min(24)];
        widths.resize(self.header.len(), Constraint::Length(12));

        let mut table = Table::new(self.rows.clone(), widths)
            .header(header)
            .block(block)
            .column_spacing(1);

        if let Some(note) = &self.note {
            table = table.footer(
                Row::new(vec![Line::from(note.clone())])
                    .style(Style::default().add_modifier(Modifier::DIM)),
            );
        }

        frame.render_widget(table, area);
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    /// "cycles: N | last fetch: ..." summary
    summary: String,
    error: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(summary: String, error: Option<&'a str>, theme: &'a Theme) -> Self {
        StatusBar {
            summary,
            error,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let text = match self.error {
            Some(e) => format!("Error: {e}"),
            None => format!("starboard: {} | [h] Help [q] Quit", self.summary),
        };

        let style = if self.error.is_some() {
            self.theme.error_style()
        } else {
            self.theme.normal_style()
        };

        let paragraph = Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::TOP));

        frame.render_widget(paragraph, area);
    }
}
