//! Theme configuration for the TUI.

use ratatui::style::{Color, Modifier, Style};

use crate::core::GainStatus;

/// Color theme for the application
#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub border: Color,
    pub title: Color,
    pub gain_ok: Color,
    pub gain_partial: Color,
    pub gain_insufficient: Color,
    pub chart_colors: Vec<Color>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            bg: Color::Reset,
            fg: Color::White,
            highlight_bg: Color::Rgb(60, 60, 80),
            highlight_fg: Color::White,
            border: Color::Rgb(100, 100, 120),
            title: Color::Cyan,
            gain_ok: Color::Green,
            gain_partial: Color::Yellow,
            gain_insufficient: Color::Red,
            // Named colors for better terminal compatibility
            chart_colors: vec![
                Color::Red,
                Color::Green,
                Color::Yellow,
                Color::Blue,
                Color::Magenta,
                Color::Cyan,
                Color::LightRed,
                Color::LightGreen,
            ],
        }
    }
}

impl Theme {
    /// Get style for normal text
    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Get style for highlighted/selected items
    pub fn highlight_style(&self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for borders
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Get style for focused panel borders (distinct from normal borders)
    pub fn focused_border_style(&self) -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for titles
    pub fn title_style(&self) -> Style {
        Style::default().fg(self.title).add_modifier(Modifier::BOLD)
    }

    /// Style for a gain row's data-quality status
    pub fn gain_status_style(&self, status: GainStatus) -> Style {
        let color = match status {
            GainStatus::Ok => self.gain_ok,
            GainStatus::PartialWindow => self.gain_partial,
            GainStatus::Insufficient => self.gain_insufficient,
        };
        Style::default().fg(color)
    }

    /// Style for error messages in the status bar
    pub fn error_style(&self) -> Style {
        Style::default()
            .fg(self.gain_insufficient)
            .add_modifier(Modifier::BOLD)
    }

    /// Get a chart color by index (cycles through available colors)
    pub fn chart_color(&self, index: usize) -> Color {
        self.chart_colors[index % self.chart_colors.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_colors_are_distinct() {
        let theme = Theme::default();
        let c0 = theme.chart_color(0);
        let c1 = theme.chart_color(1);
        let c2 = theme.chart_color(2);
        assert_ne!(c0, c1);
        assert_ne!(c1, c2);
        assert_ne!(c0, c2);
    }

    #[test]
    fn test_chart_color_cycles() {
        let theme = Theme::default();
        let len = theme.chart_colors.len();
        assert_eq!(theme.chart_color(0), theme.chart_color(len));
        assert_eq!(theme.chart_color(1), theme.chart_color(len + 1));
    }

    #[test]
    fn test_gain_statuses_have_distinct_colors() {
        let theme = Theme::default();
        let ok = theme.gain_status_style(GainStatus::Ok);
        let partial = theme.gain_status_style(GainStatus::PartialWindow);
        let insufficient = theme.gain_status_style(GainStatus::Insufficient);
        assert_ne!(ok, partial);
        assert_ne!(partial, insufficient);
    }
}
