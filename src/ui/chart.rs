//! Chart widgets: metric trend lines and normalized comparison bars.

use chrono::DateTime;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::core::{Comparison, Timeline};
use crate::data::MetricKind;

use super::theme::Theme;

/// Line chart of one repository's history for one metric.
///
/// X is the fetch timestamp; a single-snapshot history renders as a
/// single point rather than an error.
pub struct TrendChart<'a> {
    timeline: Option<&'a Timeline>,
    metric: MetricKind,
    theme: &'a Theme,
}

impl<'a> TrendChart<'a> {
    pub fn new(timeline: Option<&'a Timeline>, metric: MetricKind, theme: &'a Theme) -> Self {
        TrendChart {
            timeline,
            metric,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let title = match self.timeline {
            Some(tl) => format!("{}: {}", tl.repo_name, self.metric.display_name()),
            None => self.metric.display_name().to_string(),
        };

        let points: Vec<(f64, f64)> = self
            .timeline
            .map(|tl| {
                tl.series[self.metric.index()]
                    .1
                    .iter()
                    .map(|&(date, value)| (date.timestamp() as f64, value as f64))
                    .collect()
            })
            .unwrap_or_default();

        if points.is_empty() {
            self.render_empty(frame, area, &title, focused);
            return;
        }

        let mut x_min = f64::MAX;
        let mut x_max = f64::MIN;
        let mut y_min = f64::MAX;
        let mut y_max = f64::MIN;
        for &(x, y) in &points {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        // Degenerate bounds (single point, flat series) still need a span
        if x_min >= x_max {
            x_max = x_min + 1.0;
        }
        if y_min >= y_max {
            y_max = y_min + 1.0;
        }
        let y_range = y_max - y_min;
        y_min -= y_range * 0.05;
        y_max += y_range * 0.05;

        let marker = if points.len() == 1 {
            Marker::Dot
        } else {
            Marker::Braille
        };
        let dataset = Dataset::default()
            .marker(marker)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(self.theme.chart_color(self.metric.index())))
            .data(&points);

        let x_labels = vec![
            Span::raw(format_date(x_min)),
            Span::raw(format_date((x_min + x_max) / 2.0)),
            Span::raw(format_date(x_max)),
        ];
        let y_labels = vec![
            Span::raw(format_value(y_min)),
            Span::raw(format_value((y_min + y_max) / 2.0)),
            Span::raw(format_value(y_max)),
        ];

        let border_style = if focused {
            self.theme.focused_border_style()
        } else {
            self.theme.border_style()
        };

        let chart = Chart::new(vec![dataset])
            .block(
                Block::default()
                    .title(format!(" {title} "))
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title_style(self.theme.title_style()),
            )
            .x_axis(
                Axis::default()
                    .title(Span::styled(
                        "date",
                        Style::default().add_modifier(Modifier::DIM),
                    ))
                    .style(self.theme.normal_style())
                    .bounds([x_min, x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(self.theme.normal_style())
                    .bounds([y_min, y_max])
                    .labels(y_labels),
            );

        frame.render_widget(chart, area);
    }

    fn render_empty(&self, frame: &mut Frame, area: Rect, title: &str, focused: bool) {
        let border_style = if focused {
            self.theme.focused_border_style()
        } else {
            self.theme.border_style()
        };
        let block = Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(border_style)
            .title_style(self.theme.title_style());

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let message = Paragraph::new("No data available")
            .style(Style::default().add_modifier(Modifier::DIM))
            .alignment(ratatui::layout::Alignment::Center);
        frame.render_widget(message, inner);
    }
}

/// Grouped bar chart juxtaposing marked repositories, one group per
/// metric, bars scaled to the cohort maximum (0..100).
pub struct ComparisonChart<'a> {
    comparison: &'a Comparison,
    theme: &'a Theme,
}

impl<'a> ComparisonChart<'a> {
    pub fn new(comparison: &'a Comparison, theme: &'a Theme) -> Self {
        ComparisonChart { comparison, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut title = " Latest metrics, % of cohort maximum ".to_string();
        if self.comparison.skipped > 0 {
            title = format!(
                " Latest metrics, % of cohort maximum ({} unknown skipped) ",
                self.comparison.skipped
            );
        }

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title_style(self.theme.title_style());

        if self.comparison.rows.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let message =
                Paragraph::new("Mark repositories with [s] on the Trends tab to compare them")
                    .style(Style::default().add_modifier(Modifier::DIM))
                    .alignment(ratatui::layout::Alignment::Center);
            frame.render_widget(message, inner);
            return;
        }

        let mut chart = BarChart::default()
            .block(block)
            .bar_width(3)
            .bar_gap(1)
            .group_gap(2)
            .max(100);

        for metric in MetricKind::ALL {
            let bars: Vec<Bar> = self
                .comparison
                .rows
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    let value = (row.normalized[metric.index()] * 100.0).round() as u64;
                    Bar::default()
                        .value(value)
                        .style(Style::default().fg(self.theme.chart_color(i)))
                })
                .collect();
            chart = chart.data(
                BarGroup::default()
                    .label(Line::from(metric.label()))
                    .bars(&bars),
            );
        }

        frame.render_widget(chart, area);
    }
}

/// Metric selector bar: [1] stars  [2] forks  ...
pub struct MetricSelector<'a> {
    selected: MetricKind,
    theme: &'a Theme,
}

impl<'a> MetricSelector<'a> {
    pub fn new(selected: MetricKind, theme: &'a Theme) -> Self {
        MetricSelector { selected, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let spans: Vec<Span> = MetricKind::ALL
            .into_iter()
            .enumerate()
            .flat_map(|(i, metric)| {
                let style = if metric == self.selected {
                    self.theme.highlight_style()
                } else {
                    self.theme.normal_style()
                };
                vec![
                    Span::styled(
                        format!("[{}] ", i + 1),
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                    Span::styled(format!("{}  ", metric.label()), style),
                ]
            })
            .collect();

        let paragraph = Paragraph::new(Line::from(spans)).style(self.theme.normal_style());
        frame.render_widget(paragraph, area);
    }
}

/// Format an epoch-seconds axis position as a calendar date
fn format_date(epoch: f64) -> String {
    DateTime::from_timestamp(epoch as i64, 0)
        .map(|dt| dt.format("%m-%d").to_string())
        .unwrap_or_default()
}

/// Format a value for display on axis labels
fn format_value(value: f64) -> String {
    if value.abs() >= 1000.0 {
        format!("{value:.2e}")
    } else if value.abs() >= 1.0 || value == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
