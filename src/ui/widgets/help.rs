//! Help overlay: key bindings, chart legend and column meanings.

use super::throughput_chart::phase_color;
use crate::domain::Phase;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

const KEY_WIDTH: usize = 12;

const DAY_KEYS: &[(&str, &str)] = &[
    ("←/h →/l", "Previous / next day"),
    ("g/Home", "First day"),
    ("G/End", "Last day"),
    ("PgUp/b", "One week back"),
    ("PgDn/f", "One week forward"),
];

const VIEW_KEYS: &[(&str, &str)] = &[
    ("Tab", "Switch between chart and stories"),
    ("c", "Throughput chart and queue table"),
    ("s", "Finished stories"),
    ("↑/k ↓/j", "Select story"),
    ("?", "Toggle this help"),
    ("Esc", "Back to chart, quit from chart"),
    ("q", "Quit"),
];

const TABLE_COLUMNS: &[(&str, &str)] = &[
    ("Cap", "Capacity of the phase on that day"),
    ("Queue", "Stories waiting to enter the phase"),
    ("WIP", "Stories being worked on"),
    ("Done", "Stories that left the phase that day"),
    ("Tasks", "Task-days completed that day"),
    ("Util", "WIP divided by capacity"),
];

/// Scroll position of the help overlay
#[derive(Debug, Default, Clone)]
pub struct HelpViewState {
    pub scroll_offset: usize,
    /// Content length, recorded on render
    pub total_lines: usize,
    /// Inner height, recorded on render
    pub visible_height: usize,
}

impl HelpViewState {
    pub fn new() -> Self {
        Self::default()
    }

    fn max_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.visible_height)
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll_offset = (self.scroll_offset + n).min(self.max_offset());
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.visible_height.saturating_sub(2).max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.visible_height.saturating_sub(2).max(1));
    }
}

/// Help overlay; records its dimensions in the state while rendering
pub struct HelpWidget<'a> {
    state: &'a mut HelpViewState,
}

impl<'a> HelpWidget<'a> {
    pub fn new(state: &'a mut HelpViewState) -> Self {
        Self { state }
    }

    fn heading(title: &str) -> Line<'static> {
        Line::from(Span::styled(
            title.to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
    }

    fn entries(lines: &mut Vec<Line<'static>>, title: &str, entries: &[(&str, &str)]) {
        lines.push(Self::heading(title));
        for (key, description) in entries {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {:width$}", key, width = KEY_WIDTH),
                    Style::default().fg(Color::Green),
                ),
                Span::raw(description.to_string()),
            ]));
        }
        lines.push(Line::from(""));
    }

    fn build_lines() -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(Span::styled(
                "devcyclesim results viewer",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];

        Self::entries(&mut lines, "Days", DAY_KEYS);
        Self::entries(&mut lines, "Views", VIEW_KEYS);

        lines.push(Self::heading("Chart legend"));
        for phase in Phase::ALL {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled("██", Style::default().fg(phase_color(phase))),
                Span::raw(format!(" {}", phase.display_name())),
            ]));
        }
        lines.push(Line::from("  ▲▲ marks the selected day"));
        lines.push(Line::from(""));

        Self::entries(&mut lines, "Queue table", TABLE_COLUMNS);
        lines
    }
}

impl Widget for HelpWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let lines = Self::build_lines();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Help ")
            .title_bottom(" Esc/q: close ");
        let inner = block.inner(area);

        self.state.total_lines = lines.len();
        self.state.visible_height = inner.height as usize;
        self.state.scroll_offset = self.state.scroll_offset.min(self.state.max_offset());

        let offset = u16::try_from(self.state.scroll_offset).unwrap_or(u16::MAX);
        Paragraph::new(lines)
            .block(block)
            .scroll((offset, 0))
            .render(area, buf);

        if self.state.total_lines > self.state.visible_height {
            let mut scrollbar_state = ScrollbarState::new(self.state.max_offset())
                .position(self.state.scroll_offset);
            Scrollbar::new(ScrollbarOrientation::VerticalRight).render(
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                buf,
                &mut scrollbar_state,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_is_clamped() {
        let mut state = HelpViewState {
            scroll_offset: 0,
            total_lines: 50,
            visible_height: 20,
        };

        state.scroll_down(5);
        assert_eq!(state.scroll_offset, 5);
        state.scroll_down(100);
        assert_eq!(state.scroll_offset, 30);
        state.page_up();
        assert_eq!(state.scroll_offset, 12);
        state.scroll_up(100);
        assert_eq!(state.scroll_offset, 0);
    }

    #[test]
    fn test_lines_cover_every_phase() {
        let text: Vec<String> = HelpWidget::build_lines()
            .iter()
            .map(|line| line.to_string())
            .collect();
        for phase in Phase::ALL {
            assert!(text.iter().any(|l| l.contains(phase.display_name())));
        }
        assert!(text.iter().any(|l| l.contains("Util")));
    }

    #[test]
    fn test_render_records_dimensions() {
        let mut state = HelpViewState::new();
        let area = Rect::new(0, 0, 50, 12);
        let mut buf = Buffer::empty(area);
        HelpWidget::new(&mut state).render(area, &mut buf);
        assert_eq!(state.visible_height, 10);
        assert!(state.total_lines > state.visible_height);
    }
}
