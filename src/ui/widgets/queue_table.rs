//! Per-phase queue table for one simulated day.

use super::throughput_chart::phase_color;
use crate::domain::DayStatistic;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Row, Table},
};

/// Input queue, WIP and completions of every phase on a single day
pub struct QueueTableWidget<'a> {
    day: &'a DayStatistic,
}

impl<'a> QueueTableWidget<'a> {
    pub fn new(day: &'a DayStatistic) -> Self {
        Self { day }
    }

    fn title(&self) -> String {
        format!(
            " Day {} | backlog {} | finished {} ",
            self.day.day, self.day.backlog_count, self.day.finished_count
        )
    }

    fn build_rows(&self) -> Vec<Row<'a>> {
        self.day
            .steps
            .iter()
            .map(|step| {
                let utilization = step
                    .utilization()
                    .map(|u| format!("{:.0}%", u * 100.0))
                    .unwrap_or_else(|| "-".to_string());
                Row::new(vec![
                    step.phase.display_name().to_string(),
                    step.capacity.to_string(),
                    step.input_queue_count.to_string(),
                    step.active_count.to_string(),
                    step.done_today.to_string(),
                    step.tasks_completed_today.to_string(),
                    utilization,
                ])
                .style(Style::default().fg(phase_color(step.phase)))
            })
            .collect()
    }
}

impl Widget for QueueTableWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let header = Row::new(vec!["Phase", "Cap", "Queue", "WIP", "Done", "Tasks", "Util"])
            .style(Style::default().add_modifier(Modifier::BOLD))
            .bottom_margin(1);

        let widths = [
            Constraint::Length(14),
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Length(6),
        ];

        let table = Table::new(self.build_rows(), widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(self.title()));

        Widget::render(table, area, buf);
    }
}
