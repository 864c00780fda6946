//! Daily throughput: stacked bars of completed tasks per phase, plus
//! cumulative and remaining task lines.

use crate::domain::{DayStatistic, Phase};
use ratatui::{
    prelude::*,
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
};
use std::ops::Range;

/// Columns taken by one day: two bar cells and a gap
const SLOT_WIDTH: u16 = 3;
const BAR_WIDTH: u16 = 2;

/// Color used for a phase across the viewer
pub fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Spec => Color::Cyan,
        Phase::Dev => Color::Blue,
        Phase::Test => Color::Yellow,
        Phase::Rollout => Color::Green,
    }
}

/// Split `height` rows among the phases of one day, scaled so that `max`
/// tasks fill the full height. Rounds on the running total so segments
/// never overshoot the bar.
pub fn stack_heights(counts: [usize; 4], max: usize, height: u16) -> [u16; 4] {
    let mut heights = [0u16; 4];
    if max == 0 {
        return heights;
    }

    let height = height as usize;
    let mut cumulative = 0;
    let mut drawn = 0;
    for (i, count) in counts.iter().enumerate() {
        cumulative += count;
        let top = ((cumulative * height + max / 2) / max).min(height);
        heights[i] = (top - drawn) as u16;
        drawn = top;
    }
    heights
}

/// Days shown when only `slots` fit, keeping `selected` on screen
pub fn visible_window(len: usize, selected: usize, slots: usize) -> Range<usize> {
    let slots = slots.max(1);
    if len <= slots {
        return 0..len;
    }
    let start = if selected < slots {
        0
    } else {
        (selected + 1 - slots).min(len - slots)
    };
    start..start + slots
}

fn completed_per_phase(day: &DayStatistic) -> [usize; 4] {
    Phase::ALL.map(|phase| day.step(phase).tasks_completed_today)
}

/// Stacked bar chart over the simulated days
pub struct ThroughputBarsWidget<'a> {
    days: &'a [DayStatistic],
    selected: usize,
}

impl<'a> ThroughputBarsWidget<'a> {
    pub fn new(days: &'a [DayStatistic], selected: usize) -> Self {
        Self { days, selected }
    }

    fn legend() -> Line<'static> {
        let spans: Vec<Span> = Phase::ALL
            .iter()
            .flat_map(|phase| {
                [
                    Span::styled("■ ", Style::default().fg(phase_color(*phase))),
                    Span::raw(format!("{}  ", phase.display_name())),
                ]
            })
            .collect();
        Line::from(spans)
    }
}

impl Widget for ThroughputBarsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Tasks completed per day ");
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 3 || self.days.is_empty() {
            return;
        }

        Self::legend().render(Rect { height: 1, ..inner }, buf);

        // Legend on top, day marker row at the bottom
        let bars = Rect {
            y: inner.y + 1,
            height: inner.height - 2,
            ..inner
        };
        let marker_y = inner.y + inner.height - 1;

        let slots = (bars.width / SLOT_WIDTH) as usize;
        let window = visible_window(self.days.len(), self.selected, slots);
        let max = self.days[window.clone()]
            .iter()
            .map(|d| d.tasks_completed_today)
            .max()
            .unwrap_or(0);

        for (slot, idx) in window.enumerate() {
            let x = bars.x + slot as u16 * SLOT_WIDTH;
            let heights = stack_heights(completed_per_phase(&self.days[idx]), max, bars.height);

            let mut y = bars.y + bars.height;
            for (phase, rows) in Phase::ALL.iter().zip(heights) {
                for _ in 0..rows {
                    y -= 1;
                    for dx in 0..BAR_WIDTH {
                        if let Some(cell) = buf.cell_mut((x + dx, y)) {
                            cell.set_symbol(symbols::block::FULL)
                                .set_fg(phase_color(*phase));
                        }
                    }
                }
            }

            if idx == self.selected {
                buf.set_string(
                    x,
                    marker_y,
                    "▲▲",
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                );
            }
        }
    }
}

/// Cumulative completed tasks and tasks still open, over the run
pub struct ProgressChartWidget<'a> {
    days: &'a [DayStatistic],
    total_tasks: usize,
}

impl<'a> ProgressChartWidget<'a> {
    pub fn new(days: &'a [DayStatistic], total_tasks: usize) -> Self {
        Self { days, total_tasks }
    }

    fn series(&self) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
        self.days
            .iter()
            .map(|d| {
                let done = d.tasks_completed_total;
                let remaining = self.total_tasks.saturating_sub(done);
                ((d.day as f64, done as f64), (d.day as f64, remaining as f64))
            })
            .unzip()
    }
}

impl Widget for ProgressChartWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (cumulative, remaining) = self.series();
        let last_day = self.days.last().map(|d| d.day).unwrap_or(1).max(1);
        let top = self.total_tasks.max(1);

        let datasets = vec![
            Dataset::default()
                .name("Cumulative")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Magenta))
                .data(&cumulative),
            Dataset::default()
                .name("Remaining")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Red))
                .data(&remaining),
        ];

        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Task progress "),
            )
            .x_axis(
                Axis::default()
                    .title("day")
                    .style(Style::default().fg(Color::DarkGray))
                    .bounds([0.0, last_day as f64])
                    .labels(vec!["0".to_string(), last_day.to_string()]),
            )
            .y_axis(
                Axis::default()
                    .title("tasks")
                    .style(Style::default().fg(Color::DarkGray))
                    .bounds([0.0, top as f64])
                    .labels(vec!["0".to_string(), top.to_string()]),
            );

        chart.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_heights_scale_to_max() {
        assert_eq!(stack_heights([1, 1, 0, 2], 4, 8), [2, 2, 0, 4]);
        assert_eq!(stack_heights([2, 3, 3, 1], 9, 9), [2, 3, 3, 1]);
        // A smaller day uses part of the height
        assert_eq!(stack_heights([1, 0, 0, 1], 4, 8), [2, 0, 0, 2]);
    }

    #[test]
    fn test_stack_heights_empty() {
        assert_eq!(stack_heights([0, 0, 0, 0], 0, 10), [0; 4]);
        assert_eq!(stack_heights([0, 0, 0, 0], 5, 10), [0; 4]);
    }

    #[test]
    fn test_stack_heights_never_exceed_height() {
        let heights = stack_heights([3, 3, 3, 3], 12, 5);
        assert_eq!(heights.iter().sum::<u16>(), 5);
    }

    #[test]
    fn test_visible_window() {
        assert_eq!(visible_window(3, 1, 10), 0..3);
        assert_eq!(visible_window(10, 2, 4), 0..4);
        assert_eq!(visible_window(10, 9, 4), 6..10);
        assert_eq!(visible_window(10, 5, 4), 2..6);
        assert_eq!(visible_window(5, 0, 0), 0..1);
    }

    #[test]
    fn test_bars_render_without_panic() {
        let days: Vec<DayStatistic> = Vec::new();
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        ThroughputBarsWidget::new(&days, 0).render(area, &mut buf);
        ProgressChartWidget::new(&days, 0).render(area, &mut buf);
    }
}
