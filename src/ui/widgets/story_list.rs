//! Finished story list with per-story lead time and completion dates.

use crate::domain::{FinishedStory, TaskCompletionDates};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

/// Run-length path of the completed tasks, e.g. "S2 D3 T1 D1 T1 R1"
pub fn compact_path(dates: &TaskCompletionDates) -> String {
    let mut runs: Vec<(&str, usize)> = Vec::new();
    for (phase, _) in &dates.completed {
        let code = phase.short_code();
        match runs.last_mut() {
            Some((last, count)) if *last == code => *count += 1,
            _ => runs.push((code, 1)),
        }
    }
    runs.iter()
        .map(|(code, count)| format!("{}{}", code, count))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Widget listing finished stories in completion order
pub struct StoryListWidget<'a> {
    stories: &'a [FinishedStory],
    selected_index: usize,
}

impl<'a> StoryListWidget<'a> {
    pub fn new(stories: &'a [FinishedStory], selected_index: usize) -> Self {
        Self {
            stories,
            selected_index,
        }
    }

    fn build_items(&self) -> Vec<ListItem<'a>> {
        self.stories
            .iter()
            .map(|story| {
                let rework = if story.rework_count > 0 {
                    format!("  rework x{}", story.rework_count)
                } else {
                    String::new()
                };
                let line = format!(
                    "{:<12} {:<16} day {:>3} -> {:>3}  lead {:>3}  {}{}",
                    story.id,
                    story.feature_id,
                    story.arrival_day,
                    story.completion_day,
                    story.lead_time,
                    compact_path(&story.completion_dates),
                    rework
                );
                ListItem::new(line)
            })
            .collect()
    }
}

impl Widget for StoryListWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = format!(" Finished stories ({}) ", self.stories.len());
        if self.stories.is_empty() {
            Paragraph::new("No story finished within the simulated days.")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title(title))
                .alignment(Alignment::Center)
                .render(area, buf);
            return;
        }

        let mut state = ListState::default();
        state.select(Some(self.selected_index));

        let list = List::new(self.build_items())
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        StatefulWidget::render(list, area, buf, &mut state);
    }
}

/// Task completion days of the selected story
pub struct StoryDetailWidget<'a> {
    story: Option<&'a FinishedStory>,
}

impl<'a> StoryDetailWidget<'a> {
    pub fn new(story: Option<&'a FinishedStory>) -> Self {
        Self { story }
    }

    fn build_lines(&self) -> Vec<Line<'static>> {
        let Some(story) = self.story else {
            return Vec::new();
        };

        let mut lines = vec![
            Line::from(Span::styled(
                story.id.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Feature: {}", story.feature_id)),
            Line::from(format!(
                "Arrived day {}, finished day {} ({} days)",
                story.arrival_day, story.completion_day, story.lead_time
            )),
            Line::from(""),
        ];
        for (phase, day) in &story.completion_dates.completed {
            lines.push(Line::from(format!("  {:<8} day {}", phase.label(), day)));
        }
        lines
    }
}

impl Widget for StoryDetailWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.build_lines())
            .block(Block::default().borders(Borders::ALL).title(" Tasks "))
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Phase, TaskCompletionDates};

    fn finished(id: &str, rework_count: u32) -> FinishedStory {
        FinishedStory {
            id: id.to_string(),
            feature_id: "checkout".to_string(),
            arrival_day: 1,
            completion_day: 5,
            lead_time: 5,
            total_tasks: 2,
            rework_count,
            completion_dates: TaskCompletionDates {
                completed: vec![(Phase::Spec, 1), (Phase::Rollout, 5)],
                pending: Vec::new(),
            },
        }
    }

    #[test]
    fn test_empty_list() {
        let stories: Vec<FinishedStory> = vec![];
        let widget = StoryListWidget::new(&stories, 0);
        assert!(widget.build_items().is_empty());
    }

    #[test]
    fn test_items_per_story() {
        let stories = vec![finished("A", 0), finished("B", 2)];
        let widget = StoryListWidget::new(&stories, 1);
        assert_eq!(widget.build_items().len(), 2);
    }

    #[test]
    fn test_compact_path_shows_rework_hops() {
        let dates = TaskCompletionDates {
            completed: vec![
                (Phase::Spec, 1),
                (Phase::Spec, 2),
                (Phase::Dev, 3),
                (Phase::Test, 4),
                (Phase::Dev, 5),
                (Phase::Test, 6),
                (Phase::Rollout, 7),
            ],
            pending: Vec::new(),
        };
        assert_eq!(compact_path(&dates), "S2 D1 T1 D1 T1 R1");
        assert_eq!(compact_path(&TaskCompletionDates::default()), "");
        assert_eq!(compact_path(&finished("A", 0).completion_dates), "S1 R1");
    }

    #[test]
    fn test_detail_lists_completed_tasks() {
        let story = finished("A", 0);
        let lines = StoryDetailWidget::new(Some(&story)).build_lines();
        assert_eq!(lines.len(), 6);
        assert!(StoryDetailWidget::new(None).build_lines().is_empty());
    }
}
