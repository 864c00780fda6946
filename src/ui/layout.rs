//! Main layout rendering for the viewer.

use crate::app::{App, AppView};
use crate::ui::widgets::help::HelpWidget;
use crate::ui::widgets::queue_table::QueueTableWidget;
use crate::ui::widgets::story_list::{StoryDetailWidget, StoryListWidget};
use crate::ui::widgets::throughput_chart::{ProgressChartWidget, ThroughputBarsWidget};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

/// Draw the main application UI
pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Create layout: header, main content, footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    draw_header(frame, app, chunks[0]);
    draw_footer(frame, app, chunks[2]);

    match app.view {
        AppView::Chart => draw_chart(frame, app, chunks[1]),
        AppView::Stories => draw_stories(frame, app, chunks[1]),
        AppView::Help => draw_help(frame, app, centered_rect(70, 90, area)),
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let summary = &app.report.summary;
    let day = app.current_day().map(|d| d.day).unwrap_or(0);
    let text = format!(
        "devcyclesim - day {}/{} | finished {}/{} | tasks {}",
        day,
        summary.simulated_days,
        summary.finished_stories,
        summary.total_stories,
        summary.tasks_completed
    );

    let header = Paragraph::new(text)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let footer_text = match app.view {
        AppView::Chart => " h/l: Day | g/G: First/Last | Tab: Stories | ?: Help | q: Quit ",
        AppView::Stories => " j/k: Story | h/l: Day | Tab: Chart | ?: Help | q: Quit ",
        AppView::Help => " j/k: Scroll | Esc: Close help ",
    };
    let footer = Paragraph::new(footer_text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, area);
}

/// Bars and progress lines on the left, queue table of the selected day on the right
fn draw_chart(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(60)])
        .split(area);

    let charts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(columns[0]);

    frame.render_widget(ThroughputBarsWidget::new(app.days(), app.selected_day), charts[0]);
    frame.render_widget(ProgressChartWidget::new(app.days(), app.total_tasks), charts[1]);

    match app.current_day() {
        Some(day) => frame.render_widget(QueueTableWidget::new(day), columns[1]),
        None => {
            let empty = Paragraph::new("No days simulated.")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title("Queues"))
                .alignment(Alignment::Center);
            frame.render_widget(empty, columns[1]);
        }
    }
}

fn draw_stories(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    frame.render_widget(
        StoryListWidget::new(&app.report.finished_stories, app.selected_story),
        columns[0],
    );
    frame.render_widget(
        StoryDetailWidget::new(app.selected_finished_story()),
        columns[1],
    );
}

/// Draw help view showing all keybindings
fn draw_help(frame: &mut Frame, app: &mut App, area: Rect) {
    // The widget records its dimensions for scrolling
    let help_widget = HelpWidget::new(&mut app.help_view_state);
    frame.render_widget(help_widget, area);
}

/// Create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
