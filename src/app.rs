//! Viewer state and main event loop.

use crate::config::UiConfig;
use crate::domain::{DayStatistic, FinishedStory};
use crate::error::{AppError, Result};
use crate::services::SimulationReport;
use crate::ui::input::{Action, InputHandler};
use crate::ui::widgets::help::HelpViewState;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::prelude::*;
use std::time::{Duration, Instant};

/// Days skipped by page navigation
const PAGE_DAYS: usize = 7;

/// Application view state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppView {
    /// Throughput chart with the queue table of the selected day
    #[default]
    Chart,
    /// Finished stories and their task completion days
    Stories,
    /// Help view showing keybindings
    Help,
}

/// Main application state
pub struct App {
    /// Results being shown
    pub report: SimulationReport,
    /// Tasks of all stories at the end of the run
    pub total_tasks: usize,

    // UI State
    /// Current view
    pub view: AppView,
    /// View to return to when help closes
    previous_view: AppView,
    /// Index of the selected day in the statistics
    pub selected_day: usize,
    /// Selected finished story
    pub selected_story: usize,
    /// State for help view (scroll position)
    pub help_view_state: HelpViewState,

    refresh_rate: Duration,
    input_handler: InputHandler,

    /// Should quit the application
    pub should_quit: bool,
}

impl App {
    /// Create the viewer for a finished run; the last day starts selected
    pub fn new(report: SimulationReport, ui: &UiConfig) -> Self {
        let total_tasks = report
            .task_completion_dates
            .values()
            .map(|d| d.completed.len() + d.pending.len())
            .sum();
        let selected_day = report.daily_statistics.len().saturating_sub(1);

        Self {
            report,
            total_tasks,
            view: AppView::default(),
            previous_view: AppView::default(),
            selected_day,
            selected_story: 0,
            help_view_state: HelpViewState::new(),
            refresh_rate: Duration::from_millis(ui.refresh_rate_ms),
            input_handler: InputHandler::new(ui.vim_navigation),
            should_quit: false,
        }
    }

    pub fn days(&self) -> &[DayStatistic] {
        &self.report.daily_statistics
    }

    /// Statistics of the selected day
    pub fn current_day(&self) -> Option<&DayStatistic> {
        self.days().get(self.selected_day)
    }

    pub fn selected_finished_story(&self) -> Option<&FinishedStory> {
        self.report.finished_stories.get(self.selected_story)
    }

    fn last_day_index(&self) -> usize {
        self.days().len().saturating_sub(1)
    }

    fn move_day(&mut self, forward: bool, by: usize) {
        self.selected_day = if forward {
            (self.selected_day + by).min(self.last_day_index())
        } else {
            self.selected_day.saturating_sub(by)
        };
    }

    fn move_story(&mut self, forward: bool) {
        let last = self.report.finished_stories.len().saturating_sub(1);
        self.selected_story = if forward {
            (self.selected_story + 1).min(last)
        } else {
            self.selected_story.saturating_sub(1)
        };
    }

    /// Open help view
    pub fn open_help(&mut self) {
        self.help_view_state = HelpViewState::new();
        if self.view != AppView::Help {
            self.previous_view = self.view;
        }
        self.view = AppView::Help;
    }

    /// Close help view
    pub fn close_help(&mut self) {
        self.view = self.previous_view;
    }

    /// Handle keyboard input and return true if should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.view == AppView::Help {
            return self.handle_help_key(key);
        }

        let Some(action) = self.input_handler.handle_key(key) else {
            return false;
        };

        match action {
            Action::MoveLeft => self.move_day(false, 1),
            Action::MoveRight => self.move_day(true, 1),
            Action::PageUp => self.move_day(false, PAGE_DAYS),
            Action::PageDown => self.move_day(true, PAGE_DAYS),
            Action::Home => self.selected_day = 0,
            Action::End => self.selected_day = self.last_day_index(),
            Action::MoveUp if self.view == AppView::Stories => self.move_story(false),
            Action::MoveDown if self.view == AppView::Stories => self.move_story(true),
            Action::MoveUp | Action::MoveDown => {}
            Action::NextView => {
                self.view = match self.view {
                    AppView::Chart => AppView::Stories,
                    _ => AppView::Chart,
                };
            }
            Action::ShowChart => self.view = AppView::Chart,
            Action::ShowStories => self.view = AppView::Stories,
            Action::Help => self.open_help(),
            Action::Back => {
                if self.view != AppView::Chart {
                    self.view = AppView::Chart;
                } else {
                    return true;
                }
            }
            Action::Quit => return true,
        }

        false
    }

    /// Handle keys in help view
    fn handle_help_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
                self.close_help();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.help_view_state.scroll_up(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.help_view_state.scroll_down(1);
            }
            KeyCode::PageUp | KeyCode::Char('b') => {
                self.help_view_state.page_up();
            }
            KeyCode::PageDown | KeyCode::Char('f') => {
                self.help_view_state.page_down();
            }
            _ => {}
        }
        false
    }

    /// Main event loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut last_tick = Instant::now();

        while !self.should_quit {
            terminal.draw(|f| crate::ui::layout::draw(f, self))?;

            let timeout = self.refresh_rate.saturating_sub(last_tick.elapsed());
            if event::poll(timeout).map_err(|e| AppError::Terminal(e.to_string()))? {
                match event::read().map_err(|e| AppError::Terminal(e.to_string()))? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.should_quit = self.handle_key(key);
                    }
                    Event::Resize(width, height) => {
                        tracing::debug!("Terminal resized to {}x{}", width, height);
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.refresh_rate {
                last_tick = Instant::now();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PhaseDurations, ResourcePlanSchedule, UserStory};
    use crate::engine::Process;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;

    fn app() -> App {
        let mut process = Process::new(12, ResourcePlanSchedule::default());
        for i in 1..=3 {
            process
                .add(
                    UserStory::from_phase_durations(
                        format!("STORY-{}", i),
                        PhaseDurations::new(1, 2, 1, 1),
                    )
                    .unwrap(),
                )
                .unwrap();
        }
        process.run().unwrap();
        App::new(SimulationReport::from_process(&process), &UiConfig::default())
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_starts_on_last_day() {
        let app = app();
        assert_eq!(app.selected_day, 11);
        assert_eq!(app.current_day().unwrap().day, 12);
        assert_eq!(app.total_tasks, 15);
        assert_eq!(app.view, AppView::Chart);
    }

    #[test]
    fn test_day_navigation_clamps() {
        let mut app = app();
        press(&mut app, KeyCode::Right);
        assert_eq!(app.selected_day, 11);
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.selected_day, 10);
        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.selected_day, 3);
        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.selected_day, 0);
        press(&mut app, KeyCode::Char('G'));
        assert_eq!(app.selected_day, 11);
        press(&mut app, KeyCode::Home);
        assert_eq!(app.selected_day, 0);
    }

    #[test]
    fn test_view_switching_and_story_selection() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.view, AppView::Stories);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_story, 2);
        assert_eq!(app.selected_finished_story().unwrap().id, "STORY-3");

        // Esc goes back to the chart before quitting
        assert!(!press(&mut app, KeyCode::Esc));
        assert_eq!(app.view, AppView::Chart);
        assert!(press(&mut app, KeyCode::Esc));
    }

    #[test]
    fn test_help_returns_to_previous_view() {
        let mut app = app();
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.view, AppView::Help);
        // q closes help instead of quitting
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.view, AppView::Stories);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_draw_every_view() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        for view in [AppView::Chart, AppView::Stories, AppView::Help] {
            app.view = view;
            terminal
                .draw(|f| crate::ui::layout::draw(f, &mut app))
                .unwrap();
        }
    }
}
