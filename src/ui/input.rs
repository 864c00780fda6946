//! Keyboard input handling with vim-style navigation support.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Actions that can be triggered by keyboard input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Navigation
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PageUp,
    PageDown,
    Home,
    End,

    // Views
    NextView,
    ShowChart,
    ShowStories,
    Back,

    // Misc
    Help,
    Quit,
}

/// Keyboard bindings configuration
pub struct KeyBindings {
    pub vim_navigation: bool,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            vim_navigation: true,
        }
    }
}

/// Input handler for processing keyboard events
pub struct InputHandler {
    bindings: KeyBindings,
}

impl InputHandler {
    /// Create a new input handler
    pub fn new(vim_navigation: bool) -> Self {
        Self {
            bindings: KeyBindings { vim_navigation },
        }
    }

    /// Handle a key event and return the corresponding action
    pub fn handle_key(&self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }

        match key.code {
            // Navigation - arrow keys always work
            KeyCode::Up => Some(Action::MoveUp),
            KeyCode::Down => Some(Action::MoveDown),
            KeyCode::Left => Some(Action::MoveLeft),
            KeyCode::Right => Some(Action::MoveRight),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::Home => Some(Action::Home),
            KeyCode::End => Some(Action::End),

            // Vim-style navigation (j/k/h/l)
            KeyCode::Char('j') if self.bindings.vim_navigation => Some(Action::MoveDown),
            KeyCode::Char('k') if self.bindings.vim_navigation => Some(Action::MoveUp),
            KeyCode::Char('h') if self.bindings.vim_navigation => Some(Action::MoveLeft),
            KeyCode::Char('l') if self.bindings.vim_navigation => Some(Action::MoveRight),
            KeyCode::Char('g') if self.bindings.vim_navigation => Some(Action::Home),
            KeyCode::Char('G') if self.bindings.vim_navigation => Some(Action::End),
            KeyCode::Char('b') if self.bindings.vim_navigation => Some(Action::PageUp),
            KeyCode::Char('f') if self.bindings.vim_navigation => Some(Action::PageDown),

            // Views
            KeyCode::Tab => Some(Action::NextView),
            KeyCode::Char('c') => Some(Action::ShowChart),
            KeyCode::Char('s') => Some(Action::ShowStories),

            // Back/Quit
            KeyCode::Esc => Some(Action::Back),
            KeyCode::Char('q') => Some(Action::Quit),

            // Misc
            KeyCode::Char('?') => Some(Action::Help),

            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_vim_navigation() {
        let handler = InputHandler::new(true);
        assert_eq!(handler.handle_key(key(KeyCode::Char('j'))), Some(Action::MoveDown));
        assert_eq!(handler.handle_key(key(KeyCode::Char('k'))), Some(Action::MoveUp));
        assert_eq!(handler.handle_key(key(KeyCode::Char('h'))), Some(Action::MoveLeft));
        assert_eq!(handler.handle_key(key(KeyCode::Char('G'))), Some(Action::End));
    }

    #[test]
    fn test_arrow_keys() {
        let handler = InputHandler::new(false); // vim disabled
        assert_eq!(handler.handle_key(key(KeyCode::Up)), Some(Action::MoveUp));
        assert_eq!(handler.handle_key(key(KeyCode::Right)), Some(Action::MoveRight));
        assert_eq!(handler.handle_key(key(KeyCode::Char('j'))), None);
        assert_eq!(handler.handle_key(key(KeyCode::Char('l'))), None);
    }

    #[test]
    fn test_view_keys() {
        let handler = InputHandler::new(true);
        assert_eq!(handler.handle_key(key(KeyCode::Tab)), Some(Action::NextView));
        assert_eq!(handler.handle_key(key(KeyCode::Char('s'))), Some(Action::ShowStories));
        assert_eq!(handler.handle_key(key(KeyCode::Char('c'))), Some(Action::ShowChart));
        assert_eq!(handler.handle_key(key(KeyCode::Char('?'))), Some(Action::Help));
    }

    #[test]
    fn test_quit_keys() {
        let handler = InputHandler::new(true);
        assert_eq!(handler.handle_key(key(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(handler.handle_key(key(KeyCode::Esc)), Some(Action::Back));

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handler.handle_key(ctrl_c), Some(Action::Quit));
    }
}
