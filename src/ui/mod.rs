//! UI components for the results viewer.
//!
//! This module contains:
//! - layout: Main layout rendering
//! - input: Keyboard input handling
//! - widgets: Chart, queue table, story list and help widgets

pub mod input;
pub mod layout;
pub mod widgets;
