//! UI module for the Reglas TUI

pub mod layout;
pub mod render;
pub mod theme;
pub mod widgets;
