//! Front ends: the interactive TUI and the one-shot CLI commands.

mod cli;
mod tui;

pub(crate) use cli::as_cli;
pub(crate) use tui::as_tui;
