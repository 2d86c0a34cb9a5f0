use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::db::Database;
use crate::ui::app::{App, InputMode, PendingAction, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

/// How often the loop wakes without input, so the flash banner can expire.
const TICK: Duration = Duration::from_millis(250);

pub(crate) fn as_tui(db: &mut Database, config: &Config) -> Result<()> {
    let mut app = App::new(db, config, chrono::Local::now().date_naive())?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    tracing::info!("TUI started");
    let result = run_app(&mut terminal, &mut app, db);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!("TUI exited with error: {e:?}");
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    db: &mut Database,
) -> Result<()> {
    while app.running {
        app.poll_budget_events();
        app.tick(Instant::now());

        // A failed frame never undoes a save that already went through.
        if let Err(e) = terminal.draw(|f| {
            let content_height = f.area().height.saturating_sub(6) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        }) {
            tracing::warn!("Failed to draw frame: {e}");
        }

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            handle_key(key, app, db)?;
        }
    }
    Ok(())
}

pub(crate) fn handle_key(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    if app.show_help {
        app.show_help = false;
        return Ok(());
    }
    match app.input_mode {
        InputMode::Normal => handle_normal_input(key, app, db),
        InputMode::Command => handle_command_input(key, app, db),
        InputMode::Editing => handle_editing_input(key, app, db),
        InputMode::Confirm => handle_confirm_input(key, app, db),
    }
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('q') | KeyCode::Char('c')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.running = false;
        }
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char('1') => app.open_screen(Screen::Dashboard),
        KeyCode::Char('2') => app.open_screen(Screen::Add),
        KeyCode::Char('3') => app.open_screen(Screen::Transactions),
        KeyCode::Char('4') => app.open_screen(Screen::Setup),
        KeyCode::Tab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let next = (idx + 1) % screens.len();
            app.open_screen(screens[next]);
        }
        KeyCode::BackTab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let prev = if idx == 0 { screens.len() - 1 } else { idx - 1 };
            app.open_screen(screens[prev]);
        }
        KeyCode::Char('i') | KeyCode::Enter if app.screen.is_form() => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('?') => {
            app.show_help = true;
        }
        KeyCode::Char('H') => {
            commands::handle_command("prev-month", app, db)?;
        }
        KeyCode::Char('L') => {
            commands::handle_command("next-month", app, db)?;
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half_page = app.visible_rows / 2;
            for _ in 0..half_page {
                handle_move_down(app);
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half_page = app.visible_rows / 2;
            for _ in 0..half_page {
                handle_move_up(app);
            }
        }
        KeyCode::Esc => {
            app.status_message.clear();
        }
        _ => {}
    }
    Ok(())
}

fn handle_command_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, db)?;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

/// Typing into the Add or Setup form.
fn handle_editing_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        app.running = false;
        return Ok(());
    }

    match app.screen {
        Screen::Add => match key.code {
            KeyCode::Enter => app.submit_transaction(db),
            KeyCode::Esc => app.input_mode = InputMode::Normal,
            KeyCode::Tab | KeyCode::Down => app.form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => app.form.focus_prev(),
            KeyCode::Left => app.form.cycle_category(-1),
            KeyCode::Right => app.form.cycle_category(1),
            KeyCode::Backspace => app.form.pop_char(),
            KeyCode::Char(c) => app.form.push_char(c),
            _ => {}
        },
        Screen::Setup => match key.code {
            KeyCode::Enter => app.submit_budgets(db),
            KeyCode::Esc if app.budgets.is_set() => app.open_screen(Screen::Dashboard),
            KeyCode::Esc => app.input_mode = InputMode::Normal,
            KeyCode::Tab | KeyCode::Down => app.setup.focus_next(),
            KeyCode::BackTab | KeyCode::Up => app.setup.focus_prev(),
            KeyCode::Backspace => app.setup.pop_char(),
            KeyCode::Char(c) => app.setup.push_char(c),
            _ => {}
        },
        _ => app.input_mode = InputMode::Normal,
    }
    Ok(())
}

fn handle_confirm_input(key: KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.input_mode = InputMode::Normal;
            if let Some(action) = app.pending_action.take() {
                match action {
                    PendingAction::ResetAll => app.reset(db),
                }
            }
        }
        _ => {
            app.pending_action = None;
            app.input_mode = InputMode::Normal;
            app.set_status("Cancelled");
        }
    }
    app.confirm_message.clear();
    Ok(())
}

fn handle_move_down(app: &mut App) {
    if app.screen == Screen::Transactions {
        let len = app.month_transactions().len();
        scroll_down(
            &mut app.transaction_index,
            &mut app.transaction_scroll,
            len,
            app.visible_rows,
        );
    }
}

fn handle_move_up(app: &mut App) {
    if app.screen == Screen::Transactions {
        scroll_up(&mut app.transaction_index, &mut app.transaction_scroll);
    }
}

fn handle_goto_top(app: &mut App) {
    if app.screen == Screen::Transactions {
        scroll_to_top(&mut app.transaction_index, &mut app.transaction_scroll);
    }
}

fn handle_goto_bottom(app: &mut App) {
    if app.screen == Screen::Transactions {
        let len = app.month_transactions().len();
        scroll_to_bottom(
            &mut app.transaction_index,
            &mut app.transaction_scroll,
            len,
            app.visible_rows,
        );
    }
}

#[cfg(test)]
#[path = "tui_tests.rs"]
mod tests;
