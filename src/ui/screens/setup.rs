use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::Category;
use crate::ui::app::{App, InputMode};
use crate::ui::theme;
use crate::ui::util::format_amount;

const LABEL_WIDTH: usize = 16;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                                 // Intro
            Constraint::Length(Category::all().len() as u16 + 2), // Inputs
            Constraint::Length(3),                                 // Total
            Constraint::Min(0),
        ])
        .split(area);

    let intro = if app.budgets.is_set() {
        "Adjust your monthly budget for each category"
    } else {
        "Set a monthly budget for each category to get started"
    };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(intro, Style::default().fg(theme::ACCENT))))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme::OVERLAY))
                    .title(Span::styled(" Budget Setup ", theme::title_style())),
            ),
        chunks[0],
    );

    render_inputs(f, chunks[1], app);

    let total = Paragraph::new(Line::from(vec![
        Span::styled(format!("{:<LABEL_WIDTH$}", "Total"), theme::dim_style()),
        Span::styled(
            format_amount(app.setup.total()),
            Style::default().fg(theme::GREEN).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Enter saves, Esc cancels", theme::dim_style()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY)),
    );
    f.render_widget(total, chunks[2]);
}

fn render_inputs(f: &mut Frame, area: Rect, app: &App) {
    let setup = &app.setup;
    let editing = app.input_mode == InputMode::Editing;

    let items: Vec<ListItem> = Category::all()
        .iter()
        .zip(&setup.amounts)
        .enumerate()
        .map(|(i, (cat, amount))| {
            let label_style = if setup.invalid.contains(cat) {
                Style::default().fg(theme::RED).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::category_color(*cat))
            };
            let value_style = if editing && i == setup.focus {
                theme::selected_style()
            } else {
                theme::normal_style()
            };
            let spent = app
                .view
                .summary(*cat)
                .map(|s| s.spent)
                .unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<LABEL_WIDTH$}", cat.as_str()), label_style),
                Span::styled(format!("{amount:<12}"), value_style),
                Span::styled(format!("  spent so far {}", format_amount(spent)), theme::dim_style()),
            ]))
        })
        .collect();

    f.render_widget(
        List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if editing {
                    theme::ACCENT
                } else {
                    theme::OVERLAY
                })),
        ),
        area,
    );

    if editing {
        let len = setup
            .amounts
            .get(setup.focus)
            .map(|a| a.chars().count())
            .unwrap_or(0) as u16;
        f.set_cursor_position((
            area.x + 1 + LABEL_WIDTH as u16 + len,
            area.y + 1 + setup.focus as u16,
        ));
    }
}
