use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::Category;
use crate::ui::app::{App, FormField, InputMode};
use crate::ui::theme;

const LABEL_WIDTH: usize = 12;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(FormField::all().len() as u16 * 2 + 2), // Fields
            Constraint::Min(3),                                        // Hints
        ])
        .split(area);

    render_fields(f, chunks[0], app);
    render_hints(f, chunks[1], app);
}

fn render_fields(f: &mut Frame, area: Rect, app: &App) {
    let form = &app.form;
    let editing = app.input_mode == InputMode::Editing;

    let items: Vec<ListItem> = FormField::all()
        .iter()
        .map(|&field| {
            let focused = editing && field == form.focus;
            let label_style = if form.is_invalid(field) {
                Style::default().fg(theme::RED).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::TEXT_DIM)
            };
            let value_style = if focused {
                theme::selected_style()
            } else {
                theme::normal_style()
            };

            let value = match field {
                FormField::Category => category_picker(form.category, focused),
                _ => {
                    let v = form.value(field);
                    if v.is_empty() && !focused {
                        vec![Span::styled(placeholder(field), theme::dim_style())]
                    } else {
                        vec![Span::styled(format!("{v} "), value_style)]
                    }
                }
            };

            let mut spans = vec![Span::styled(
                format!("{:<LABEL_WIDTH$}", field.label()),
                label_style,
            )];
            spans.extend(value);
            ListItem::new(vec![Line::from(spans), Line::from("")])
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if editing {
                theme::ACCENT
            } else {
                theme::OVERLAY
            }))
            .title(Span::styled(" Add Transaction ", theme::title_style())),
    );
    f.render_widget(list, area);

    if editing && form.focus != FormField::Category {
        let row = FormField::all()
            .iter()
            .position(|&fld| fld == form.focus)
            .unwrap_or(0) as u16;
        let x = area.x + 1 + LABEL_WIDTH as u16 + form.value(form.focus).chars().count() as u16;
        f.set_cursor_position((x, area.y + 1 + row * 2));
    }
}

fn placeholder(field: FormField) -> &'static str {
    match field {
        FormField::Date => "YYYY-MM-DD",
        FormField::Amount => "0.00",
        FormField::Name => "Where did the money go?",
        FormField::Category => "",
    }
}

fn category_picker(selected: Option<Category>, focused: bool) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    if focused {
        spans.push(Span::styled("◀ ", theme::dim_style()));
    }
    for (i, cat) in Category::all().iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        let color = theme::category_color(*cat);
        let style = if selected == Some(*cat) {
            Style::default()
                .fg(theme::HEADER_BG)
                .bg(color)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color)
        };
        spans.push(Span::styled(format!(" {} ", cat.as_str()), style));
    }
    if focused {
        spans.push(Span::styled(" ▶", theme::dim_style()));
    }
    spans
}

fn render_hints(f: &mut Frame, area: Rect, app: &App) {
    let lines = if app.input_mode == InputMode::Editing {
        vec![
            Line::from(Span::styled(
                "Tab/Shift-Tab or Up/Down move between fields",
                theme::dim_style(),
            )),
            Line::from(Span::styled(
                "Left/Right or the first letter picks a category",
                theme::dim_style(),
            )),
            Line::from(Span::styled(
                "Enter saves, Esc leaves the form",
                theme::dim_style(),
            )),
        ]
    } else {
        vec![Line::from(Span::styled(
            "Press i or Enter to edit the form",
            theme::dim_style(),
        ))]
    };
    f.render_widget(Paragraph::new(lines).block(Block::default().borders(Borders::NONE)), area);
}
