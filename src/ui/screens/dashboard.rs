use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, format_date, format_percent, format_spending, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Summary cards
            Constraint::Min(9),    // Share chart + budget progress
            Constraint::Length(app.recent_limit.min(10) as u16 + 2), // Recent
        ])
        .split(area);

    render_summary_cards(f, chunks[0], app);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);
    render_share_chart(f, middle[0], app);
    render_budget_progress(f, middle[1], app);

    render_recent(f, chunks[2], app);
}

fn render_summary_cards(f: &mut Frame, area: Rect, app: &App) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let view = &app.view;
    let remaining = view.total_remaining();

    render_card(
        f,
        cards[0],
        "Balance",
        format_amount(view.balance),
        sign_color(view.balance),
        format!("of {} income", format_amount(view.monthly_income)),
    );
    render_card(
        f,
        cards[1],
        "Spent",
        format_spending(view.totals.total_spent),
        theme::RED,
        format!("{} txns", app.ledger.len()),
    );
    render_card(
        f,
        cards[2],
        "Budget",
        format_amount(view.totals.total_budget),
        theme::ACCENT,
        if app.budgets.is_set() {
            "per month".to_string()
        } else {
            "not set, see :setup".to_string()
        },
    );
    render_card(
        f,
        cards[3],
        "Remaining",
        format_amount(remaining),
        sign_color(remaining),
        String::new(),
    );
}

fn sign_color(amount: Decimal) -> ratatui::style::Color {
    if amount >= Decimal::ZERO {
        theme::GREEN
    } else {
        theme::RED
    }
}

fn render_card(
    f: &mut Frame,
    area: Rect,
    title: &str,
    display: String,
    color: ratatui::style::Color,
    subtitle: String,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(format!(" {title} "), theme::title_style()));

    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            display,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle, theme::dim_style())),
    ])
    .centered()
    .block(block);

    f.render_widget(text, area);
}

fn section(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(format!(" {title} "), theme::title_style()))
}

/// One horizontal bar per category, sized by spend and labelled with its
/// share of the total.
fn render_share_chart(f: &mut Frame, area: Rect, app: &App) {
    if app.view.totals.total_spent.is_zero() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No spending yet", theme::dim_style())),
            Line::from(Span::styled(
                "Press 2 or :add to record a transaction",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(section("Spending by Category"));
        f.render_widget(msg, area);
        return;
    }

    let bars: Vec<Bar> = app
        .view
        .categories
        .iter()
        .map(|s| {
            let color = theme::category_color(s.category);
            Bar::default()
                .value((s.spent * Decimal::ONE_HUNDRED).to_u64().unwrap_or(0))
                .text_value(format!("{} {}", format_percent(s.share), format_amount(s.spent)))
                .label(Line::from(truncate(s.category.as_str(), 13)))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(theme::HEADER_BG).bg(color))
        })
        .collect();

    let chart = BarChart::default()
        .block(section("Spending by Category"))
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0);

    f.render_widget(chart, area);
}

fn render_budget_progress(f: &mut Frame, area: Rect, app: &App) {
    if !app.budgets.is_set() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No budgets set", theme::dim_style())),
            Line::from(Span::styled(
                "Press 4 or :setup to set a monthly budget per category",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(section("Budgets"));
        f.render_widget(msg, area);
        return;
    }

    let items: Vec<ListItem> = app
        .view
        .categories
        .iter()
        .map(|s| {
            let ratio = s.used_ratio().and_then(|r| r.to_f64()).unwrap_or(0.0);
            let color = if s.is_over() || ratio > 0.9 {
                theme::RED
            } else if ratio > 0.7 {
                theme::YELLOW
            } else {
                theme::GREEN
            };

            let remaining = if s.is_over() {
                format!("{} over", format_amount(s.remaining.abs()))
            } else {
                format!("{} left", format_amount(s.remaining))
            };

            ListItem::new(Line::from(vec![
                Span::styled("■ ", Style::default().fg(theme::category_color(s.category))),
                Span::styled(format!("{:<14}", s.category.as_str()), theme::normal_style()),
                Span::styled(
                    format!("{}/{} ", format_amount(s.spent), format_amount(s.budget)),
                    Style::default().fg(color),
                ),
                Span::styled(create_progress_bar(ratio.min(1.0), 12), Style::default().fg(color)),
                Span::styled(
                    format!(" {remaining}"),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(section("Budgets")), area);
}

fn render_recent(f: &mut Frame, area: Rect, app: &App) {
    let recent = app.recent();
    let title = format!("Recent Transactions ({})", recent.len());

    if recent.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "Nothing recorded yet",
            theme::dim_style(),
        )))
        .centered()
        .block(section(&title));
        f.render_widget(msg, area);
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let name_width = width.saturating_sub(20 + 16 + 14).max(8);

    let items: Vec<ListItem> = recent
        .iter()
        .enumerate()
        .map(|(i, txn)| {
            let style = if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<20}", format_date(txn.date)), theme::dim_style()),
                Span::styled(format!("{:<name_width$}", truncate(&txn.name, name_width)), style),
                Span::styled(
                    format!("{:<16}", txn.category.as_str()),
                    Style::default().fg(theme::category_color(txn.category)),
                ),
                Span::styled(format!("{:>14}", format_spending(txn.amount)), theme::expense_style()),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(section(&title)), area);
}

fn create_progress_bar(ratio: f64, width: usize) -> String {
    let filled = (ratio * width as f64) as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}
