use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use rust_decimal::Decimal;

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_date, format_month, format_spending, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let month = format_month(app.current_month);
    let txns = app.month_transactions();

    if txns.is_empty() {
        let msg = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("No transactions in {month}"),
                theme::dim_style(),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Use H/L to change month, or press 2 to add one",
                theme::dim_style(),
            )),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                format!(" Transactions: {month} (0) "),
                theme::title_style(),
            ));
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let header_cells = ["Date", "Name", "Category", "Amount"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let month_total: Decimal = txns.iter().map(|t| t.amount).sum();

    let rows: Vec<Row> = txns
        .iter()
        .enumerate()
        .skip(app.transaction_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, txn)| {
            let style = if i == app.transaction_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            Row::new(vec![
                Cell::from(format!("  {}", format_date(txn.date))),
                Cell::from(truncate(&txn.name, 40)),
                Cell::from(Span::styled(
                    txn.category.as_str(),
                    Style::default().fg(theme::category_color(txn.category)),
                )),
                Cell::from(Span::styled(format_spending(txn.amount), theme::expense_style())),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(22),
        Constraint::Min(20),
        Constraint::Length(16),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                format!(
                    " Transactions: {month} ({}) total {} ",
                    txns.len(),
                    format_spending(month_total)
                ),
                theme::title_style(),
            )),
    );

    f.render_widget(table, area);
}
