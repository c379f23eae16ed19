use super::ui;
use crate::core::Quote;
use comfy_table::Cell;

/// Renders stored quotes as a table, newest first.
pub fn display_history(quotes: &[Quote]) -> String {
    if quotes.is_empty() {
        return ui::style_text("No quotes recorded yet", ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Pair"),
        ui::header_cell("Bid"),
        ui::header_cell("Ask"),
        ui::header_cell("High"),
        ui::header_cell("Low"),
        ui::header_cell("Change"),
    ]);

    for quote in quotes {
        table.add_row(vec![
            Cell::new(&quote.create_date),
            Cell::new(format!("{}/{}", quote.code, quote.codein)),
            ui::value_cell(&quote.bid),
            ui::value_cell(&quote.ask),
            ui::value_cell(&quote.high),
            ui::value_cell(&quote.low),
            ui::change_cell(&quote.pct_change),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Recorded quotes", ui::StyleType::Title),
        table
    )
}
