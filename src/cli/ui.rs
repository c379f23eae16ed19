use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right aligned cell for a quoted value.
pub fn value_cell(text: &str) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Creates a cell for displaying percentage change with color coding.
///
/// Values that do not parse as a number are shown as-is in grey.
pub fn change_cell(change: &str) -> Cell {
    match change.parse::<f64>() {
        Ok(value) => {
            let color = if value >= 0.0 { Color::Green } else { Color::Red };
            Cell::new(format!("{value:.2}%"))
                .fg(color)
                .set_alignment(CellAlignment::Right)
        }
        Err(_) => Cell::new(change)
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
    }
}
