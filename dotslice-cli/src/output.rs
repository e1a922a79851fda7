//! Output helpers shared by the commands.

use comfy_table::{presets, CellAlignment, Table};
use serde::Serialize;

use crate::app::GlobalOptions;

/// Prints `data` as JSON when `--json` is given, otherwise runs `human`.
pub fn print_output<T: Serialize>(
    data: &T,
    opts: &GlobalOptions,
    human: impl FnOnce(&T),
) -> anyhow::Result<()> {
    if opts.json {
        println!("{}", serde_json::to_string_pretty(data)?);
    } else {
        human(data);
    }
    Ok(())
}

/// Prints a titled, borderless table indented by two spaces; nothing if `rows` is empty.
///
/// Columns whose index is listed in `right` are right aligned.
pub fn print_table(title: &str, headers: &[&str], right: &[usize], rows: Vec<Vec<String>>) {
    if rows.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.load_preset(presets::NOTHING).set_header(headers.to_vec());
    for index in right {
        if let Some(column) = table.column_mut(*index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    for row in rows {
        table.add_row(row);
    }

    println!("\n{title}:");
    for line in table.to_string().lines() {
        println!("  {}", line.trim_end());
    }
}
