//! Output formatting: table, JSON, plain.
//!
//! Table uses `tabled`, JSON serializes the original data via serde,
//! plain emits one identifier per line for shell pipelines.

use std::io::IsTerminal;

use owo_colors::OwoColorize;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::OutputFormat;

/// Render a list of serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serializable item. Table mode uses a pre-formatted
/// key/value detail string instead of a `Tabled` derive.
pub fn render_single<T>(format: OutputFormat, data: &T, detail: impl Fn(&T) -> String) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table | OutputFormat::Plain => detail(data),
        OutputFormat::Json => render_json(data),
    }
}

pub fn print_output(out: &str, quiet: bool) {
    if !quiet && !out.is_empty() {
        println!("{out}");
    }
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("serialization error: {e}"))
}

/// Signal bars for the scan table, colored by strength when stdout is
/// a terminal.
pub fn signal_bars(level: u8) -> String {
    const GLYPHS: [&str; 5] = ["    ", "▂   ", "▂▄  ", "▂▄▆ ", "▂▄▆█"];
    let bars = GLYPHS[usize::from(level.min(4))];

    if !std::io::stdout().is_terminal() || std::env::var("NO_COLOR").is_ok() {
        return bars.to_owned();
    }
    match level {
        0 | 1 => bars.red().to_string(),
        2 => bars.yellow().to_string(),
        _ => bars.green().to_string(),
    }
}
