//! Console output for the CLI: status notes and the command table that
//! `slashforge check` prints.

use std::fmt::Write as _;

use crate::check_cmd::CheckRow;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Descriptions longer than this are cut with an ellipsis.
const DESCRIPTION_WIDTH: usize = 60;

/// `NO_COLOR` always wins; otherwise color needs a capable terminal.
pub fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
        && (std::env::var_os("COLORTERM").is_some()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Note {
    Info,
    Success,
    Warn,
    Error,
}

impl Note {
    pub fn format(self, msg: &str, color: bool) -> String {
        let (code, glyph, label) = match self {
            Note::Info => (CYAN, "ℹ", "INFO"),
            Note::Success => (GREEN, "✓", "OK"),
            Note::Warn => (YELLOW, "⚠", "WARN"),
            Note::Error => (RED, "✗", "ERROR"),
        };
        if color {
            format!("{code}{BOLD}{glyph}{RESET} {msg}")
        } else {
            format!("{label}: {msg}")
        }
    }
}

/// Print a one-line note. Errors go to stderr.
pub fn note(kind: Note, msg: &str) {
    let line = kind.format(msg, use_color());
    match kind {
        Note::Error => eprintln!("{line}"),
        _ => println!("{line}"),
    }
}

/// Render the registered commands as an aligned table.
pub fn command_table(rows: &[CheckRow], color: bool) -> String {
    const HEADERS: [&str; 4] = ["Command", "Description", "Options", "Source"];

    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            [
                format!("/{}", row.name),
                truncate(&row.description, DESCRIPTION_WIDTH),
                row.options.to_string(),
                row.source.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let [name_w, desc_w, opts_w, _] = widths;
    let (bold, dim, reset) = if color { (BOLD, DIM, RESET) } else { ("", "", "") };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{bold}{:<name_w$}  {:<desc_w$}  {:>opts_w$}  {}{reset}",
        HEADERS[0], HEADERS[1], HEADERS[2], HEADERS[3]
    );
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));
    for [name, description, options, source] in &cells {
        let _ = writeln!(
            out,
            "{name:<name_w$}  {description:<desc_w$}  {options:>opts_w$}  {dim}{source}{reset}"
        );
    }
    if cells.is_empty() {
        let _ = writeln!(out, "(no commands)");
    }
    out
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
