//! Interactive collection of replacement values and table rows.
//!
//! Everything reads from a `BufRead` and writes prompts to a `Write`, so the
//! flows are exercised in tests with in-memory buffers.

use std::io::{BufRead, Write};

use anyhow::{ensure, Context, Result};
use docx_formgen_core::{ImageReplacement, Placeholder, PlaceholderKind, Replacements};

const SENTINEL: &str = "done";

/// Print a prompt and read one trimmed line.
pub fn ask(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;
    let mut line = String::new();
    let read = input.read_line(&mut line).context("reading input")?;
    ensure!(read > 0, "input closed before a value was supplied");
    Ok(line.trim().to_string())
}

/// Prompt for every placeholder that does not yet have a value. Image
/// placeholders are asked as file paths, text placeholders as literal
/// values; the `{done}` sentinel token is never prompted.
pub fn collect_replacements(
    placeholders: &[Placeholder],
    mut prefilled: Replacements,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<Replacements> {
    for ph in placeholders {
        if ph.is_sentinel() || prefilled.contains(&ph.name) {
            continue;
        }
        match ph.kind {
            PlaceholderKind::Image => {
                let path = ask(input, output, &format!("path to {}: ", ph.name))?;
                prefilled.set_image(&ph.name, ImageReplacement::for_placeholder(&ph.name, path));
            }
            PlaceholderKind::Text => {
                let value = ask(input, output, &format!("{}: ", ph.name))?;
                prefilled.set_text(&ph.name, value);
            }
        }
    }
    Ok(prefilled)
}

/// Prompt for data rows against the detected headers until the user types
/// `done` (case-insensitive) at any column. The row holding the sentinel is
/// discarded.
pub fn collect_table_rows(
    headers: &[String],
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<Vec<Vec<String>>> {
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    let mut rows: Vec<Vec<String>> = Vec::new();
    loop {
        writeln!(
            output,
            "\nRow {} (type '{SENTINEL}' to finish):",
            rows.len() + 1
        )?;
        let mut row = Vec::new();
        for header in headers {
            let value = ask(input, output, &format!("  {header}: "))?;
            if value.eq_ignore_ascii_case(SENTINEL) {
                return Ok(rows);
            }
            row.push(value);
        }
        rows.push(row);
    }
}
