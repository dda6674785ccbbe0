//! Header detection and row filling for the template's first table.

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::package::{DocxPackage, DOCUMENT_PART};
use crate::xml;

/// Single-line border applied to all four sides of every touched cell,
/// replacing whatever border definition the cell carried.
const CELL_BORDERS: &str = concat!(
    "<w:tcBorders>",
    "<w:top w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
    "<w:left w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
    "<w:bottom w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
    "<w:right w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>",
    "</w:tcBorders>"
);

/// Column headers from row 0 of the first table.
///
/// Fails with [`Error::NoTables`] when the document has no usable table
/// (none at all, or the first one has no rows).
pub fn first_table_headers(pkg: &DocxPackage) -> Result<Vec<String>> {
    let xml_text = pkg.xml(DOCUMENT_PART)?;
    let (ts, te) = first_table(&xml_text)?;
    let rows = xml::child_element_blocks(&xml_text, ts + "<w:tbl".len(), te, "w:tr", "w:tbl");
    let (hs, he) = *rows.first().ok_or(Error::NoTables)?;
    Ok(row_cell_texts(&xml_text[hs..he]))
}

/// Write data rows into the first table. Row `i` (0-based) overwrites table
/// row `i + 1` when it exists and is appended otherwise; each touched row
/// gets the uniform cell border. Rows wider than the header are truncated.
pub fn fill_first_table(pkg: &mut DocxPackage, rows: &[Vec<String>]) -> Result<usize> {
    let mut xml_text = pkg.xml(DOCUMENT_PART)?;
    let (ts, te) = first_table(&xml_text)?;
    let mut table = xml_text[ts..te].to_string();

    let row_blocks =
        xml::child_element_blocks(&table, "<w:tbl".len(), table.len(), "w:tr", "w:tbl");
    let (hs, he) = *row_blocks.first().ok_or(Error::NoTables)?;
    let ncols = row_cell_texts(&table[hs..he]).len();

    let mut overwrites: Vec<(usize, &[String])> = Vec::new();
    let mut appends: Vec<&[String]> = Vec::new();
    for (i, values) in rows.iter().enumerate() {
        let values = clamp_values(values, ncols);
        if row_blocks.get(i + 1).is_some() {
            overwrites.push((i + 1, values));
        } else {
            appends.push(values);
        }
    }

    // Reverse order keeps earlier block offsets valid while splicing.
    for &(ri, values) in overwrites.iter().rev() {
        let (rs, rend) = row_blocks[ri];
        let rebuilt = rewrite_row(&table[rs..rend], values);
        table.replace_range(rs..rend, &rebuilt);
    }

    if !appends.is_empty() {
        let at = table.len() - "</w:tbl>".len();
        let mut block = String::new();
        for values in &appends {
            block.push_str(&new_row_xml(values, ncols));
        }
        table.insert_str(at, &block);
    }

    xml_text.replace_range(ts..te, &table);
    pkg.set_xml(DOCUMENT_PART, xml_text);
    info!(
        "Wrote {} data row(s) into the first table ({} overwritten, {} appended)",
        rows.len(),
        overwrites.len(),
        appends.len()
    );
    Ok(rows.len())
}

fn first_table(xml_text: &str) -> Result<(usize, usize)> {
    let mut pos = 0;
    while let Some((start, self_closing)) = xml::next_element_start(xml_text, pos, "w:tbl") {
        if self_closing {
            pos = start + "<w:tbl".len();
            continue;
        }
        return xml::element_block(xml_text, start, "w:tbl").ok_or(Error::NoTables);
    }
    Err(Error::NoTables)
}

fn row_cell_texts(row_xml: &str) -> Vec<String> {
    xml::child_element_blocks(row_xml, 0, row_xml.len(), "w:tc", "w:tbl")
        .into_iter()
        .map(|(cs, ce)| {
            xml::wt_elements(&row_xml[cs..ce])
                .iter()
                .map(|wt| wt.text.as_str())
                .collect::<String>()
                .trim()
                .to_string()
        })
        .collect()
}

fn clamp_values<'a>(values: &'a [String], ncols: usize) -> &'a [String] {
    if values.len() > ncols {
        warn!(
            "Row has {} value(s) for {} column(s); extra values dropped",
            values.len(),
            ncols
        );
        &values[..ncols]
    } else {
        values
    }
}

/// Overwrite a row in place: border every cell, set cell text positionally.
/// Cells past the supplied values keep their content.
fn rewrite_row(row_xml: &str, values: &[String]) -> String {
    let cells = xml::child_element_blocks(row_xml, 0, row_xml.len(), "w:tc", "w:tbl");
    let mut out = row_xml.to_string();
    for (j, &(cs, ce)) in cells.iter().enumerate().rev() {
        let rebuilt = rewrite_cell(&out[cs..ce], values.get(j).map(|s| s.as_str()));
        out.replace_range(cs..ce, &rebuilt);
    }
    out
}

fn rewrite_cell(cell_xml: &str, value: Option<&str>) -> String {
    let bordered = apply_cell_borders(cell_xml);
    match value {
        Some(value) => set_cell_text(&bordered, value),
        None => bordered,
    }
}

fn apply_cell_borders(cell_xml: &str) -> String {
    let mut out = cell_xml.to_string();
    let open_end = match out.find('>') {
        Some(i) => i + 1,
        None => return out,
    };
    // The cell's own properties block sits directly after the open tag;
    // anything later belongs to nested content.
    let own_tcpr = xml::next_element_start(&out, open_end, "w:tcPr")
        .filter(|&(ps, _)| out[open_end..ps].trim().is_empty());
    match own_tcpr {
        Some((ps, true)) => {
            if let Some(pe) = out[ps..].find('>').map(|i| ps + i + 1) {
                out.replace_range(ps..pe, &format!("<w:tcPr>{CELL_BORDERS}</w:tcPr>"));
            }
        }
        Some((ps, false)) => {
            if let Some((_, pe)) = xml::element_block(&out, ps, "w:tcPr") {
                let mut pr = out[ps..pe].to_string();
                match xml::next_element_start(&pr, 0, "w:tcBorders") {
                    Some((bs, self_closing)) => {
                        let be = if self_closing {
                            pr[bs..].find('>').map(|i| bs + i + 1)
                        } else {
                            xml::element_block(&pr, bs, "w:tcBorders").map(|(_, e)| e)
                        };
                        if let Some(be) = be {
                            pr.replace_range(bs..be, CELL_BORDERS);
                        }
                    }
                    None => {
                        let at = pr.len() - "</w:tcPr>".len();
                        pr.insert_str(at, CELL_BORDERS);
                    }
                }
                out.replace_range(ps..pe, &pr);
            }
        }
        None => out.insert_str(open_end, &format!("<w:tcPr>{CELL_BORDERS}</w:tcPr>")),
    }
    out
}

/// Replace the cell's content with a single paragraph holding `value`,
/// keeping the cell properties and the first paragraph's style.
fn set_cell_text(cell_xml: &str, value: &str) -> String {
    let open_end = match cell_xml.find('>') {
        Some(i) => i + 1,
        None => return cell_xml.to_string(),
    };
    let content_start = match xml::next_element_start(cell_xml, open_end, "w:tcPr") {
        Some((ps, self_closing)) if cell_xml[open_end..ps].trim().is_empty() => {
            if self_closing {
                cell_xml[ps..].find('>').map(|i| ps + i + 1).unwrap_or(open_end)
            } else {
                xml::element_block(cell_xml, ps, "w:tcPr")
                    .map(|(_, e)| e)
                    .unwrap_or(open_end)
            }
        }
        _ => open_end,
    };
    let content_end = cell_xml.len() - "</w:tc>".len();
    let content = &cell_xml[content_start..content_end];
    let ppr = xml::paragraph_blocks(content)
        .first()
        .and_then(|&(ps, pe)| xml::paragraph_properties(&content[ps..pe]))
        .unwrap_or_default()
        .to_string();

    let mut out = String::with_capacity(cell_xml.len());
    out.push_str(&cell_xml[..content_start]);
    out.push_str("<w:p>");
    out.push_str(&ppr);
    out.push_str("<w:r>");
    out.push_str(&xml::render_wt(value));
    out.push_str("</w:r></w:p>");
    out.push_str("</w:tc>");
    out
}

fn new_row_xml(values: &[String], ncols: usize) -> String {
    let mut out = String::from("<w:tr>");
    for j in 0..ncols {
        let value = values.get(j).map(|s| s.as_str()).unwrap_or("");
        out.push_str("<w:tc><w:tcPr>");
        out.push_str(CELL_BORDERS);
        out.push_str("</w:tcPr><w:p><w:r>");
        out.push_str(&xml::render_wt(value));
        out.push_str("</w:r></w:p></w:tc>");
    }
    out.push_str("</w:tr>");
    out
}
