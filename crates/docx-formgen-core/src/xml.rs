//! Ranged string edits over WordprocessingML part XML.
//!
//! Rewrites are performed as byte-range splices on the part text rather than
//! through a DOM rebuild, so everything the template carries that we do not
//! touch (styles, themes, settings, revision ids) survives byte-for-byte.

use once_cell::sync::Lazy;
use regex::Regex;

/// A `<w:t>` element inside a paragraph slice.
#[derive(Debug, Clone)]
pub(crate) struct WtElement {
    /// Byte offset of `<w:t` within the paragraph slice.
    pub start: usize,
    /// Byte offset just past the element's end.
    pub end: usize,
    /// Unescaped text content (empty for self-closing elements).
    pub text: String,
}

static WT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<w:t(?:\s[^>]*)?(?:/>|>([^<]*)</w:t>)").expect("w:t pattern"));

/// All `<w:t>` elements of a paragraph slice, in document order.
pub(crate) fn wt_elements(para_xml: &str) -> Vec<WtElement> {
    WT_RE
        .captures_iter(para_xml)
        .map(|caps| {
            let full = caps.get(0).expect("match");
            let text = caps
                .get(1)
                .map(|m| unescape_text(m.as_str()))
                .unwrap_or_default();
            WtElement {
                start: full.start(),
                end: full.end(),
                text,
            }
        })
        .collect()
}

/// Render a `<w:t>` element, adding `xml:space="preserve"` when the text has
/// edge whitespace that Word would otherwise strip.
pub(crate) fn render_wt(text: &str) -> String {
    let escaped = escape_text(text);
    let edge_ws = text.starts_with(|c: char| c.is_whitespace())
        || text.ends_with(|c: char| c.is_whitespace());
    if edge_ws {
        format!("<w:t xml:space=\"preserve\">{escaped}</w:t>")
    } else {
        format!("<w:t>{escaped}</w:t>")
    }
}

/// Escape text content for insertion into an XML text node.
pub(crate) fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Resolve the named entities DOCX writers emit in text nodes.
pub(crate) fn unescape_text(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Position of the next `<tag ...>` start, scanning from `from`.
/// Returns the offset of `<` and whether the element is self-closing.
pub(crate) fn next_element_start(xml: &str, from: usize, tag: &str) -> Option<(usize, bool)> {
    let needle = format!("<{tag}");
    let bytes = xml.as_bytes();
    let mut pos = from;
    while let Some(off) = xml.get(pos..)?.find(&needle) {
        let start = pos + off;
        let after = start + needle.len();
        match bytes.get(after) {
            Some(b' ' | b'>' | b'/' | b'\t' | b'\r' | b'\n') => {
                let tag_end = xml[after..].find('>').map(|i| after + i)?;
                let self_closing = bytes[tag_end - 1] == b'/';
                return Some((start, self_closing));
            }
            _ => pos = after,
        }
    }
    None
}

/// Byte range of the element whose open tag sits at `start`, spanning through
/// the matching `</tag>`. Handles same-tag nesting (e.g. tables in cells).
pub(crate) fn element_block(xml: &str, start: usize, tag: &str) -> Option<(usize, usize)> {
    let close = format!("</{tag}>");
    let mut depth = 0usize;
    let mut pos = start;
    loop {
        let next_open = next_element_start(xml, pos, tag);
        let next_close = xml[pos..].find(&close).map(|i| pos + i);
        match (next_open, next_close) {
            (Some((open, self_closing)), Some(c)) if open < c => {
                if !self_closing {
                    depth += 1;
                }
                pos = open + tag.len() + 1;
            }
            (_, Some(c)) => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some((start, c + close.len()));
                }
                pos = c + close.len();
            }
            _ => return None,
        }
    }
}

/// All `<w:p>` paragraph blocks in a part, in document order. Paragraphs
/// inside table cells are included; self-closing `<w:p/>` markers are not.
pub(crate) fn paragraph_blocks(xml: &str) -> Vec<(usize, usize)> {
    let mut blocks = Vec::new();
    let mut pos = 0;
    while let Some((start, self_closing)) = next_element_start(xml, pos, "w:p") {
        if self_closing {
            pos = start + "<w:p".len();
            continue;
        }
        match element_block(xml, start, "w:p") {
            Some((s, e)) => {
                blocks.push((s, e));
                pos = e;
            }
            None => break,
        }
    }
    blocks
}

/// Blocks of `tag` children between `from` and `to`, jumping over the content
/// of nested `skip` elements (rows of a table, ignoring nested tables).
pub(crate) fn child_element_blocks(
    xml: &str,
    from: usize,
    to: usize,
    tag: &str,
    skip: &str,
) -> Vec<(usize, usize)> {
    let mut blocks = Vec::new();
    let mut pos = from;
    while pos < to {
        let next_child = next_element_start(xml, pos, tag).filter(|&(s, _)| s < to);
        let next_skip = next_element_start(xml, pos, skip).filter(|&(s, _)| s < to);
        match (next_child, next_skip) {
            (Some((cs, _)), Some((ss, skip_self_closing))) if ss < cs => {
                pos = if skip_self_closing {
                    ss + skip.len() + 1
                } else {
                    match element_block(xml, ss, skip) {
                        Some((_, se)) => se,
                        None => break,
                    }
                };
            }
            (Some((cs, self_closing)), _) => {
                if self_closing {
                    pos = cs + tag.len() + 1;
                    continue;
                }
                match element_block(xml, cs, tag) {
                    Some((s, e)) if e <= to => {
                        blocks.push((s, e));
                        pos = e;
                    }
                    _ => break,
                }
            }
            (None, _) => break,
        }
    }
    blocks
}

/// The paragraph's `<w:pPr>` block, if present.
pub(crate) fn paragraph_properties(para_xml: &str) -> Option<&str> {
    let (start, self_closing) = next_element_start(para_xml, 0, "w:pPr")?;
    if self_closing {
        let end = para_xml[start..].find('>').map(|i| start + i + 1)?;
        return Some(&para_xml[start..end]);
    }
    let (s, e) = element_block(para_xml, start, "w:pPr")?;
    Some(&para_xml[s..e])
}

/// The first run's `<w:rPr>` block, carried onto synthesized runs so spliced
/// text keeps the character formatting of the run it replaces. The search
/// starts past `<w:pPr>`, whose paragraph-mark `<w:rPr>` is not a run.
pub(crate) fn first_run_properties(para_xml: &str) -> Option<&str> {
    let from = paragraph_properties(para_xml)
        .map(|ppr| ppr.as_ptr() as usize - para_xml.as_ptr() as usize + ppr.len())
        .unwrap_or(0);
    let (start, self_closing) = next_element_start(para_xml, from, "w:rPr")?;
    if self_closing {
        return None;
    }
    let (s, e) = element_block(para_xml, start, "w:rPr")?;
    Some(&para_xml[s..e])
}

static JC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<w:jc[^>]*/>").expect("w:jc pattern"));

/// Paragraph properties rewritten with centered justification, preserving the
/// rest of the existing block.
pub(crate) fn centered_properties(ppr: Option<&str>) -> String {
    const JC: &str = "<w:jc w:val=\"center\"/>";
    match ppr {
        None => format!("<w:pPr>{JC}</w:pPr>"),
        Some(block) if !block.ends_with("</w:pPr>") => format!("<w:pPr>{JC}</w:pPr>"),
        Some(block) => {
            let stripped = JC_RE.replace_all(block, "");
            let mut out = stripped.into_owned();
            let at = out.len() - "</w:pPr>".len();
            out.insert_str(at, JC);
            out
        }
    }
}
