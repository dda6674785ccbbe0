//! Placeholder scanning over a package's text-bearing parts.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::package::DocxPackage;
use crate::placeholder::Placeholder;

/// `{...}`: opening brace to the next closing brace, no nesting. Empty
/// braces match; an unterminated brace does not.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{.*?\}").expect("token pattern"));

/// Unique placeholder tokens in first-seen order: document body first (body
/// paragraphs and table-cell paragraphs interleaved in document order), then
/// headers, then footers. Matching runs against each paragraph's
/// concatenated run text, so tokens the editor split across runs are found.
pub fn scan_package(pkg: &DocxPackage) -> Result<Vec<Placeholder>> {
    let mut tokens: Vec<String> = Vec::new();
    for part in pkg.text_parts() {
        let xml = pkg.xml(&part)?;
        let doc = roxmltree::Document::parse(&xml).map_err(|source| Error::Xml {
            part: part.clone(),
            source,
        })?;
        for node in doc
            .descendants()
            .filter(|n| n.tag_name().name() == "p")
        {
            let text = paragraph_text(&node);
            for m in TOKEN_RE.find_iter(&text) {
                if !tokens.iter().any(|t| t == m.as_str()) {
                    tokens.push(m.as_str().to_string());
                }
            }
        }
    }
    debug!("Detected {} unique placeholder(s)", tokens.len());
    Ok(tokens.into_iter().map(Placeholder::from_token).collect())
}

/// Concatenated `<w:t>` text content of a paragraph node.
fn paragraph_text(node: &roxmltree::Node) -> String {
    let mut text = String::new();
    for desc in node.descendants() {
        if desc.tag_name().name() == "t" {
            if let Some(t) = desc.text() {
                text.push_str(t);
            }
        }
    }
    text
}
