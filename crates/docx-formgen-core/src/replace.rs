//! The substitution engine: run-preserving text rewrites and inline image
//! splices applied to every text-bearing part.

use std::collections::BTreeMap;
use std::collections::HashMap;

use tracing::info;

use crate::error::Result;
use crate::media;
use crate::package::DocxPackage;
use crate::replacement::{ImageReplacement, Replacements};
use crate::xml;

/// Counts of substitutions applied across the package.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SubstitutionReport {
    pub text_replacements: usize,
    pub images_embedded: usize,
}

/// Apply the replacement map to every matching location in the package.
///
/// One pass per placeholder: a second run with the same map finds no tokens
/// and leaves the package unchanged.
pub fn substitute(pkg: &mut DocxPackage, replacements: &Replacements) -> Result<SubstitutionReport> {
    let mut report = SubstitutionReport::default();
    let mut cache = ImageCache::default();
    for part in pkg.text_parts() {
        let mut part_xml = pkg.xml(&part)?;
        let replaced = substitute_text(&mut part_xml, &replacements.text);
        let embedded =
            substitute_images(pkg, &part, &mut part_xml, &replacements.images, &mut cache)?;
        if replaced > 0 || embedded > 0 {
            pkg.set_xml(&part, part_xml);
            info!(
                "Substituted {} text and {} image placeholder(s) in {}",
                replaced, embedded, part
            );
        }
        report.text_replacements += replaced;
        report.images_embedded += embedded;
    }
    Ok(report)
}

// ── Text substitution ───────────────────────────────────────────

fn substitute_text(part_xml: &mut String, rules: &BTreeMap<String, String>) -> usize {
    if rules.is_empty() {
        return 0;
    }
    let mut total = 0;
    // Reverse order so splices don't shift earlier paragraph offsets.
    for (p_start, p_end) in xml::paragraph_blocks(part_xml).into_iter().rev() {
        let para = part_xml[p_start..p_end].to_string();
        if let Some((rebuilt, count)) = rewrite_paragraph_text(&para, rules) {
            part_xml.replace_range(p_start..p_end, &rebuilt);
            total += count;
        }
    }
    total
}

/// Replace tokens within one paragraph, distributing the result back into
/// the original runs: each replacement lands in the run where its match
/// starts, matched remainders in later runs are deleted, and untouched runs
/// keep their text and formatting.
fn rewrite_paragraph_text(
    para: &str,
    rules: &BTreeMap<String, String>,
) -> Option<(String, usize)> {
    let wts = xml::wt_elements(para);
    if wts.is_empty() {
        return None;
    }

    // Virtual paragraph text with a char-to-element mapping.
    let mut chars: Vec<char> = Vec::new();
    let mut owner: Vec<usize> = Vec::new();
    for (idx, wt) in wts.iter().enumerate() {
        for c in wt.text.chars() {
            chars.push(c);
            owner.push(idx);
        }
    }
    if chars.is_empty() {
        return None;
    }

    // Claim non-overlapping matches across all rules.
    let mut matches: Vec<(usize, usize, &str)> = Vec::new();
    for (name, value) in rules {
        let token: Vec<char> = format!("{{{name}}}").chars().collect();
        let mut pos = 0;
        while pos + token.len() <= chars.len() {
            if chars[pos..pos + token.len()] == token[..] {
                let end = pos + token.len();
                if !matches.iter().any(|&(s, e, _)| pos < e && end > s) {
                    matches.push((pos, end, value.as_str()));
                }
                pos = end;
            } else {
                pos += 1;
            }
        }
    }
    if matches.is_empty() {
        return None;
    }
    matches.sort_by_key(|&(s, _, _)| s);

    let mut new_texts: Vec<String> = vec![String::new(); wts.len()];
    let mut i = 0;
    let mut m = 0;
    while i < chars.len() {
        if m < matches.len() && matches[m].0 == i {
            new_texts[owner[i]].push_str(matches[m].2);
            i = matches[m].1;
            m += 1;
        } else {
            new_texts[owner[i]].push(chars[i]);
            i += 1;
        }
    }

    let mut rebuilt = para.to_string();
    for (idx, wt) in wts.iter().enumerate().rev() {
        if new_texts[idx] != wt.text {
            rebuilt.replace_range(wt.start..wt.end, &xml::render_wt(&new_texts[idx]));
        }
    }
    Some((rebuilt, matches.len()))
}

// ── Image substitution ──────────────────────────────────────────

/// Media already loaded and added to the package, shared across parts.
#[derive(Default)]
struct ImageCache {
    media: HashMap<String, EmbeddedMedia>,
}

#[derive(Clone)]
struct EmbeddedMedia {
    media_name: String,
    cx: u64,
    cy: u64,
}

impl ImageCache {
    /// Load lazily: a bad path only fails once its token actually occurs.
    fn load(
        &mut self,
        pkg: &mut DocxPackage,
        name: &str,
        spec: &ImageReplacement,
    ) -> Result<EmbeddedMedia> {
        use std::collections::hash_map::Entry;
        match self.media.entry(name.to_string()) {
            Entry::Occupied(e) => Ok(e.get().clone()),
            Entry::Vacant(e) => {
                let img = media::load_image(&spec.path)?;
                let (cx, cy) = img.extent_emu(spec.width);
                let media_name = pkg.add_media(img.bytes, img.ext, img.content_type)?;
                info!(
                    "Embedded {:?} as {} ({}x{} px, {:.2}\" wide)",
                    spec.path, media_name, img.width_px, img.height_px, spec.width
                );
                Ok(e.insert(EmbeddedMedia { media_name, cx, cy }).clone())
            }
        }
    }
}

fn substitute_images(
    pkg: &mut DocxPackage,
    part: &str,
    part_xml: &mut String,
    rules: &BTreeMap<String, ImageReplacement>,
    cache: &mut ImageCache,
) -> Result<usize> {
    let mut embedded = 0;
    for (name, spec) in rules {
        let token = format!("{{{name}}}");
        // Each splice consumes every occurrence in its paragraph, so this
        // terminates once no paragraph mentions the token.
        while let Some(site) = find_token_paragraph(part_xml, &token) {
            let media = cache.load(pkg, name, spec)?;
            let rid = pkg.relate_image(part, &media.media_name)?;
            let doc_pr = pkg.next_drawing_id();
            let rebuilt = splice_paragraph(
                &part_xml[site.start..site.end],
                &site.before,
                &site.after,
                &drawing_run_xml(&rid, doc_pr, name, media.cx, media.cy),
            );
            part_xml.replace_range(site.start..site.end, &rebuilt);
            embedded += 1;
        }
    }
    Ok(embedded)
}

struct SpliceSite {
    start: usize,
    end: usize,
    before: String,
    after: String,
}

/// First paragraph whose concatenated run text contains the token, split at
/// the first occurrence. Later occurrences in the same paragraph are dropped
/// from the trailing segment (one image per paragraph).
fn find_token_paragraph(part_xml: &str, token: &str) -> Option<SpliceSite> {
    for (p_start, p_end) in xml::paragraph_blocks(part_xml) {
        let para = &part_xml[p_start..p_end];
        let text: String = xml::wt_elements(para).iter().map(|wt| wt.text.as_str()).collect();
        if let Some(at) = text.find(token) {
            let before = text[..at].to_string();
            let after = text[at + token.len()..].replace(token, "");
            return Some(SpliceSite {
                start: p_start,
                end: p_end,
                before,
                after,
            });
        }
    }
    None
}

/// Rebuild a paragraph as before-text, drawing, after-text. The paragraph's
/// open tag and properties survive (recentered); the first run's formatting
/// carries onto the synthesized text runs.
fn splice_paragraph(para: &str, before: &str, after: &str, drawing: &str) -> String {
    let open_end = para.find('>').map(|i| i + 1).unwrap_or(0);
    let ppr = xml::centered_properties(xml::paragraph_properties(para));
    let rpr = xml::first_run_properties(para).unwrap_or_default();

    let mut out = String::with_capacity(para.len() + drawing.len());
    out.push_str(&para[..open_end]);
    out.push_str(&ppr);
    if !before.is_empty() {
        out.push_str("<w:r>");
        out.push_str(rpr);
        out.push_str(&xml::render_wt(before));
        out.push_str("</w:r>");
    }
    out.push_str(drawing);
    if !after.is_empty() {
        out.push_str("<w:r>");
        out.push_str(rpr);
        out.push_str(&xml::render_wt(after));
        out.push_str("</w:r>");
    }
    out.push_str("</w:p>");
    out
}

fn drawing_run_xml(rid: &str, id: usize, name: &str, cx: u64, cy: u64) -> String {
    let alt = xml::escape_text(name).replace('"', "&quot;");
    format!(
        concat!(
            "<w:r><w:drawing>",
            "<wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\" ",
            "xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\">",
            "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
            "<wp:effectExtent l=\"0\" t=\"0\" r=\"0\" b=\"0\"/>",
            "<wp:docPr id=\"{id}\" name=\"{name}\"/>",
            "<wp:cNvGraphicFramePr>",
            "<a:graphicFrameLocks xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" noChangeAspect=\"1\"/>",
            "</wp:cNvGraphicFramePr>",
            "<a:graphic xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">",
            "<a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:pic xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:nvPicPr><pic:cNvPr id=\"{id}\" name=\"{name}\"/><pic:cNvPicPr/></pic:nvPicPr>",
            "<pic:blipFill>",
            "<a:blip r:embed=\"{rid}\" xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"/>",
            "<a:stretch><a:fillRect/></a:stretch>",
            "</pic:blipFill>",
            "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
            "</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"
        ),
        cx = cx,
        cy = cy,
        id = id,
        name = alt,
        rid = rid,
    )
}
