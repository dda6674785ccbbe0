//! OPC package access for `.docx` archives.
//!
//! The archive is held as an ordered list of `(entry name, bytes)` pairs.
//! Parts we never touch are written back verbatim, so the template's styles,
//! numbering, and settings survive the round trip unchanged.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// The main document part of a WordprocessingML package.
pub const DOCUMENT_PART: &str = "word/document.xml";

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const RELS_SKELETON: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "</Relationships>"
);

static MEDIA_SEQ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"word/media/image(\d+)\.").expect("media pattern"));
static DOC_PR_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<wp:docPr [^>]*id="(\d+)""#).expect("docPr pattern"));
static REL_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"Id="rId(\d+)""#).expect("rId pattern"));
static REL_ELEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<Relationship\s[^>]*>").expect("relationship pattern"));

/// A `.docx` package loaded into memory.
pub struct DocxPackage {
    entries: Vec<(String, Vec<u8>)>,
    media_seq: usize,
    drawing_seq: usize,
}

impl DocxPackage {
    /// Load a package from disk and validate that it carries a parseable
    /// main document part.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            entries.push((entry.name().to_string(), data));
        }

        let pkg = Self {
            media_seq: next_media_seq(&entries),
            drawing_seq: next_drawing_seq(&entries),
            entries,
        };

        let document = pkg.xml(DOCUMENT_PART)?;
        roxmltree::Document::parse(&document).map_err(|source| Error::Xml {
            part: DOCUMENT_PART.to_string(),
            source,
        })?;

        debug!("Opened package from {:?} ({} entries)", path, pkg.entries.len());
        Ok(pkg)
    }

    /// Persist the package, creating the destination directory if absent.
    /// Media entries are stored uncompressed, everything else deflated.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        let mut writer = ZipWriter::new(file);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in &self.entries {
            let opts = if name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            writer.start_file(name.clone(), opts)?;
            writer.write_all(data)?;
        }
        writer.finish()?;
        info!("Wrote package to {:?}", path);
        Ok(())
    }

    /// Whether the package contains the named part.
    pub fn has_part(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Text content of an XML part.
    pub fn xml(&self, name: &str) -> Result<String> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| String::from_utf8_lossy(data).into_owned())
            .ok_or_else(|| Error::MissingPart(name.to_string()))
    }

    /// Replace (or add) an XML part's content.
    pub fn set_xml(&mut self, name: &str, xml: String) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, data)) => *data = xml.into_bytes(),
            None => self.entries.push((name.to_string(), xml.into_bytes())),
        }
    }

    /// Text-bearing parts in traversal order: the document first, then
    /// headers, then footers (each group in part-name order).
    pub fn text_parts(&self) -> Vec<String> {
        let mut parts = vec![DOCUMENT_PART.to_string()];
        let group = |prefix: &str, parts: &mut Vec<String>| {
            let mut names: Vec<String> = self
                .entries
                .iter()
                .filter(|(n, _)| n.starts_with(prefix) && n.ends_with(".xml"))
                .map(|(n, _)| n.clone())
                .collect();
            names.sort();
            parts.extend(names);
        };
        group("word/header", &mut parts);
        group("word/footer", &mut parts);
        parts
    }

    /// Add an image payload under `word/media/` and register its extension
    /// in `[Content_Types].xml`. Returns the media part name.
    pub(crate) fn add_media(
        &mut self,
        bytes: Vec<u8>,
        ext: &str,
        content_type: &str,
    ) -> Result<String> {
        let name = format!("word/media/image{}.{ext}", self.media_seq);
        self.media_seq += 1;
        self.entries.push((name.clone(), bytes));
        self.ensure_default_content_type(ext, content_type)?;
        debug!("Added media part {}", name);
        Ok(name)
    }

    /// Relate `media_name` to `part` as an image, creating the part's `.rels`
    /// when absent. Returns the relationship id; an existing relationship to
    /// the same target is reused.
    pub(crate) fn relate_image(&mut self, part: &str, media_name: &str) -> Result<String> {
        let (dir, file) = part
            .rsplit_once('/')
            .ok_or_else(|| Error::MissingPart(part.to_string()))?;
        let rels_name = format!("{dir}/_rels/{file}.rels");
        let target = media_name
            .strip_prefix(&format!("{dir}/"))
            .unwrap_or(media_name)
            .to_string();

        let rels = match self.xml(&rels_name) {
            Ok(xml) => xml,
            Err(Error::MissingPart(_)) => RELS_SKELETON.to_string(),
            Err(e) => return Err(e),
        };

        let target_attr = format!("Target=\"{target}\"");
        for elem in REL_ELEM_RE.find_iter(&rels) {
            if elem.as_str().contains(&target_attr) {
                if let Some(id) = extract_rel_id(elem.as_str()) {
                    return Ok(id);
                }
            }
        }

        let next = REL_ID_RE
            .captures_iter(&rels)
            .filter_map(|c| c[1].parse::<usize>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let rid = format!("rId{next}");
        let relationship =
            format!("<Relationship Id=\"{rid}\" Type=\"{IMAGE_REL_TYPE}\" Target=\"{target}\"/>");
        let updated = match rels.rfind("</Relationships>") {
            Some(at) => {
                let mut out = rels;
                out.insert_str(at, &relationship);
                out
            }
            None => return Err(Error::MissingPart(rels_name)),
        };
        self.set_xml(&rels_name, updated);
        debug!("Related {} to {} as {}", media_name, part, rid);
        Ok(rid)
    }

    /// A fresh `wp:docPr` id, unique within the package.
    pub(crate) fn next_drawing_id(&mut self) -> usize {
        let id = self.drawing_seq;
        self.drawing_seq += 1;
        id
    }

    fn ensure_default_content_type(&mut self, ext: &str, content_type: &str) -> Result<()> {
        let types = self.xml(CONTENT_TYPES_PART)?;
        if types.contains(&format!("Extension=\"{ext}\"")) {
            return Ok(());
        }
        let default = format!("<Default Extension=\"{ext}\" ContentType=\"{content_type}\"/>");
        let at = types
            .rfind("</Types>")
            .ok_or_else(|| Error::MissingPart(CONTENT_TYPES_PART.to_string()))?;
        let mut out = types;
        out.insert_str(at, &default);
        self.set_xml(CONTENT_TYPES_PART, out);
        Ok(())
    }
}

fn next_media_seq(entries: &[(String, Vec<u8>)]) -> usize {
    entries
        .iter()
        .filter_map(|(n, _)| MEDIA_SEQ_RE.captures(n))
        .filter_map(|c| c[1].parse::<usize>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

fn next_drawing_seq(entries: &[(String, Vec<u8>)]) -> usize {
    entries
        .iter()
        .filter(|(n, _)| n.ends_with(".xml"))
        .flat_map(|(_, data)| {
            let text = String::from_utf8_lossy(data).into_owned();
            DOC_PR_ID_RE
                .captures_iter(&text)
                .filter_map(|c| c[1].parse::<usize>().ok())
                .collect::<Vec<_>>()
        })
        .max()
        .unwrap_or(0)
        + 1
}

fn extract_rel_id(elem: &str) -> Option<String> {
    let at = elem.find("Id=\"")? + 4;
    let end = elem[at..].find('"')? + at;
    Some(elem[at..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bare_package() -> DocxPackage {
        let entries = vec![
            (
                CONTENT_TYPES_PART.to_string(),
                concat!(
                    "<?xml version=\"1.0\"?>",
                    "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
                    "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
                    "</Types>"
                )
                .as_bytes()
                .to_vec(),
            ),
            (
                DOCUMENT_PART.to_string(),
                b"<w:document><w:body/></w:document>".to_vec(),
            ),
        ];
        DocxPackage {
            media_seq: next_media_seq(&entries),
            drawing_seq: next_drawing_seq(&entries),
            entries,
        }
    }

    #[test]
    fn add_media_registers_content_type_once() {
        let mut pkg = bare_package();
        let first = pkg.add_media(vec![1, 2, 3], "png", "image/png").unwrap();
        let second = pkg.add_media(vec![4, 5], "png", "image/png").unwrap();
        assert_eq!(first, "word/media/image1.png");
        assert_eq!(second, "word/media/image2.png");

        let types = pkg.xml(CONTENT_TYPES_PART).unwrap();
        assert_eq!(types.matches("Extension=\"png\"").count(), 1);
    }

    #[test]
    fn relate_image_creates_rels_and_reuses_target() {
        let mut pkg = bare_package();
        let media = pkg.add_media(vec![0], "png", "image/png").unwrap();
        let first = pkg.relate_image(DOCUMENT_PART, &media).unwrap();
        let again = pkg.relate_image(DOCUMENT_PART, &media).unwrap();
        assert_eq!(first, again);

        let rels = pkg.xml("word/_rels/document.xml.rels").unwrap();
        assert!(rels.contains("Target=\"media/image1.png\""));
    }

    #[test]
    fn relate_image_allocates_past_existing_ids() {
        let mut pkg = bare_package();
        pkg.set_xml(
            "word/_rels/document.xml.rels",
            concat!(
                "<?xml version=\"1.0\"?>",
                "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
                "<Relationship Id=\"rId3\" Type=\"t\" Target=\"styles.xml\"/>",
                "</Relationships>"
            )
            .to_string(),
        );
        let media = pkg.add_media(vec![0], "png", "image/png").unwrap();
        let rid = pkg.relate_image(DOCUMENT_PART, &media).unwrap();
        assert_eq!(rid, "rId4");
    }
}
