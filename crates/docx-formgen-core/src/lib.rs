//! Placeholder scanning and substitution for DOCX form templates.
//!
//! This crate fills `{...}` tokens in a word-processor template with text or
//! embedded images and can append data rows to the template's first table:
//! - [`DocxPackage`]: the OPC archive held in memory, untouched parts
//!   round-tripping byte-for-byte
//! - [`scan_package`]: unique placeholder tokens in first-seen order
//! - [`substitute`]: run-preserving text rewrites and inline image splices
//! - [`fill_first_table`] / [`first_table_headers`]: the row appender
//! - [`generate`]: the whole pipeline behind one call

mod error;
mod generate;
mod media;
mod package;
mod placeholder;
mod replace;
mod replacement;
mod scan;
mod table;
mod xml;

pub use error::{Error, Result};
pub use generate::{detect_placeholders, generate, GenerateRequest, GenerateSummary};
pub use package::{DocxPackage, DOCUMENT_PART};
pub use placeholder::{
    classify, default_width, Placeholder, PlaceholderKind, DEFAULT_IMAGE_WIDTH_IN,
    LOGO_IMAGE_WIDTH_IN,
};
pub use replace::{substitute, SubstitutionReport};
pub use replacement::{ImageReplacement, Replacements};
pub use scan::scan_package;
pub use table::{fill_first_table, first_table_headers};
