//! End-to-end template generation.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::package::DocxPackage;
use crate::placeholder::Placeholder;
use crate::replace::{self, SubstitutionReport};
use crate::replacement::Replacements;
use crate::scan;
use crate::table;

/// One generation run: template in, replacements applied, optional table
/// rows, output written.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub template: PathBuf,
    pub output: PathBuf,
    pub replacements: Replacements,
    /// `Some` engages the first-table row appender (and its no-table check).
    pub table_rows: Option<Vec<Vec<String>>>,
}

/// What a generation run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerateSummary {
    pub text_replacements: usize,
    pub images_embedded: usize,
    pub rows_written: usize,
}

/// Detect placeholders in a template without mutating it.
pub fn detect_placeholders(template: &Path) -> Result<Vec<Placeholder>> {
    let pkg = DocxPackage::open(template)?;
    scan::scan_package(&pkg)
}

/// Run the full pipeline. The output is written only after every mutation
/// succeeded; a failure part-way leaves no output file behind.
pub fn generate(request: &GenerateRequest) -> Result<GenerateSummary> {
    let mut pkg = DocxPackage::open(&request.template)?;
    let SubstitutionReport {
        text_replacements,
        images_embedded,
    } = replace::substitute(&mut pkg, &request.replacements)?;
    let rows_written = match &request.table_rows {
        Some(rows) => table::fill_first_table(&mut pkg, rows)?,
        None => 0,
    };
    pkg.save(&request.output)?;
    info!(
        "Generated {:?} from {:?} ({} text, {} image(s), {} row(s))",
        request.output, request.template, text_replacements, images_embedded, rows_written
    );
    Ok(GenerateSummary {
        text_replacements,
        images_embedded,
        rows_written,
    })
}
