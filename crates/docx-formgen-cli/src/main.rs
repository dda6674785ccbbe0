mod config;
mod prompt;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use docx_formgen_core::{
    detect_placeholders, first_table_headers, generate, DocxPackage, GenerateRequest,
    PlaceholderKind, Replacements,
};

use config::Config;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    run(config, &mut input, &mut output)
}

fn run(config: Config, input: &mut impl BufRead, output: &mut impl Write) -> Result<()> {
    debug!("Configuration: {:?}", config);

    let template = match config.template {
        Some(path) => path,
        None => PathBuf::from(prompt::ask(input, output, "Template document (.docx): ")?),
    };

    let placeholders = detect_placeholders(&template)
        .with_context(|| format!("Failed to scan template {:?}", template))?;
    writeln!(output, "Detected placeholders:")?;
    for ph in &placeholders {
        let kind = match ph.kind {
            PlaceholderKind::Image => "image",
            PlaceholderKind::Text => "text",
        };
        writeln!(output, "  - {} ({kind})", ph.token)?;
    }
    if config.list {
        return Ok(());
    }

    let mut prefilled = match &config.replacements {
        Some(path) => {
            let spec = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read replacement spec {:?}", path))?;
            serde_json::from_str::<Replacements>(&spec)
                .with_context(|| format!("Invalid replacement spec {:?}", path))?
        }
        None => Replacements::default(),
    };
    for arg in &config.set {
        let (name, value) = config::parse_set(arg)?;
        prefilled.set_text(name, value);
    }
    for arg in &config.image {
        let (name, image) = config::parse_image(arg)?;
        prefilled.set_image(name, image);
    }

    let replacements = prompt::collect_replacements(&placeholders, prefilled, input, output)?;

    let table_rows = if config.fill_table {
        let pkg = DocxPackage::open(&template)?;
        let headers = first_table_headers(&pkg)?;
        writeln!(output, "\nDetected table headers: {headers:?}")?;
        Some(prompt::collect_table_rows(&headers, input, output)?)
    } else {
        None
    };

    let output_path = match config.output {
        Some(path) => path,
        None => PathBuf::from(prompt::ask(input, output, "\nOutput path: ")?),
    };

    let summary = generate(&GenerateRequest {
        template,
        output: output_path.clone(),
        replacements,
        table_rows,
    })?;

    writeln!(
        output,
        "Document saved to {:?} ({} text, {} image(s), {} table row(s))",
        output_path, summary.text_replacements, summary.images_embedded, summary.rows_written
    )?;
    Ok(())
}
