use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use docx_formgen_core::ImageReplacement;

/// Configuration for the docx-formgen CLI.
#[derive(Parser, Debug)]
#[command(name = "docx-formgen")]
#[command(about = "Fill DOCX template placeholders with text and embedded images")]
pub struct Config {
    /// Path to the template document (prompted for when absent)
    #[arg(long, env = "DOCX_FORMGEN_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// Path for the generated document; parent directories are created
    #[arg(long, env = "DOCX_FORMGEN_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Text replacement as `name=value`; repeatable
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Image replacement as `name=path[@width_inches]`; repeatable
    #[arg(long = "image", value_name = "NAME=PATH[@WIDTH]")]
    pub image: Vec<String>,

    /// JSON replacement spec file: {"text": {...}, "images": {...}}
    #[arg(long, value_name = "FILE")]
    pub replacements: Option<PathBuf>,

    /// Prompt for data rows and write them into the first table
    #[arg(long)]
    pub fill_table: bool,

    /// List detected placeholders and exit
    #[arg(long)]
    pub list: bool,
}

/// Parse a `--set NAME=VALUE` argument.
pub fn parse_set(arg: &str) -> Result<(String, String)> {
    arg.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got '{arg}'"))
}

/// Parse a `--image NAME=PATH[@WIDTH]` argument. Without an explicit width
/// the placeholder naming heuristic applies (logos wider).
pub fn parse_image(arg: &str) -> Result<(String, ImageReplacement)> {
    let (name, rest) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=PATH[@WIDTH], got '{arg}'"))?;
    let name = name.trim().to_string();
    let image = match rest.rsplit_once('@') {
        Some((path, width)) => match width.parse::<f32>() {
            Ok(width) => ImageReplacement::with_width(path, width),
            Err(_) => ImageReplacement::for_placeholder(&name, rest),
        },
        None => ImageReplacement::for_placeholder(&name, rest),
    };
    Ok((name, image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_formgen_core::{DEFAULT_IMAGE_WIDTH_IN, LOGO_IMAGE_WIDTH_IN};
    use pretty_assertions::assert_eq;

    #[test]
    fn set_splits_on_first_equals() {
        let (name, value) = parse_set("Company Name=Acme = Co").unwrap();
        assert_eq!(name, "Company Name");
        assert_eq!(value, "Acme = Co");
        assert!(parse_set("no-equals").is_err());
    }

    #[test]
    fn image_width_suffix_is_optional() {
        let (name, image) = parse_image("issued_sign=sig.png").unwrap();
        assert_eq!(name, "issued_sign");
        assert_eq!(image.width, DEFAULT_IMAGE_WIDTH_IN);

        let (_, image) = parse_image("logo=logo.png").unwrap();
        assert_eq!(image.width, LOGO_IMAGE_WIDTH_IN);

        let (_, image) = parse_image("logo=logo.png@2.5").unwrap();
        assert_eq!(image.width, 2.5);
    }

    #[test]
    fn image_path_may_contain_at_signs() {
        let (_, image) = parse_image("sig=scans@home/sig.png").unwrap();
        assert_eq!(image.path.to_str().unwrap(), "scans@home/sig.png");
    }
}
