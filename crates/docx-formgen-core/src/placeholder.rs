//! Placeholder tokens and their classification.

use serde::{Deserialize, Serialize};

/// Default display width in inches for an embedded image.
pub const DEFAULT_IMAGE_WIDTH_IN: f32 = 1.0;
/// Logos render wider than signatures.
pub const LOGO_IMAGE_WIDTH_IN: f32 = 1.5;

const SENTINEL: &str = "done";

/// What a placeholder substitutes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderKind {
    Text,
    Image,
}

/// A `{...}` token detected in the template, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Raw token including the braces.
    pub token: String,
    /// Token text without the braces.
    pub name: String,
    pub kind: PlaceholderKind,
}

impl Placeholder {
    pub(crate) fn from_token(token: String) -> Self {
        let name = token[1..token.len() - 1].to_string();
        let kind = classify(&name);
        Self { token, name, kind }
    }

    /// The literal `{done}` token doubles as the interactive sentinel and is
    /// never collected or substituted.
    pub fn is_sentinel(&self) -> bool {
        self.name.eq_ignore_ascii_case(SENTINEL)
    }
}

/// Naming heuristic: signatures and logos are images, everything else text.
pub fn classify(name: &str) -> PlaceholderKind {
    let lower = name.to_lowercase();
    if lower.contains("sign") || lower.starts_with("logo") {
        PlaceholderKind::Image
    } else {
        PlaceholderKind::Text
    }
}

/// Default display width in inches for an image placeholder name.
pub fn default_width(name: &str) -> f32 {
    if name.to_lowercase().starts_with("logo") {
        LOGO_IMAGE_WIDTH_IN
    } else {
        DEFAULT_IMAGE_WIDTH_IN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Company Name", PlaceholderKind::Text)]
    #[case("issued_sign", PlaceholderKind::Image)]
    #[case("Approved Signature", PlaceholderKind::Image)]
    #[case("logo", PlaceholderKind::Image)]
    #[case("Logo Small", PlaceholderKind::Image)]
    #[case("catalogue", PlaceholderKind::Text)]
    #[case("", PlaceholderKind::Text)]
    fn classification(#[case] name: &str, #[case] expected: PlaceholderKind) {
        assert_eq!(classify(name), expected);
    }

    #[test]
    fn sentinel_is_case_insensitive() {
        assert!(Placeholder::from_token("{Done}".to_string()).is_sentinel());
        assert!(!Placeholder::from_token("{done_by}".to_string()).is_sentinel());
    }

    #[test]
    fn logo_width_differs() {
        assert_eq!(default_width("logo"), LOGO_IMAGE_WIDTH_IN);
        assert_eq!(default_width("issued_sign"), DEFAULT_IMAGE_WIDTH_IN);
    }
}
