//! Footnote pattern templates with a `name` slot.
//!
//! A template such as `\d+\t\nSee name+` is a regular expression in which
//! every occurrence of the literal token `name` stands for the searched name.
//! The name is regex-escaped before substitution, so only the template itself
//! contributes regex syntax.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};

use crate::error::{IndexError, IndexResult};

/// The substitution slot token.
pub const PLACEHOLDER: &str = "name";

/// A footnote regex template with one named substitution slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteTemplate {
    source: String,
    /// Template text around the slots; always one more than the slot count.
    segments: Vec<String>,
}

impl FootnoteTemplate {
    /// Parse and validate a template.
    ///
    /// Fails when the template has no `name` slot, or when it is not a valid
    /// regular expression once a name is substituted.
    pub fn parse(template: &str) -> IndexResult<Self> {
        let segments: Vec<String> = template.split(PLACEHOLDER).map(String::from).collect();
        if segments.len() < 2 {
            return Err(IndexError::MissingPlaceholder {
                template: template.to_string(),
            });
        }

        let parsed = Self {
            source: template.to_string(),
            segments,
        };
        parsed
            .compile("Name")
            .map_err(|e| IndexError::InvalidTemplate {
                template: template.to_string(),
                message: e.to_string(),
            })?;
        Ok(parsed)
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Regex source with `name` substituted into every slot.
    pub fn render(&self, name: &str) -> String {
        self.segments.join(&name_fragment(name))
    }

    /// Compile the rendered template, case-insensitively.
    pub fn compile(&self, name: &str) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&self.render(name))
            .case_insensitive(true)
            .build()
    }
}

impl FromStr for FootnoteTemplate {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FootnoteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Regex fragment for a literal name: escaped words joined by `\s+`, so a
/// name broken across a line in extracted text still matches.
pub(crate) fn name_fragment(name: &str) -> String {
    name.split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}
