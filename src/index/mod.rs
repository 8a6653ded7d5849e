//! Name-to-page indexing.
//!
//! For each name key the indexer finds the pages on which the name occurs in
//! body text. Occurrences that only appear inside footnotes (as described by
//! [`FootnoteTemplate`]s) do not count, and caller-excluded pages are never
//! reported.
//!
//! Two footnote policies exist:
//!
//! - [`FootnotePolicy::WholePage`] (default): if any footnote pattern matches
//!   a page, only the text before the earliest footnote match counts as body.
//! - [`FootnotePolicy::Window`]: an occurrence is discarded when a footnote
//!   pattern matches within a few characters around it.
//!
//! A name in body text far from any footnote marker is kept under both.

pub mod pages;
pub mod template;

use std::collections::{BTreeMap, BTreeSet};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::names::{DEFAULT_KEY_SEPARATOR, NameKey};
use template::name_fragment;

pub use pages::{PageText, parse_page_list};
pub use template::FootnoteTemplate;

/// How footnote-only occurrences are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum FootnotePolicy {
    /// Body text is everything before the earliest footnote match on the page.
    #[default]
    WholePage,
    /// Check for footnote patterns within `before`/`after` characters of each
    /// occurrence.
    Window { before: usize, after: usize },
}

/// Name key to the pages it was found on. Names without pages are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameIndex {
    entries: BTreeMap<String, BTreeSet<u32>>,
}

impl NameIndex {
    pub fn get(&self, name: &str) -> Option<&BTreeSet<u32>> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<u32>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shift every page by `offset`, e.g. to map physical PDF pages onto
    /// printed page numbers. Pages that would fall below 1 are dropped.
    pub fn with_offset(&self, offset: i64) -> Self {
        let entries = self
            .entries
            .iter()
            .filter_map(|(name, pages)| {
                let shifted: BTreeSet<u32> = pages
                    .iter()
                    .filter_map(|&p| {
                        i64::from(p)
                            .checked_add(offset)
                            .and_then(|shifted| u32::try_from(shifted).ok())
                    })
                    .filter(|&p| p >= 1)
                    .collect();
                (!shifted.is_empty()).then(|| (name.clone(), shifted))
            })
            .collect();
        Self { entries }
    }
}

/// Finds the pages each name occurs on outside of footnotes.
#[derive(Debug, Clone)]
pub struct NameIndexer {
    templates: Vec<FootnoteTemplate>,
    policy: FootnotePolicy,
    separator: String,
    strip_parenthetical: bool,
}

impl NameIndexer {
    pub fn new(templates: Vec<FootnoteTemplate>) -> Self {
        Self {
            templates,
            policy: FootnotePolicy::default(),
            separator: DEFAULT_KEY_SEPARATOR.into(),
            strip_parenthetical: false,
        }
    }

    pub fn with_policy(mut self, policy: FootnotePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Separator between last and first name in keys (default `_`).
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Cut last names at the first `(` before searching.
    pub fn with_strip_parenthetical(mut self, strip: bool) -> Self {
        self.strip_parenthetical = strip;
        self
    }

    pub fn policy(&self) -> FootnotePolicy {
        self.policy
    }

    /// Index every name key against the document.
    ///
    /// Keys that do not decompose into a last name are skipped. Excluded
    /// pages are never reported.
    pub fn index<S: AsRef<str>>(
        &self,
        names: &[S],
        pages: &PageText,
        exclude: &BTreeSet<u32>,
    ) -> NameIndex {
        let mut entries: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();

        for raw in names {
            let raw = raw.as_ref();
            let Some(key) = NameKey::parse(raw, &self.separator, self.strip_parenthetical) else {
                tracing::debug!(name = raw, "skipping name key without a last name");
                continue;
            };

            let found = self.locate(&key, pages, exclude);
            tracing::debug!(name = raw, pages = found.len(), "indexed name");
            if !found.is_empty() {
                entries.entry(raw.to_string()).or_default().extend(found);
            }
        }

        NameIndex { entries }
    }

    /// Pages on which a single name occurs in body text.
    pub fn locate(&self, key: &NameKey, pages: &PageText, exclude: &BTreeSet<u32>) -> BTreeSet<u32> {
        let Some(matcher) = NameMatcher::new(key, &self.templates) else {
            return BTreeSet::new();
        };

        pages
            .iter()
            .filter(|(number, _)| !exclude.contains(number))
            .filter(|(_, text)| match self.policy {
                FootnotePolicy::WholePage => matcher.in_body_whole_page(text),
                FootnotePolicy::Window { before, after } => {
                    matcher.in_body_window(text, before, after)
                }
            })
            .map(|(number, _)| number)
            .collect()
    }
}

/// Compiled patterns for one name.
struct NameMatcher {
    name: Regex,
    footnotes: Vec<Regex>,
}

impl NameMatcher {
    fn new(key: &NameKey, templates: &[FootnoteTemplate]) -> Option<Self> {
        let last = name_fragment(&key.last);
        let (last_open, last_close) = boundaries(&key.last);
        let source = match &key.first {
            Some(first_name) => {
                let first = name_fragment(first_name);
                let (first_open, first_close) = boundaries(first_name);
                format!(
                    r"(?:{first_open}{first}\s+{last}(?:s|es)?{last_close}|{last_open}{last}(?:s|es)?,?\s+{first}{first_close})"
                )
            }
            None => format!(r"{last_open}{last}(?:s|es)?{last_close}"),
        };

        let name = match RegexBuilder::new(&source).case_insensitive(true).build() {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!(name = %key.full_name(), error = %e, "cannot build name pattern");
                return None;
            }
        };

        // Footnotes may cite the last name alone or the full name.
        let mut variants = vec![key.last.clone()];
        if key.first.is_some() {
            variants.push(key.full_name());
        }
        let footnotes = templates
            .iter()
            .flat_map(|t| variants.iter().map(move |v| (t, v)))
            .filter_map(|(t, v)| match t.compile(v) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(template = %t, error = %e, "footnote pattern never matches");
                    None
                }
            })
            .collect();

        Some(Self { name, footnotes })
    }

    fn in_body_whole_page(&self, text: &str) -> bool {
        if !self.name.is_match(text) {
            return false;
        }
        let earliest_footnote = self
            .footnotes
            .iter()
            .filter_map(|re| re.find(text))
            .map(|m| m.start())
            .min();
        match earliest_footnote {
            None => true,
            Some(cut) => self.name.is_match(&text[..cut]),
        }
    }

    fn in_body_window(&self, text: &str, before: usize, after: usize) -> bool {
        self.name.find_iter(text).any(|hit| {
            let start = chars_back(text, hit.start(), before);
            let end = chars_forward(text, hit.end(), after);
            let context = &text[start..end];
            !self.footnotes.iter().any(|re| re.is_match(context))
        })
    }
}

/// Word-boundary anchors for the start and end of a name.
///
/// `\b` only holds next to a word character, so a name ending in `.` (an
/// initial such as `J.`) gets no anchor on that side.
fn boundaries(name: &str) -> (&'static str, &'static str) {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let name = name.trim();
    let open = if name.chars().next().is_some_and(is_word) { r"\b" } else { "" };
    let close = if name.chars().last().is_some_and(is_word) { r"\b" } else { "" };
    (open, close)
}

/// Byte offset `n` characters before `from`, clamped to the start.
fn chars_back(text: &str, from: usize, n: usize) -> usize {
    text[..from]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map_or(from, |(i, _)| i)
}

/// Byte offset `n` characters after `from`, clamped to the end.
fn chars_forward(text: &str, from: usize, n: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(n)
        .map_or(text.len(), |(i, _)| from + i)
}
