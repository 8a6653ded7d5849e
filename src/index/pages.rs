//! Page-indexed document text and page-number lists.

use std::collections::{BTreeMap, BTreeSet};

use unicode_normalization::UnicodeNormalization;

use crate::error::{IndexError, IndexResult};

/// Text of a document keyed by 1-based page number.
///
/// Text is normalized on the way in (NFC, non-breaking spaces folded to plain
/// spaces) and never changes afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageText {
    pages: BTreeMap<u32, String>,
}

impl PageText {
    /// Number pages in order, starting at 1. Empty pages keep their number.
    pub fn from_sequence<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pages = pages
            .into_iter()
            .zip(1u32..)
            .map(|(text, number)| (number, normalize_page_text(text.as_ref())))
            .collect();
        Self { pages }
    }

    /// Build from explicit page numbers, rejecting page 0 and duplicates.
    pub fn from_numbered<I, S>(pages: I) -> IndexResult<Self>
    where
        I: IntoIterator<Item = (u32, S)>,
        S: AsRef<str>,
    {
        let mut map = BTreeMap::new();
        for (number, text) in pages {
            if number == 0 {
                return Err(IndexError::InvalidPageNumber { page: number });
            }
            if map.insert(number, normalize_page_text(text.as_ref())).is_some() {
                return Err(IndexError::DuplicatePage { page: number });
            }
        }
        Ok(Self { pages: map })
    }

    pub fn get(&self, page: u32) -> Option<&str> {
        self.pages.get(&page).map(String::as_str)
    }

    /// Pages in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.pages.iter().map(|(n, t)| (*n, t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// All pages joined with newlines, for chunking.
    pub fn full_text(&self) -> String {
        self.pages.values().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

/// NFC-normalize and fold non-breaking spaces, including the `Â` + NBSP
/// mojibake some PDF producers emit, into plain spaces.
pub fn normalize_page_text(text: &str) -> String {
    text.nfc()
        .collect::<String>()
        .replace("Â\u{a0}", " ")
        .replace('\u{a0}', " ")
}

/// Highest page number accepted in a page list.
pub const MAX_LISTED_PAGE: u32 = 100_000;

/// Parse a page list such as `1-7, 31,58` into page numbers.
///
/// Entries are separated by commas or whitespace; `a-b` is an inclusive range.
/// Pages above [`MAX_LISTED_PAGE`] are rejected.
pub fn parse_page_list(input: &str) -> IndexResult<BTreeSet<u32>> {
    let invalid = |message: String| IndexError::InvalidPageList {
        input: input.to_string(),
        message,
    };
    let page = |s: &str| -> IndexResult<u32> {
        let n: u32 = s
            .trim()
            .parse()
            .map_err(|_| invalid(format!("\"{s}\" is not a page number")))?;
        if n == 0 {
            return Err(invalid("pages start at 1".into()));
        }
        if n > MAX_LISTED_PAGE {
            return Err(invalid(format!("page {n} exceeds the limit of {MAX_LISTED_PAGE}")));
        }
        Ok(n)
    };

    let mut pages = BTreeSet::new();
    for entry in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|e| !e.is_empty())
    {
        match entry.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (page(start)?, page(end)?);
                if start > end {
                    return Err(invalid(format!("range {start}-{end} is reversed")));
                }
                pages.extend(start..=end);
            }
            None => {
                pages.insert(page(entry)?);
            }
        }
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_numbered_from_one() {
        let pages = PageText::from_sequence(["first", "", "third"]);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages.get(1), Some("first"));
        assert_eq!(pages.get(2), Some(""));
        assert_eq!(pages.get(3), Some("third"));
        assert_eq!(pages.get(0), None);
    }

    #[test]
    fn numbered_rejects_page_zero_and_duplicates() {
        assert!(matches!(
            PageText::from_numbered([(0, "x")]),
            Err(IndexError::InvalidPageNumber { page: 0 })
        ));
        assert!(matches!(
            PageText::from_numbered([(2, "x"), (2, "y")]),
            Err(IndexError::DuplicatePage { page: 2 })
        ));
    }

    #[test]
    fn non_breaking_spaces_are_folded() {
        let pages = PageText::from_sequence(["Albert\u{a0}Einstein", "Paul\u{c2}\u{a0}Hawking"]);
        assert_eq!(pages.get(1), Some("Albert Einstein"));
        assert_eq!(pages.get(2), Some("Paul Hawking"));
    }

    #[test]
    fn text_is_nfc_normalized() {
        // "u" + combining diaeresis
        let pages = PageText::from_sequence(["Gu\u{308}nther"]);
        assert_eq!(pages.get(1), Some("Günther"));
    }

    #[test]
    fn full_text_joins_pages() {
        let pages = PageText::from_sequence(["a", "b"]);
        assert_eq!(pages.full_text(), "a\nb");
    }

    #[test]
    fn page_list_with_ranges() {
        let pages = parse_page_list("1-3, 7,9 10").unwrap();
        assert_eq!(pages.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 7, 9, 10]);
        assert!(parse_page_list("").unwrap().is_empty());
    }

    #[test]
    fn page_list_errors() {
        assert!(parse_page_list("0").is_err());
        assert!(parse_page_list("5-2").is_err());
        assert!(parse_page_list("x").is_err());
        assert!(parse_page_list("1-").is_err());
    }

    #[test]
    fn page_list_rejects_huge_ranges() {
        let err = parse_page_list("1-4294967295").unwrap_err();
        assert!(matches!(err, IndexError::InvalidPageList { .. }));
        assert!(parse_page_list("999999").is_err());
        assert_eq!(parse_page_list("100000").unwrap().len(), 1);
    }
}
