//! Rendering a name index for people and for other programs.

use crate::index::NameIndex;

/// One line per input name: `"{name} {p1}, {p2}"`, pages ascending.
///
/// Names follow the order of `names`, so a names list comes back annotated.
/// Names without pages are printed bare.
pub fn render_text<S: AsRef<str>>(names: &[S], index: &NameIndex) -> String {
    let mut out = String::new();
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        out.push_str(name);
        if let Some(pages) = index.get(name) {
            let pages: Vec<String> = pages.iter().map(u32::to_string).collect();
            out.push(' ');
            out.push_str(&pages.join(", "));
        }
        out.push('\n');
    }
    out
}

/// `{ "name": [pages] }` as pretty-printed JSON.
pub fn render_json(index: &NameIndex) -> serde_json::Result<String> {
    serde_json::to_string_pretty(index)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::index::{NameIndexer, PageText};

    fn sample() -> NameIndex {
        let pages = PageText::from_sequence(["Kant and Hegel", "nothing", "Kant"]);
        NameIndexer::new(Vec::new()).index(&["Kant", "Hegel", "Fichte"], &pages, &BTreeSet::new())
    }

    #[test]
    fn text_lists_pages_in_input_order() {
        let text = render_text(&["Kant", "Hegel", "Fichte"], &sample());
        assert_eq!(text, "Kant 1, 3\nHegel 1\nFichte\n");
    }

    #[test]
    fn blank_names_are_skipped() {
        assert_eq!(render_text(&["", "  "], &sample()), "");
    }

    #[test]
    fn json_maps_names_to_pages() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&sample()).unwrap()).unwrap();
        assert_eq!(json["Kant"], serde_json::json!([1, 3]));
        assert_eq!(json["Hegel"], serde_json::json!([1]));
        assert!(json.get("Fichte").is_none());
    }
}
