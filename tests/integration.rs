//! End-to-end integration tests for name-indexer.
//!
//! These tests run the whole pipeline with a scripted chat backend: page text
//! is chunked, names are extracted from (partly malformed) replies, indexed
//! against the pages and rendered.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};

use name_indexer::chunker::ChunkConfig;
use name_indexer::config::{AppConfig, ExtractionSettings, IndexSettings};
use name_indexer::document::{pages_from_text, read_lines};
use name_indexer::export::{render_json, render_text};
use name_indexer::index::FootnotePolicy;
use name_indexer::llm::{ChatBackend, ChatMessage, LlmError, Role};
use name_indexer::pipeline::{NameExtractor, index_names};

/// Answers each request with the next scripted reply and records the last
/// user message it saw.
struct ScriptedModel {
    replies: RefCell<VecDeque<String>>,
    seen: RefCell<Vec<String>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: RefCell::new(replies.iter().map(|r| r.to_string()).collect()),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl ChatBackend for ScriptedModel {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        if let Some(last) = messages.iter().rev().find(|m| m.role == Role::User) {
            self.seen.borrow_mut().push(last.content.clone());
        }
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| LlmError::RequestFailed {
                url: "scripted".into(),
                message: "script exhausted".into(),
            })
    }
}

const BOOK: &str = "\
Preface\nContents\nEinstein ... 2\nHawking ... 3\x0C\
As shown by Albert Einstein, the speed of light is constant.\n1\t\nSee Hawking, Brief History\x0C\
Paul Hawking later extended this work.\x0C\
Nothing about physicists here.\n2\t\nvgl. Einstein, Relativity\x0C";

fn one_chunk_per_page() -> ChunkConfig {
    ChunkConfig {
        max_tokens: 40,
        overlap_chars: 0,
        chars_per_token: 2.0,
    }
}

#[test]
fn extract_then_index_end_to_end() {
    let pages = pages_from_text(BOOK);
    assert_eq!(pages.len(), 4);

    let model = ScriptedModel::new(&[
        // Malformed: single quotes and a bare key.
        "[{'First Name': 'Albert', 'Last Name': 'Einstein'}, {First Name: 'Paul', 'Last Name': 'Hawking'}]",
        r#"Sure! Here is the list: [{"First Name": "Paul", "Last Name": "Hawking"}]"#,
        "no name found",
        r#"[{"First Name": "-", "Last Name": "-"}]"#,
    ]);
    let settings = ExtractionSettings {
        examples: Vec::new(),
        ..Default::default()
    };
    let extractor = NameExtractor::new(model, settings, one_chunk_per_page());
    let report = extractor.extract_names(&pages.full_text()).unwrap();
    assert_eq!(report.chunks, 4);
    assert_eq!(report.failed_chunks, 0);
    assert_eq!(
        report.keys,
        vec!["Einstein_Albert".to_string(), "Hawking_Paul".into()]
    );

    let index_settings = IndexSettings {
        exclude_pages: BTreeSet::from([1]),
        ..Default::default()
    };
    let index = index_names(&report.keys, &pages, &index_settings).unwrap();

    // Page 2 has Einstein in the body and Hawking only in a footnote.
    // Page 4 cites Einstein only in a footnote.
    assert_eq!(index.get("Einstein_Albert"), Some(&BTreeSet::from([2])));
    assert_eq!(index.get("Hawking_Paul"), Some(&BTreeSet::from([3])));

    assert_eq!(
        render_text(&report.keys, &index),
        "Einstein_Albert 2\nHawking_Paul 3\n"
    );
}

#[test]
fn every_chunk_receives_the_user_prompt() {
    let pages = pages_from_text(BOOK);
    let model = ScriptedModel::new(&["[]"; 4]);
    let settings = ExtractionSettings {
        user_prompt: "NAMES IN:\n".into(),
        ..Default::default()
    };
    let extractor = NameExtractor::new(model, settings, one_chunk_per_page());
    let report = extractor.extract_names(&pages.full_text()).unwrap();

    assert!(report.keys.is_empty());
    let seen = extractor.backend().seen.borrow();
    assert_eq!(seen.len(), report.chunks);
    assert!(seen.iter().all(|prompt| prompt.starts_with("NAMES IN:\n")));
}

#[test]
fn window_policy_and_offset_from_config() {
    let config: AppConfig = toml::from_str(
        r#"
        [index]
        page_offset = 100
        policy = { mode = "window", before = 10, after = 10 }
        "#,
    )
    .unwrap();
    let pages = pages_from_text(BOOK);
    let index = index_names(&["Hawking_Paul", "Einstein"], &pages, &config.index).unwrap();

    // The contents page is not excluded here, so it counts too.
    assert_eq!(index.get("Hawking_Paul"), Some(&BTreeSet::from([103])));
    assert_eq!(index.get("Einstein"), Some(&BTreeSet::from([101, 102])));
    assert_eq!(config.index.policy, FootnotePolicy::Window { before: 10, after: 10 });
}

#[test]
fn names_file_to_json_report() {
    let dir = tempfile::TempDir::new().unwrap();
    let names_path = dir.path().join("names.txt");
    std::fs::write(&names_path, "Einstein_Albert\nHawking_Paul\nNewton_Isaac\n").unwrap();

    let keys = read_lines(&names_path).unwrap();
    let pages = pages_from_text(BOOK);
    let settings = IndexSettings {
        exclude_pages: BTreeSet::from([1]),
        ..Default::default()
    };
    let index = index_names(&keys, &pages, &settings).unwrap();

    let json: serde_json::Value = serde_json::from_str(&render_json(&index).unwrap()).unwrap();
    assert_eq!(json["Einstein_Albert"], serde_json::json!([2]));
    assert_eq!(json["Hawking_Paul"], serde_json::json!([3]));
    assert!(json.get("Newton_Isaac").is_none());
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("indexer.toml");

    let mut config = AppConfig::default();
    config.llm.model = "llama3.1:8b".into();
    config.chunking.max_tokens = 512;
    config.index.exclude_pages = BTreeSet::from([1, 2, 3]);
    config.index.policy = FootnotePolicy::Window { before: 15, after: 5 };
    config.save(&path).unwrap();

    let loaded = AppConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.extraction.examples.len(), 3);
}
