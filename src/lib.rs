// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # name-indexer
//!
//! Builds a person-name index for long documents: which names appear on
//! which pages, ignoring mentions that only occur in footnotes.
//!
//! ## Architecture
//!
//! - **JSON repair** (`repair`): recovers name records from malformed LLM replies
//! - **Names** (`names`): sentinel handling, name keys and their decomposition
//! - **Indexing** (`index`): footnote-aware name search over page text
//! - **Documents** (`document`): PDF page text via `pdf-extract`
//! - **LLM** (`llm`, `chunker`): token-bounded chunks sent to a chat-completion API
//! - **Pipeline** (`pipeline`): extraction and indexing driven by `config`
//!
//! ## Library usage
//!
//! ```
//! use std::collections::BTreeSet;
//! use name_indexer::index::{FootnoteTemplate, NameIndexer, PageText};
//!
//! let pages = PageText::from_numbered([
//!     (5, "The speed of light is constant, as shown by Einstein in 1905."),
//!     (9, "5\nSee Einstein"),
//! ])
//! .unwrap();
//! let indexer = NameIndexer::new(vec![FootnoteTemplate::parse(r"\d+\nSee name+").unwrap()]);
//! let index = indexer.index(&["Einstein"], &pages, &BTreeSet::new());
//! assert_eq!(index.get("Einstein"), Some(&BTreeSet::from([5])));
//! ```

pub mod chunker;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod index;
pub mod llm;
pub mod names;
pub mod pipeline;
pub mod repair;
