//! Processing pipeline: LLM name extraction followed by page indexing.
//!
//! Extraction chunks the document text, asks the model for the persons in
//! each chunk, repairs the replies and collects unique name keys. Indexing
//! searches those keys in the page text and applies the configured page
//! exclusions and offset.

use std::collections::BTreeSet;

use crate::chunker::{ChunkConfig, split_into_chunks};
use crate::config::{ExtractionSettings, IndexSettings};
use crate::error::{AppResult, IndexResult};
use crate::index::{NameIndex, PageText};
use crate::llm::{ChatBackend, LlmError};
use crate::names::{NameRecord, Sentinels};

/// Outcome of extracting names from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Unique name records, sorted.
    pub names: Vec<NameRecord>,
    /// Unique name keys, sorted.
    pub keys: Vec<String>,
    /// Number of chunks sent to the model.
    pub chunks: usize,
    /// Chunks whose request failed and contributed no names.
    pub failed_chunks: usize,
}

/// Extracts person names from text through a chat model.
pub struct NameExtractor<B> {
    backend: B,
    settings: ExtractionSettings,
    chunking: ChunkConfig,
    separator: String,
}

impl<B: ChatBackend> NameExtractor<B> {
    pub fn new(backend: B, settings: ExtractionSettings, chunking: ChunkConfig) -> Self {
        Self {
            backend,
            settings,
            chunking,
            separator: crate::names::DEFAULT_KEY_SEPARATOR.into(),
        }
    }

    /// Separator placed between last and first name in the produced keys.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Extract every person name mentioned in `text`.
    ///
    /// A failed request only loses its own chunk. If every chunk fails, the
    /// first failure is returned instead of an empty report.
    pub fn extract_names(&self, text: &str) -> AppResult<ExtractionReport> {
        let chunks = split_into_chunks(text, &self.chunking);
        tracing::info!(chunks = chunks.len(), "extracting names");

        let repair = self.settings.repair();
        let fields = self.settings.fields();
        let sentinels: &Sentinels = &self.settings.sentinels;
        let mut conversation = self.settings.conversation();

        let mut names = BTreeSet::new();
        let mut failed_chunks = 0usize;
        let mut first_error: Option<LlmError> = None;

        for (i, chunk) in chunks.iter().enumerate() {
            conversation.reset();
            let prompt = format!("{}{chunk}", self.settings.user_prompt);
            let reply = match conversation.send(&self.backend, prompt) {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(chunk = i, error = %e, "name request failed, skipping chunk");
                    failed_chunks += 1;
                    first_error.get_or_insert(e);
                    continue;
                }
            };

            let records = repair.extract(Some(&reply));
            let before = names.len();
            names.extend(
                records
                    .iter()
                    .filter_map(|r| NameRecord::from_record(r, &fields, sentinels)),
            );
            tracing::debug!(
                chunk = i,
                records = records.len(),
                new_names = names.len() - before,
                "processed chunk"
            );
        }

        if let Some(e) = first_error.filter(|_| failed_chunks == chunks.len()) {
            return Err(e.into());
        }

        let keys: BTreeSet<String> = names.iter().filter_map(|n| n.key(&self.separator)).collect();
        tracing::info!(names = keys.len(), failed_chunks, "name extraction finished");

        Ok(ExtractionReport {
            names: names.into_iter().collect(),
            keys: keys.into_iter().collect(),
            chunks: chunks.len(),
            failed_chunks,
        })
    }
}

/// Index name keys against a document using the configured settings.
///
/// Pages in `settings.exclude_pages` are skipped, then `settings.page_offset`
/// is applied to every reported page.
pub fn index_names<S: AsRef<str>>(
    keys: &[S],
    pages: &PageText,
    settings: &IndexSettings,
) -> IndexResult<NameIndex> {
    let indexer = settings.build_indexer()?;
    let index = indexer.index(keys, pages, &settings.exclude_pages);
    tracing::info!(
        names = keys.len(),
        found = index.len(),
        pages = pages.len(),
        excluded = settings.exclude_pages.len(),
        "indexed names"
    );
    if settings.page_offset == 0 {
        Ok(index)
    } else {
        Ok(index.with_offset(settings.page_offset))
    }
}
