//! Rich diagnostic error types for name-indexer.
//!
//! Errors only exist at the boundaries: configuration, document reading and
//! the LLM transport. The repair extractor and the page indexer never fail on
//! malformed data; they degrade to smaller results instead.

use miette::Diagnostic;
use thiserror::Error;

use crate::llm::LlmError;

/// Top-level error type for the binary and pipeline.
///
/// Each variant wraps a subsystem-specific error, preserving the diagnostic
/// code and help text through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum AppError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Llm(#[from] LlmError),
}

/// Convenience alias for pipeline and CLI results.
pub type AppResult<T> = std::result::Result<T, AppError>;

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(indexer::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(indexer::config::parse),
        help("Check the TOML syntax. Every field is optional and falls back to its default.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(indexer::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Index errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum IndexError {
    #[error("footnote pattern has no `name` placeholder: \"{template}\"")]
    #[diagnostic(
        code(indexer::index::missing_placeholder),
        help(
            "Footnote patterns must contain the literal token `name`, which is \
             replaced by the searched name, e.g. `\\d+\\t\\nSee name+`."
        )
    )]
    MissingPlaceholder { template: String },

    #[error("invalid footnote pattern \"{template}\": {message}")]
    #[diagnostic(
        code(indexer::index::invalid_template),
        help("The pattern must be a valid regular expression once `name` is substituted.")
    )]
    InvalidTemplate { template: String, message: String },

    #[error("invalid page number {page}")]
    #[diagnostic(
        code(indexer::index::invalid_page),
        help("Page numbers are 1-based. Page 0 does not exist.")
    )]
    InvalidPageNumber { page: u32 },

    #[error("duplicate page number {page}")]
    #[diagnostic(
        code(indexer::index::duplicate_page),
        help("Each page number may appear only once in the page text mapping.")
    )]
    DuplicatePage { page: u32 },

    #[error("invalid page list \"{input}\": {message}")]
    #[diagnostic(
        code(indexer::index::page_list),
        help("Use comma-separated page numbers and inclusive ranges, e.g. `1-7,31,58`.")
    )]
    InvalidPageList { input: String, message: String },
}

pub type IndexResult<T> = std::result::Result<T, IndexError>;

// ---------------------------------------------------------------------------
// Document errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    #[error("I/O error reading \"{path}\": {source}")]
    #[diagnostic(
        code(indexer::document::io),
        help("A filesystem operation failed. Check file paths and permissions.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in PDF document: {message}")]
    #[diagnostic(
        code(indexer::document::pdf),
        help("The document could not be parsed. Verify the file is a valid PDF and not corrupted.")
    )]
    Pdf { message: String },

    #[error("empty document: no text extracted from \"{origin}\"")]
    #[diagnostic(
        code(indexer::document::empty),
        help(
            "The parser could not extract any text. The PDF may contain only \
             scanned images; run OCR on it first."
        )
    )]
    Empty { origin: String },
}

pub type DocumentResult<T> = std::result::Result<T, DocumentError>;
