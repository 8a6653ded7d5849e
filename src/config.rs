//! Application configuration, persisted as TOML.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chunker::ChunkConfig;
use crate::error::{ConfigError, ConfigResult, IndexResult};
use crate::index::{FootnotePolicy, FootnoteTemplate, NameIndexer};
use crate::llm::{Conversation, FewShotExample, LlmConfig};
use crate::names::{DEFAULT_KEY_SEPARATOR, NameFields, Sentinels};
use crate::repair::{DEFAULT_MAX_ATTEMPTS, JsonRepair};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub chunking: ChunkConfig,
    pub extraction: ExtractionSettings,
    pub index: IndexSettings,
}

impl AppConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// How names are requested from the model and read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Repair rounds for malformed replies.
    pub max_attempts: u32,
    pub first_name_field: String,
    pub last_name_field: String,
    /// Spellings meaning "unknown" in either name field.
    pub sentinels: Sentinels,
    pub system_prompt: String,
    /// Prepended to every chunk.
    pub user_prompt: String,
    pub examples: Vec<FewShotExample>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        let fields = NameFields::default();
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            first_name_field: fields.first,
            last_name_field: fields.last,
            sentinels: Sentinels::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            user_prompt: DEFAULT_USER_PROMPT.into(),
            examples: default_examples(),
        }
    }
}

impl ExtractionSettings {
    pub fn repair(&self) -> JsonRepair {
        JsonRepair::new(self.max_attempts)
    }

    pub fn fields(&self) -> NameFields {
        NameFields {
            first: self.first_name_field.clone(),
            last: self.last_name_field.clone(),
        }
    }

    /// A fresh conversation holding the system prompt and examples.
    pub fn conversation(&self) -> Conversation {
        Conversation::new(&self.system_prompt).with_examples(&self.examples)
    }
}

/// How name keys are searched in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Separator between last and first name in keys.
    pub key_separator: String,
    /// Cut last names at the first `(`.
    pub strip_parenthetical: bool,
    /// Footnote regex templates; `name` is replaced by the searched name.
    pub footnote_patterns: Vec<String>,
    /// Pages never reported (e.g. table of contents).
    pub exclude_pages: BTreeSet<u32>,
    /// Added to every reported page.
    pub page_offset: i64,
    pub policy: FootnotePolicy,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            key_separator: DEFAULT_KEY_SEPARATOR.into(),
            strip_parenthetical: false,
            footnote_patterns: vec![
                r"\d+\t\nSee name+".into(),
                r"\d+\t\nvgl\. name+".into(),
                r"\d+\t\nname+".into(),
            ],
            exclude_pages: BTreeSet::new(),
            page_offset: 0,
            policy: FootnotePolicy::default(),
        }
    }
}

impl IndexSettings {
    /// Validate the footnote patterns and build the indexer.
    pub fn build_indexer(&self) -> IndexResult<NameIndexer> {
        let templates = self
            .footnote_patterns
            .iter()
            .map(|p| FootnoteTemplate::parse(p))
            .collect::<IndexResult<Vec<_>>>()?;
        Ok(NameIndexer::new(templates)
            .with_policy(self.policy)
            .with_separator(self.key_separator.clone())
            .with_strip_parenthetical(self.strip_parenthetical))
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an expert in extracting names of persons from texts and returning them as JSON.
Analyse the provided text carefully and check whether it mentions any PERSONS by first or last name.
Names of countries, places, parties and organisations must NOT be extracted.
If only one part of a name is mentioned, return that part and \"-\" for the other key.
If the text contains no person at all, reply with: no name found.

Return every person as an object in a JSON list:
[{\"First Name\": \"first_name\", \"Last Name\": \"last_name\"}, ...]

Your answer must contain ONLY this JSON list, without comments or explanations.";

const DEFAULT_USER_PROMPT: &str = "\
Return every name of a person from the following text.
Names of countries, places or political parties must NOT be extracted.
Answer ONLY with a valid JSON list like [{\"First Name\": \"first_name\", \"Last Name\": \"last_name\"}, ...].
If there is no person in the text, reply with: no name found.

TEXT:
";

fn default_examples() -> Vec<FewShotExample> {
    [
        (
            "Is there anything faster than light? No, as shown by Albert Einstein and Paul Hawking, \
             although neither won a gold medal for France, Germany or the USA.",
            r#"[{"First Name": "Albert", "Last Name": "Einstein"}, {"First Name": "Paul", "Last Name": "Hawking"}]"#,
        ),
        (
            "Building on Saint Augustine, Dr. Francianos argues that theology searches for answers \
             bigger than us. Veltranova (2023) criticises Francianos for an overemphasis on abstraction.",
            r#"[{"First Name": "Augustine", "Last Name": "-"}, {"First Name": "-", "Last Name": "Francianos"}, {"First Name": "-", "Last Name": "Veltranova"}]"#,
        ),
        (
            "In Germany the CDU, led by Hans Günther Mayer, holds Bavaria, while Berlin and Hamburg \
             favour the SPD and the Greens.",
            r#"[{"First Name": "Hans Günther", "Last Name": "Mayer"}]"#,
        ),
    ]
    .into_iter()
    .map(|(user, assistant)| FewShotExample {
        user: user.into(),
        assistant: assistant.into(),
    })
    .collect()
}
