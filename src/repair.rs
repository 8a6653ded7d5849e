//! Best-effort recovery of structured records from LLM replies.
//!
//! Models asked for a JSON array of name records routinely answer with prose
//! around the array, single quotes, bare keys, trailing commas or a truncated
//! tail. [`JsonRepair`] runs a strict pass first and only falls back to the
//! repair stages when that pass fails:
//!
//! 1. Normalize quoting: single quotes become double quotes, newlines go.
//! 2. Parse every bracket-delimited array strictly.
//! 3. On failure, strip characters outside the JSON allow-list and cut out
//!    each flat `{...}` object.
//! 4. Per object: strict parse, then quote fixing, then token pairing.
//!
//! The repaired objects are serialized back into a JSON array and fed through
//! the strict pass again. The extractor never returns an error: anything it
//! cannot recover is dropped with a log line.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

/// One flat record recovered from a reply: field name to string value.
pub type Record = BTreeMap<String, String>;

/// Default number of repair rounds before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Anything outside letters, digits, whitespace and `{}[],":.-`.
static RE_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^{}\[\],":\w\s.\-]"#).unwrap());

/// Flat objects (no nested braces). Unclosed objects never match.
static RE_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^{}]*\}").unwrap());

static RE_BARE_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w+)\s*:").unwrap());

static RE_BARE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#":\s*([^,"{}\[\]]+)\s*(,|\})"#).unwrap());

static RE_TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*\}").unwrap());

/// Staged JSON repair with a bounded number of repair rounds.
#[derive(Debug, Clone)]
pub struct JsonRepair {
    max_attempts: u32,
}

impl Default for JsonRepair {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl JsonRepair {
    /// Create an extractor that repairs at most `max_attempts` times.
    ///
    /// With `max_attempts == 0` only the strict pass runs and whatever it
    /// parsed is returned.
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Extract every record from a reply, recovering from malformed JSON.
    ///
    /// Returns an empty list for an absent reply or one without any usable
    /// structure. Well-formed arrays come back exactly as a strict parser
    /// would read them.
    pub fn extract(&self, reply: Option<&str>) -> Vec<Record> {
        let Some(reply) = reply else {
            tracing::debug!("no reply to extract records from");
            return Vec::new();
        };

        // Quote normalization would break apostrophes inside valid strings
        // (O'Brien), so well-formed replies are taken as they are.
        if let StrictPass::Complete(records) = strict_pass(reply) {
            return records;
        }

        let mut text = normalize_quoting(reply);
        let mut attempts_left = self.max_attempts;

        loop {
            match strict_pass(&text) {
                StrictPass::Complete(records) => return records,
                StrictPass::Incomplete { records, reason } => {
                    if attempts_left == 0 {
                        tracing::warn!(
                            recovered = records.len(),
                            %reason,
                            "repair attempts exhausted, returning partial records"
                        );
                        return records;
                    }
                    attempts_left -= 1;
                    tracing::debug!(%reason, attempts_left, "strict parse failed, repairing");
                    text = repair(&text);
                }
            }
        }
    }
}

/// Outcome of parsing every array candidate strictly.
enum StrictPass {
    /// Every candidate parsed (or there was nothing to parse).
    Complete(Vec<Record>),
    /// At least one candidate failed; `records` holds the ones that did not.
    Incomplete { records: Vec<Record>, reason: String },
}

fn normalize_quoting(reply: &str) -> String {
    reply.replace(['\n', '\r'], "").replace('\'', "\"")
}

fn strict_pass(text: &str) -> StrictPass {
    let candidates = array_candidates(text);
    if candidates.is_empty() {
        // A lone object without the surrounding array is still worth repairing.
        if text.contains('{') {
            return StrictPass::Incomplete {
                records: Vec::new(),
                reason: "no array found".into(),
            };
        }
        return StrictPass::Complete(Vec::new());
    }

    let mut records = Vec::new();
    let mut failure: Option<String> = None;
    for candidate in candidates {
        match serde_json::from_str::<Vec<Value>>(candidate) {
            Ok(items) => records.extend(items.iter().filter_map(record_from_value)),
            Err(e) => {
                failure.get_or_insert_with(|| e.to_string());
            }
        }
    }

    match failure {
        None => StrictPass::Complete(records),
        Some(reason) => StrictPass::Incomplete { records, reason },
    }
}

/// Every top-level `[...]` in `text`. An array that never closes runs to the
/// end of the text so the strict parser reports it as broken.
fn array_candidates(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('[') {
        let start = pos + offset;
        let end = closing_bracket(&text[start..])
            .map(|len| start + len)
            .unwrap_or(text.len());
        out.push(&text[start..end]);
        pos = end;
    }
    out
}

/// Byte length of the balanced array at the start of `s`, brackets included.
fn closing_bracket(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in s.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Rebuild the reply as a JSON array of every object that could be recovered.
fn repair(text: &str) -> String {
    let cleaned = RE_DISALLOWED.replace_all(text, "");
    let records: Vec<Record> = RE_OBJECT
        .find_iter(&cleaned)
        .filter_map(|m| repair_object(m.as_str()))
        .collect();
    serde_json::to_string(&records).unwrap_or_else(|_| "[]".into())
}

fn repair_object(object: &str) -> Option<Record> {
    if let Some(record) = parse_object(object) {
        return Some(record);
    }

    let fixed = fix_quoting(object);
    if let Some(record) = parse_object(&fixed) {
        return Some(record);
    }

    // Token pairing works on the unfixed text: quoting a bare key made of
    // several words splits it apart.
    let rebuilt = rebuild_from_tokens(object);
    if rebuilt.is_none() {
        tracing::warn!(object = %fixed, "dropping unrecoverable record");
    }
    rebuilt
}

fn parse_object(object: &str) -> Option<Record> {
    serde_json::from_str::<Value>(object)
        .ok()
        .as_ref()
        .and_then(record_from_value)
        .filter(|record| !record.is_empty())
}

/// Quote bare keys and values and drop a trailing comma before `}`.
fn fix_quoting(object: &str) -> String {
    let fixed = RE_TRAILING_COMMA.replace_all(object, "}");
    let fixed = RE_BARE_KEY.replace_all(&fixed, "\"$1\":");
    RE_BARE_VALUE
        .replace_all(&fixed, |caps: &Captures| {
            format!(": \"{}\"{}", caps[1].trim(), &caps[2])
        })
        .into_owned()
}

/// Split on commas, quotes and colons, keep fragments with alphanumeric
/// content, and pair them up as key/value in encounter order.
fn rebuild_from_tokens(object: &str) -> Option<Record> {
    let tokens: Vec<&str> = object
        .split([',', '"', ':'])
        .map(|t| t.trim_matches(|c: char| c.is_whitespace() || matches!(c, '{' | '}' | '[' | ']')))
        .filter(|t| t.chars().any(char::is_alphanumeric))
        .collect();

    let record: Record = tokens
        .chunks_exact(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect();

    (!record.is_empty()).then_some(record)
}

fn record_from_value(value: &Value) -> Option<Record> {
    match value {
        Value::Object(map) => Some(
            map.iter()
                .map(|(key, v)| (key.clone(), value_to_string(v)))
                .collect(),
        ),
        other => {
            tracing::debug!(value = %other, "skipping non-object array element");
            None
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
