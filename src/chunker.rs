//! Token-bounded chunking of document text for LLM extraction.
//!
//! Lines are treated as paragraphs and packed into chunks below a token
//! budget. A paragraph that alone exceeds the budget is cut into equal parts
//! that overlap, with partial words trimmed at every cut.

use serde::{Deserialize, Serialize};

/// Estimates token counts from character counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenEstimator {
    pub chars_per_token: f64,
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self {
            chars_per_token: 3.25,
        }
    }
}

impl TokenEstimator {
    /// `round(chars / chars_per_token)`.
    pub fn count(&self, text: &str) -> usize {
        if self.chars_per_token <= 0.0 {
            return text.chars().count();
        }
        (text.chars().count() as f64 / self.chars_per_token).round() as usize
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Token budget per chunk.
    pub max_tokens: usize,
    /// Characters shared between consecutive parts of an oversized paragraph.
    pub overlap_chars: usize,
    /// Average characters per token for the estimator.
    pub chars_per_token: f64,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            overlap_chars: 150,
            chars_per_token: 3.25,
        }
    }
}

impl ChunkConfig {
    pub fn estimator(&self) -> TokenEstimator {
        TokenEstimator {
            chars_per_token: self.chars_per_token,
        }
    }
}

/// Split text into chunks that stay under `config.max_tokens`.
///
/// - Paragraphs are lines, trimmed, with blank lines dropped.
/// - Paragraphs are joined with `\n` while `current + tokens + 2` stays below
///   the budget; otherwise the current chunk is emitted.
/// - A paragraph over the budget is split into `ceil(tokens / max_tokens)`
///   overlapping parts.
pub fn split_into_chunks(text: &str, config: &ChunkConfig) -> Vec<String> {
    let estimator = config.estimator();
    let max_tokens = config.max_tokens.max(1);

    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_tokens = 0usize;

    for paragraph in text.lines().map(str::trim).filter(|p| !p.is_empty()) {
        let tokens = estimator.count(paragraph);
        if tokens == 0 {
            continue;
        }

        // +2 for the joining newline.
        if current_tokens + tokens + 2 < max_tokens {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(paragraph);
            current_tokens += tokens;
            continue;
        }

        if !current.is_empty() {
            result.push(std::mem::take(&mut current));
            current_tokens = 0;
        }

        if tokens > max_tokens {
            let parts = tokens.div_ceil(max_tokens);
            result.extend(
                trim_cut_words(split_with_overlap(paragraph, parts, config.overlap_chars))
                    .into_iter()
                    .filter(|part| !part.is_empty()),
            );
        } else {
            current.push_str(paragraph);
            current_tokens = tokens;
        }
    }

    if !current.is_empty() {
        result.push(current);
    }
    result
}

/// Cut `text` into `parts` pieces of equal character length, each sharing
/// `overlap` characters with its predecessor.
pub fn split_with_overlap(text: &str, parts: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let parts = parts.max(1);
    let part_size = (len + (parts - 1) * overlap) / parts;
    let step = part_size.saturating_sub(overlap).max(1);

    (0..parts)
        .map(|part| {
            let start = (part * step).min(len);
            let end = (start + part_size).min(len);
            chars[start..end].iter().collect()
        })
        .collect()
}

/// Which side of a part was cut mid-text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CutSide {
    Start,
    End,
    Both,
}

/// Drop the partial words a mid-word cut leaves behind.
fn trim_cut_words(parts: Vec<String>) -> Vec<String> {
    let last = parts.len().saturating_sub(1);
    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| {
            let side = match i {
                _ if last == 0 => return part.trim().to_string(),
                0 => CutSide::End,
                i if i == last => CutSide::Start,
                _ => CutSide::Both,
            };
            trim_partial_words(&part, side)
        })
        .collect()
}

fn trim_partial_words(text: &str, side: CutSide) -> String {
    let (Some(first_space), Some(last_space)) = (text.find(' '), text.rfind(' ')) else {
        return text.trim().to_string();
    };
    let trimmed = match side {
        CutSide::Start => &text[first_space..],
        CutSide::End => &text[..last_space],
        CutSide::Both if first_space < last_space => &text[first_space..last_space],
        CutSide::Both => text,
    };
    trimmed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimator_rounds() {
        let est = TokenEstimator::default();
        assert_eq!(est.count(""), 0);
        assert_eq!(est.count("abcdefghijklm"), 4); // 13 / 3.25
        assert_eq!(est.count("ab"), 1); // 0.615 rounds up
    }

    #[test]
    fn short_paragraphs_are_packed() {
        let config = ChunkConfig {
            max_tokens: 100,
            ..Default::default()
        };
        let chunks = split_into_chunks("First line.\n\n  Second line.  \nThird.", &config);
        assert_eq!(chunks, vec!["First line.\nSecond line.\nThird.".to_string()]);
    }

    #[test]
    fn budget_forces_new_chunk() {
        let config = ChunkConfig {
            max_tokens: 10,
            overlap_chars: 0,
            chars_per_token: 1.0,
        };
        let chunks = split_into_chunks("aaaa\nbbbb\ncccc", &config);
        // 4 + 4 + 2 = 10 is not below the budget.
        assert_eq!(chunks, vec!["aaaa".to_string(), "bbbb".into(), "cccc".into()]);
    }

    #[test]
    fn oversized_paragraph_is_split_with_overlap() {
        let config = ChunkConfig {
            max_tokens: 20,
            overlap_chars: 5,
            chars_per_token: 1.0,
        };
        let paragraph = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = split_into_chunks(paragraph, &config);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            for word in chunk.split_whitespace() {
                assert!(paragraph.split_whitespace().any(|w| w == word), "{word} is a cut word");
            }
        }
    }

    #[test]
    fn split_with_overlap_covers_text() {
        let parts = split_with_overlap("abcdefghij", 2, 2);
        assert_eq!(parts, vec!["abcdef".to_string(), "efghij".into()]);
    }

    #[test]
    fn single_part_is_whole_text() {
        assert_eq!(split_with_overlap("abc", 1, 10), vec!["abc".to_string()]);
    }

    #[test]
    fn partial_words_trimmed_by_side() {
        assert_eq!(trim_partial_words("lpha beta gam", CutSide::Both), "beta");
        assert_eq!(trim_partial_words("alpha beta gam", CutSide::End), "alpha beta");
        assert_eq!(trim_partial_words("pha beta gamma", CutSide::Start), "beta gamma");
        assert_eq!(trim_partial_words("word", CutSide::Both), "word");
    }

    #[test]
    fn empty_input() {
        assert!(split_into_chunks("", &ChunkConfig::default()).is_empty());
        assert!(split_into_chunks("\n \n", &ChunkConfig::default()).is_empty());
    }
}
