//! Sentence-based chunking with a word-level overlap seed.
//!
//! Text is split after runs of terminator characters (ASCII `.!?` only when
//! followed by whitespace or the end of the text), sentences are packed
//! greedily into chunks of at most `max_chars` characters, and each new chunk
//! starts with the last few words of the previous one. A sentence is never
//! split, so a single sentence longer than `max_chars` becomes one oversized
//! chunk.
//!
//! The overlap seed is counted in whitespace-separated words. Scripts written
//! without spaces (Chinese, Japanese) form one "word" per sentence, so their
//! chunks get no overlap at all.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Chunk;

/// How many characters of `overlap` buy one word of seed.
pub const OVERLAP_CHARS_PER_WORD: usize = 10;

pub const DEFAULT_TERMINATORS: &str = "。！？\n.!?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap: usize,
    pub terminators: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_chars: 500, overlap: 50, terminators: DEFAULT_TERMINATORS.to_string() }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(Error::InvalidConfig("chunking.max_chars must be > 0".into()));
        }
        if self.terminators.is_empty() {
            return Err(Error::InvalidConfig("chunking.terminators must not be empty".into()));
        }
        Ok(())
    }

    pub fn overlap_words(&self) -> usize { self.overlap / OVERLAP_CHARS_PER_WORD }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self { Self { config } }

    /// Split `text` into chunk strings. Empty or whitespace-only input yields
    /// an empty list.
    pub fn split(&self, text: &str) -> Vec<String> {
        let max_chars = self.config.max_chars;
        let overlap_words = self.config.overlap_words();
        let mut chunks = Vec::new();
        let mut buffer = String::new();
        let mut buffer_chars = 0usize;

        for (sentence, terminator) in sentences(text, &self.config.terminators) {
            let piece_chars = sentence.chars().count() + terminator.chars().count();
            if buffer_chars + piece_chars > max_chars && !buffer.is_empty() {
                let seed = overlap_seed(&buffer, overlap_words);
                push_chunk(&mut chunks, &buffer);
                buffer.clear();
                if let Some(seed) = seed {
                    buffer.push_str(&seed);
                    buffer.push(' ');
                    buffer.push_str(sentence.trim_start());
                } else {
                    buffer.push_str(sentence);
                }
                buffer.push_str(terminator);
                buffer_chars = buffer.chars().count();
            } else {
                buffer.push_str(sentence);
                buffer.push_str(terminator);
                buffer_chars += piece_chars;
            }
        }
        push_chunk(&mut chunks, &buffer);
        chunks
    }

    /// Split a document and number its chunks `0..n` in source order.
    pub fn chunk_document(&self, document_id: &str, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(position, text)| Chunk { document_id: document_id.to_string(), position, text })
            .collect()
    }
}

/// `chunk(text, max_size, overlap_hint)` with the default terminator set.
pub fn split_text(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    Chunker::new(ChunkingConfig { max_chars, overlap, ..ChunkingConfig::default() }).split(text)
}

fn push_chunk(chunks: &mut Vec<String>, buffer: &str) {
    let trimmed = buffer.trim();
    if !trimmed.is_empty() { chunks.push(trimmed.to_string()); }
}

/// Last `words` whitespace-separated words of `buffer`, only when they are a
/// proper tail; a seed that would repeat the whole buffer is dropped.
fn overlap_seed(buffer: &str, words: usize) -> Option<String> {
    if words == 0 { return None; }
    let all: Vec<&str> = buffer.split_whitespace().collect();
    if all.len() <= words { return None; }
    Some(all[all.len() - words..].join(" "))
}

/// Split into `(sentence, terminator_run)` pairs. The terminator run is kept
/// so it can be re-inserted verbatim; the final sentence may have none.
/// A run made only of ASCII punctuation ends a sentence only when whitespace
/// or the end of the text follows it, so `3.5` and `notes.txt` stay whole.
/// Whitespace-only sentences are dropped with their terminators.
fn sentences<'a>(text: &'a str, terminators: &str) -> Vec<(&'a str, &'a str)> {
    let is_term = |c: char| terminators.contains(c);
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_term(c) { continue; }
        let mut end = i + c.len_utf8();
        let mut strong = !c.is_ascii() || c.is_whitespace();
        while let Some(&(j, d)) = chars.peek() {
            if !is_term(d) { break; }
            strong |= !d.is_ascii() || d.is_whitespace();
            end = j + d.len_utf8();
            chars.next();
        }
        let at_break = chars.peek().map_or(true, |&(_, d)| d.is_whitespace());
        if strong || at_break {
            out.push((&text[start..i], &text[i..end]));
            start = end;
        }
    }
    if start < text.len() { out.push((&text[start..], "")); }
    out.retain(|(sentence, _)| !sentence.trim().is_empty());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentences_keep_terminator_runs() {
        let parts = sentences("真的吗？！好的。\n尾巴", DEFAULT_TERMINATORS);
        assert_eq!(parts, vec![("真的吗", "？！"), ("好的", "。\n"), ("尾巴", "")]);
    }

    #[test]
    fn sentences_drop_blank_segments() {
        let parts = sentences("\n\n  \nOne.\n \nTwo", DEFAULT_TERMINATORS);
        assert_eq!(parts, vec![("One", ".\n"), ("Two", "")]);
    }

    #[test]
    fn ascii_dots_inside_words_do_not_end_sentences() {
        let parts = sentences("Read notes.txt first. Then v1.2!", DEFAULT_TERMINATORS);
        assert_eq!(parts, vec![("Read notes.txt first", "."), (" Then v1.2", "!")]);
    }

    #[test]
    fn decimal_on_flush_boundary_stays_in_one_chunk() {
        let chunks = split_text("水位上升了3.5米。泵站需要检修。", 8, 50);
        assert_eq!(chunks, vec!["水位上升了3.5米。", "泵站需要检修。"]);
    }

    #[test]
    fn one_chunk_per_cjk_sentence_when_small() {
        let chunks = split_text("猫喜欢睡觉。狗喜欢跑步。鸟喜欢飞翔。", 10, 50);
        assert_eq!(chunks, vec!["猫喜欢睡觉。", "狗喜欢跑步。", "鸟喜欢飞翔。"]);
    }

    #[test]
    fn packs_sentences_up_to_max_chars() {
        let chunks = split_text("猫喜欢睡觉。狗喜欢跑步。鸟喜欢飞翔。", 12, 50);
        assert_eq!(chunks, vec!["猫喜欢睡觉。狗喜欢跑步。", "鸟喜欢飞翔。"]);
    }

    #[test]
    fn no_terminators_is_one_oversized_chunk() {
        let text = "a long line without any sentence end at all";
        assert_eq!(split_text(text, 5, 0), vec![text.to_string()]);
    }

    #[test]
    fn empty_and_blank_input_yield_nothing() {
        assert!(split_text("", 100, 50).is_empty());
        assert!(split_text(" \n\t\n", 100, 50).is_empty());
        assert!(split_text("。。！\n", 100, 50).is_empty());
    }

    #[test]
    fn overlap_seeds_next_chunk_with_trailing_words() {
        let text = "one two three four five six. seven eight nine.";
        // 20 chars of overlap => 2 words of seed
        let chunks = split_text(text, 30, 20);
        assert_eq!(chunks, vec!["one two three four five six.", "five six. seven eight nine."]);
    }

    #[test]
    fn overlap_never_repeats_a_whole_chunk() {
        let chunks = split_text("alpha beta. gamma delta.", 12, 50);
        assert_eq!(chunks, vec!["alpha beta.", "gamma delta."]);
    }

    #[test]
    fn chunk_document_numbers_positions() {
        let chunker = Chunker::new(ChunkingConfig { max_chars: 10, ..ChunkingConfig::default() });
        let chunks = chunker.chunk_document("report.txt", "猫喜欢睡觉。狗喜欢跑步。鸟喜欢飞翔。");
        let positions: Vec<usize> = chunks.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert!(chunks.iter().all(|c| c.document_id == "report.txt"));
    }

    #[test]
    fn config_validation() {
        assert!(ChunkingConfig::default().validate().is_ok());
        let bad = ChunkingConfig { max_chars: 0, ..ChunkingConfig::default() };
        assert!(bad.validate().is_err());
        let bad = ChunkingConfig { terminators: String::new(), ..ChunkingConfig::default() };
        assert!(bad.validate().is_err());
    }
}
