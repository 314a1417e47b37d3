use regex::Regex;
use std::sync::LazyLock;

static NEWLINE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+").expect("static regex"));

pub const DEFAULT_MAX_CHARS: usize = 4500;

/// Splits cells that exceed a provider's request limit, preferring line breaks.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    max_chars: usize,
}

impl TextChunker {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    pub fn needs_chunking(&self, content: &str) -> bool {
        content.trim().chars().count() > self.max_chars
    }

    pub fn chunk(&self, content: &str) -> Vec<String> {
        let s = content.trim();
        if !self.needs_chunking(s) {
            return vec![s.to_string()];
        }

        let mut chunks = Vec::new();
        let mut buf = String::new();
        let mut buf_len = 0;

        for part in split_keeping_newlines(s) {
            let part_len = part.chars().count();
            if buf_len + part_len <= self.max_chars {
                buf.push_str(part);
                buf_len += part_len;
            } else {
                if !buf.trim().is_empty() {
                    chunks.push(std::mem::take(&mut buf));
                }
                buf = part.to_string();
                buf_len = part_len;
            }
        }
        if !buf.trim().is_empty() {
            chunks.push(buf);
        }

        let mut out = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if chunk.chars().count() <= self.max_chars {
                out.push(chunk);
            } else {
                let chars: Vec<char> = chunk.chars().collect();
                for piece in chars.chunks(self.max_chars) {
                    out.push(piece.iter().collect());
                }
            }
        }
        out
    }

    pub fn merge(&self, translated_chunks: Vec<String>) -> String {
        translated_chunks.concat().trim().to_string()
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

fn split_keeping_newlines(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut last = 0;
    for m in NEWLINE_RUN_RE.find_iter(s) {
        if m.start() > last {
            parts.push(&s[last..m.start()]);
        }
        parts.push(m.as_str());
        last = m.end();
    }
    if last < s.len() {
        parts.push(&s[last..]);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_trimmed_chunk() {
        let chunker = TextChunker::new(10);
        assert_eq!(chunker.chunk("  hello  "), vec!["hello"]);
        assert!(!chunker.needs_chunking("  hello  "));
    }

    #[test]
    fn packs_lines_up_to_the_limit() {
        let chunker = TextChunker::new(10);
        let chunks = chunker.chunk("aaaa\nbbbb\ncccc");
        assert_eq!(chunks, vec!["aaaa\nbbbb\n", "cccc"]);
        assert_eq!(chunker.merge(chunks), "aaaa\nbbbb\ncccc");
    }

    #[test]
    fn hard_splits_on_char_boundaries() {
        let chunker = TextChunker::new(4);
        let text = "سلامدنیا";
        let chunks = chunker.chunk(text);
        assert_eq!(chunks, vec!["سلام", "دنیا"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[test]
    fn every_chunk_respects_the_limit() {
        let chunker = TextChunker::new(50);
        let text = (0..40)
            .map(|i| format!("line number {} with some words", i))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 50));
        assert_eq!(chunks.concat(), text);
    }
}
