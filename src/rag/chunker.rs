//! Fixed-policy overlapping text chunker.
//!
//! Chunk `i` starts at character offset `i * (chunk_size - chunk_overlap)`
//! and spans up to `chunk_size` characters, so adjacent chunks share a
//! `chunk_overlap`-character region. The policy is deterministic: the same
//! text always produces the same chunk sequence.

use crate::config::ChunkingConfig;

pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    if total == 0 {
        return Vec::new();
    }

    // validate() ran at startup, so the stride is always positive here.
    let stride = config.chunk_size - config.chunk_overlap;

    let mut chunks = Vec::with_capacity(total.div_ceil(stride));
    let mut start = 0;
    while start < total {
        let end = (start + config.chunk_size).min(total);
        chunks.push(chars[start..end].iter().collect());
        start += stride;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(chunk_size: usize, chunk_overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            chunk_overlap,
        }
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", &cfg(800, 100)).is_empty());
    }

    #[test]
    fn short_text_yields_single_whole_chunk() {
        let chunks = chunk_text("hello world", &cfg(800, 100));
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn chunk_count_matches_ceil_formula() {
        let config = cfg(50, 10);
        let stride = config.chunk_size - config.chunk_overlap;
        for len in [1usize, 39, 40, 41, 100, 123, 400] {
            let text: String = "x".repeat(len);
            let chunks = chunk_text(&text, &config);
            assert_eq!(chunks.len(), len.div_ceil(stride), "length {}", len);
        }
    }

    #[test]
    fn no_chunk_exceeds_configured_size() {
        let text: String = (0..997).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        for chunk in chunk_text(&text, &cfg(80, 20)) {
            assert!(chunk.chars().count() <= 80);
        }
    }

    #[test]
    fn adjacent_chunks_share_the_overlap_region() {
        let text: String = (0..2000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let config = cfg(800, 100);
        let chunks = chunk_text(&text, &config);
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let cur: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            let width = config.chunk_overlap.min(next.len());
            assert_eq!(cur[cur.len() - width..], next[..width]);
        }
    }

    #[test]
    fn concatenating_chunks_minus_overlap_rebuilds_the_text() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let config = cfg(100, 25);
        let chunks = chunk_text(&text, &config);

        let mut rebuilt = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                rebuilt.push_str(chunk);
            } else {
                let tail: String = chunk.chars().skip(config.chunk_overlap).collect();
                rebuilt.push_str(&tail);
            }
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn multibyte_text_is_split_on_character_boundaries() {
        let text = "日本語のテキスト。".repeat(30);
        let chunks = chunk_text(&text, &cfg(40, 10));
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40);
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "alpha beta gamma delta ".repeat(60);
        let config = cfg(120, 30);
        assert_eq!(chunk_text(&text, &config), chunk_text(&text, &config));
    }
}
