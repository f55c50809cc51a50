//! Text chunking for retrieval
//!
//! Splits raw text into overlapping segments suitable for embedding:
//! - Breaks at a separator hierarchy (paragraph > line > sentence > word)
//! - Hard character cut only when no separator fits in the window
//! - Consecutive segments share `overlap_chars` of context
//! - Segments are exact substrings of the input, so offsets are stable

mod boundaries;

pub use boundaries::*;

use crate::config::ChunkConfig;
use blake3::Hasher;

/// A text segment with its position in the original document
#[derive(Debug, Clone)]
pub struct ChunkSegment {
    /// The segment text (verbatim slice of the input)
    pub text: String,

    /// Segment index (0-based)
    pub index: usize,

    /// Byte start position in the original document
    pub char_start: usize,

    /// Byte end position in the original document
    pub char_end: usize,
}

impl ChunkSegment {
    fn slice(text: &str, index: usize, start: usize, end: usize) -> Self {
        Self {
            text: text[start..end].to_string(),
            index,
            char_start: start,
            char_end: end,
        }
    }
}

/// Split text into overlapping segments of at most `max_chars` bytes.
///
/// Empty input yields no segments; input no longer than `max_chars` yields a
/// single segment equal to the input. Otherwise each segment ends at the best
/// separator within its window and the next segment starts `overlap_chars`
/// before the previous end.
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Vec<ChunkSegment> {
    if text.is_empty() {
        return Vec::new();
    }

    let max_chars = config.max_chars.max(1);
    let overlap = config.overlap_chars.min(max_chars.saturating_sub(1));

    if text.len() <= max_chars {
        return vec![ChunkSegment::slice(text, 0, 0, text.len())];
    }

    let break_points = find_break_points(text);

    let mut segments = Vec::new();
    let mut start = 0;
    let mut index = 0;

    loop {
        let target = start + max_chars;

        if target >= text.len() {
            segments.push(ChunkSegment::slice(text, index, start, text.len()));
            break;
        }

        // Search window: don't break earlier than the overlap carry-back
        // (forward progress) or 80% of the chunk size (no tiny segments)
        let window_start = start + std::cmp::max(overlap + 1, max_chars * 4 / 5).min(max_chars);
        let mut end = find_best_break(text, window_start.min(target), target, &break_points);
        while end <= start {
            end += 1;
            while end < text.len() && !text.is_char_boundary(end) {
                end += 1;
            }
        }

        segments.push(ChunkSegment::slice(text, index, start, end));
        index += 1;

        // Step back for overlap, staying on a char boundary and making progress
        let mut next = ensure_char_boundary(text, end.saturating_sub(overlap));
        while next <= start {
            next += 1;
            while next < text.len() && !text.is_char_boundary(next) {
                next += 1;
            }
        }
        start = next;
    }

    segments
}

/// Compute a stable hash for document content
pub fn compute_content_hash(content: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content);
    hasher.finalize().to_hex().to_string()
}

/// Compute a stable hash for a string
pub fn compute_text_hash(text: &str) -> String {
    compute_content_hash(text.as_bytes())
}

/// Compute the hash for one chunk within a document
pub fn compute_chunk_hash(text: &str, doc_hash: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(doc_hash.as_bytes());
    hasher.update(text.as_bytes());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_chars: usize, overlap_chars: usize) -> ChunkConfig {
        ChunkConfig {
            max_chars,
            overlap_chars,
        }
    }

    #[test]
    fn test_empty_text_yields_no_segments() {
        let segments = chunk_text("", &config(800, 150));
        assert!(segments.is_empty());
    }

    #[test]
    fn test_short_text_yields_single_identical_segment() {
        let text = "This is a short document.";
        let segments = chunk_text(text, &config(800, 150));

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, text);
        assert_eq!(segments[0].index, 0);
        assert_eq!(segments[0].char_start, 0);
        assert_eq!(segments[0].char_end, text.len());
    }

    #[test]
    fn test_segments_respect_max_size() {
        let text = "Lorem ipsum dolor sit amet. ".repeat(100);
        let segments = chunk_text(&text, &config(500, 50));

        assert!(segments.len() > 1);
        for segment in &segments {
            assert!(segment.text.len() <= 500, "len {}", segment.text.len());
        }
    }

    #[test]
    fn test_consecutive_segments_share_overlap() {
        let text = "Lorem ipsum dolor sit amet consectetur. ".repeat(50);
        let overlap = 50;
        let segments = chunk_text(&text, &config(400, overlap));

        assert!(segments.len() > 1);
        for pair in segments.windows(2) {
            let shared = pair[0].char_end.saturating_sub(pair[1].char_start);
            assert!(shared >= overlap, "shared {} < overlap {}", shared, overlap);
            // The shared region reads the same from both segments
            let tail = &pair[0].text[pair[0].text.len() - shared..];
            let head = &pair[1].text[..shared];
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_deoverlapped_segments_reconstruct_input() {
        let text = "One two three four five. Six seven eight nine ten.\n\nEleven twelve thirteen fourteen. ".repeat(30);
        let segments = chunk_text(&text, &config(300, 60));

        let mut rebuilt = String::new();
        let mut covered = 0;
        for segment in &segments {
            rebuilt.push_str(&segment.text[covered - segment.char_start..]);
            covered = segment.char_end;
        }

        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let para = "word ".repeat(60); // 300 bytes
        let text = format!("{}\n\n{}", para.trim_end(), para.trim_end());
        let segments = chunk_text(&text, &config(350, 20));

        // First segment should end right after the paragraph separator
        assert!(segments[0].text.ends_with("\n\n"));
    }

    #[test]
    fn test_hard_cut_on_unbroken_text() {
        let text = "x".repeat(1000);
        let segments = chunk_text(&text, &config(200, 20));

        assert!(segments.len() > 1);
        for segment in &segments {
            assert!(segment.text.len() <= 200);
        }
        assert_eq!(segments.last().unwrap().char_end, 1000);
    }

    #[test]
    fn test_multibyte_text_never_splits_chars() {
        let text = "été chaud ".repeat(100);
        let segments = chunk_text(&text, &config(120, 30));

        for segment in &segments {
            assert!(text.is_char_boundary(segment.char_start));
            assert!(text.is_char_boundary(segment.char_end));
        }
    }

    #[test]
    fn test_chunk_hash_stability() {
        let doc_hash = compute_text_hash("document body");
        let h1 = compute_chunk_hash("chunk text", &doc_hash);
        let h2 = compute_chunk_hash("chunk text", &doc_hash);
        let h3 = compute_chunk_hash("other text", &doc_hash);

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }
}
