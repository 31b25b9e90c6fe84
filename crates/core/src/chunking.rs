use crate::models::{Chunk, IngestionOptions};

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub window_chars: usize,
    pub overlap_chars: usize,
}

impl From<&IngestionOptions> for ChunkingConfig {
    fn from(value: &IngestionOptions) -> Self {
        Self {
            window_chars: value.window_chars,
            overlap_chars: value.overlap_chars,
        }
    }
}

/// Splits one page's text into fixed-size overlapping character windows.
///
/// Windows start every `window_chars - overlap_chars` characters, so
/// consecutive non-final windows overlap by exactly `overlap_chars`. Windows
/// that are empty after trimming are dropped. Pure function.
pub fn chunk_page(
    text: &str,
    doc_id: &str,
    filename: &str,
    page: u32,
    config: ChunkingConfig,
) -> Vec<Chunk> {
    let chars: Vec<char> = text.chars().collect();
    let step = config.window_chars.saturating_sub(config.overlap_chars).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + config.window_chars).min(chars.len());
        let piece: String = chars[start..end].iter().collect();

        if !piece.trim().is_empty() {
            chunks.push(Chunk {
                doc_id: doc_id.to_string(),
                filename: filename.to_string(),
                page,
                text: piece,
                embedding: None,
            });
        }

        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::{chunk_page, ChunkingConfig};

    fn config(window: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            window_chars: window,
            overlap_chars: overlap,
        }
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunks = chunk_page("", "doc1", "a.pdf", 1, config(10, 2));
        assert!(chunks.is_empty());
    }

    #[test]
    fn whitespace_only_windows_are_dropped() {
        let chunks = chunk_page("          ", "doc1", "a.pdf", 1, config(4, 0));
        assert!(chunks.is_empty());
    }

    #[test]
    fn nonfinal_windows_have_exact_length_and_overlap() {
        let text: String = ('a'..='z').collect();
        let window = 10;
        let overlap = 3;
        let chunks = chunk_page(&text, "doc1", "a.pdf", 1, config(window, overlap));

        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(chunk.text.chars().count(), window);
        }

        for pair in chunks.windows(2) {
            let left: Vec<char> = pair[0].text.chars().collect();
            let right: Vec<char> = pair[1].text.chars().collect();
            assert_eq!(&left[left.len() - overlap..], &right[..overlap]);
        }
    }

    #[test]
    fn final_window_may_be_shorter() {
        let chunks = chunk_page("abcdefghijk", "doc1", "a.pdf", 1, config(5, 1));
        // offsets 0, 4, 8 over 11 chars: last window holds 3 chars
        assert_eq!(chunks.last().expect("chunks").text, "ijk");
    }

    #[test]
    fn short_text_yields_single_window() {
        let chunks = chunk_page("tiny", "doc1", "a.pdf", 3, config(100, 10));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "tiny");
        assert_eq!(chunks[0].page, 3);
        assert_eq!(chunks[0].doc_id, "doc1");
        assert!(chunks[0].embedding.is_none());
    }

    #[test]
    fn multibyte_text_splits_on_character_boundaries() {
        let text = "αβγδε".repeat(4);
        let chunks = chunk_page(&text, "doc1", "a.pdf", 1, config(7, 2));
        let total: usize = chunks.iter().map(|c| c.text.chars().count()).sum();
        assert!(total >= text.chars().count());
    }
}
