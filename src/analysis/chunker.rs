//! Boundary-aware document chunking.
//!
//! Long documents are split into overlapping segments that break on
//! paragraph boundaries (blank lines) where possible. Sizes are measured in
//! characters, not bytes, so multi-byte text is never cut mid-character.

use crate::error::AnalysisError;
use crate::models::Segment;
use tracing::debug;

/// Paragraph delimiter; also used to join paragraphs inside a segment.
pub const PARAGRAPH_DELIMITER: &str = "\n\n";

const DELIMITER_LEN: usize = 2;

/// Splits text into segments of at most `max_size` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    max_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker. `overlap` must be smaller than `max_size` so the
    /// force-split step stays positive.
    pub fn new(max_size: usize, overlap: usize) -> Result<Self, AnalysisError> {
        if max_size == 0 {
            return Err(AnalysisError::Config(
                "max_chunk_size must be at least 1".to_string(),
            ));
        }
        if overlap >= max_size {
            return Err(AnalysisError::Config(format!(
                "chunk_overlap ({}) must be smaller than max_chunk_size ({})",
                overlap, max_size
            )));
        }
        Ok(Self { max_size, overlap })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Whether `text` is too long to be analyzed in one piece.
    pub fn needs_chunking(&self, text: &str) -> bool {
        char_len(text) > self.max_size
    }

    /// Split `text` into ordered segments.
    ///
    /// Text that fits is returned whole as a single segment, including the
    /// empty string.
    pub fn chunk(&self, text: &str) -> Vec<Segment> {
        if !self.needs_chunking(text) {
            return vec![Segment {
                text: text.to_string(),
                index: 0,
                total: 1,
            }];
        }

        let mut pieces: Vec<String> = Vec::new();
        let mut buffer = String::new();
        let mut buffer_len = 0;

        for paragraph in text.split(PARAGRAPH_DELIMITER) {
            let paragraph_len = char_len(paragraph);

            if buffer_len + paragraph_len + DELIMITER_LEN <= self.max_size {
                if !buffer.is_empty() {
                    buffer.push_str(PARAGRAPH_DELIMITER);
                    buffer_len += DELIMITER_LEN;
                }
                buffer.push_str(paragraph);
                buffer_len += paragraph_len;
                continue;
            }

            if !buffer.is_empty() {
                let closed = std::mem::take(&mut buffer);
                buffer_len = 0;

                if paragraph_len <= self.max_size {
                    // Seed the next buffer with the tail of the closed one,
                    // shortened if the paragraph would not fit beside it.
                    let room = self
                        .max_size
                        .saturating_sub(paragraph_len + DELIMITER_LEN);
                    let seed = tail(&closed, self.overlap.min(room));
                    if !seed.is_empty() {
                        buffer.push_str(seed);
                        buffer.push_str(PARAGRAPH_DELIMITER);
                    }
                    buffer.push_str(paragraph);
                    buffer_len = char_len(&buffer);
                    pieces.push(closed);
                    continue;
                }

                pieces.push(closed);
            }

            if paragraph_len > self.max_size {
                self.force_split(paragraph, &mut pieces);
            } else {
                buffer.push_str(paragraph);
                buffer_len = paragraph_len;
            }
        }

        // Identical text at different positions stays as separate segments
        if !buffer.is_empty() {
            pieces.push(buffer);
        }

        // Nothing but delimiters: cut the raw text so the result is never empty
        if pieces.is_empty() {
            self.force_split(text, &mut pieces);
        }

        let total = pieces.len();
        debug!(
            "Chunked {} chars into {} segments (max {}, overlap {})",
            char_len(text),
            total,
            self.max_size,
            self.overlap
        );

        pieces
            .into_iter()
            .enumerate()
            .map(|(index, text)| Segment { text, index, total })
            .collect()
    }

    /// Cut an oversized paragraph into fixed-width slices that overlap by
    /// `overlap` characters.
    fn force_split(&self, paragraph: &str, pieces: &mut Vec<String>) {
        let bounds: Vec<usize> = paragraph
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(paragraph.len()))
            .collect();
        let chars = bounds.len() - 1;
        let step = self.max_size - self.overlap;

        let mut start = 0;
        loop {
            let end = (start + self.max_size).min(chars);
            pieces.push(paragraph[bounds[start]..bounds[end]].to_string());
            if end == chars {
                break;
            }
            start += step;
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The trailing `n` characters of `s`, or all of `s` if it is shorter.
fn tail(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((i, _)) => &s[i..],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(count: usize, len: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let label = format!("P{:04}", i);
                let filler = "x".repeat(len - label.len());
                format!("{}{}", label, filler)
            })
            .collect()
    }

    #[test]
    fn test_new_rejects_overlap_not_below_size() {
        assert!(Chunker::new(100, 100).is_err());
        assert!(Chunker::new(100, 150).is_err());
        assert!(Chunker::new(0, 0).is_err());
        assert!(Chunker::new(100, 99).is_ok());
    }

    #[test]
    fn test_short_text_single_segment() {
        let chunker = Chunker::new(100, 10).unwrap();
        let text = "Short statement.\n\nSecond paragraph.";

        let segments = chunker.chunk(text);
        assert_eq!(
            segments,
            vec![Segment {
                text: text.to_string(),
                index: 0,
                total: 1
            }]
        );
    }

    #[test]
    fn test_empty_text_single_segment() {
        let chunker = Chunker::new(100, 10).unwrap();
        let segments = chunker.chunk("");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "");
        assert_eq!(segments[0].total, 1);
    }

    #[test]
    fn test_exactly_max_size_is_not_split() {
        let chunker = Chunker::new(50, 5).unwrap();
        let text = "y".repeat(50);
        assert_eq!(chunker.chunk(&text).len(), 1);
    }

    #[test]
    fn test_paragraph_packing_with_overlap() {
        let chunker = Chunker::new(25, 4).unwrap();
        let text = "aaaaaaaaaa\n\nbbbbbbbbbb\n\ncccccccccc";

        let segments = chunker.chunk(&text);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "aaaaaaaaaa\n\nbbbbbbbbbb");
        // Tail of the closed segment, joined to the next paragraph
        assert_eq!(segments[1].text, "bbbb\n\ncccccccccc");
    }

    #[test]
    fn test_indices_and_totals() {
        let chunker = Chunker::new(1_000, 100).unwrap();
        let text = paragraphs(30, 300).join(PARAGRAPH_DELIMITER);

        let segments = chunker.chunk(&text);
        let total = segments.len();
        assert!(total > 1);
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.index, i);
            assert_eq!(segment.total, total);
            assert!(segment.index < segment.total);
            assert!(!segment.text.is_empty());
        }
    }

    #[test]
    fn test_every_paragraph_is_covered_in_order() {
        let chunker = Chunker::new(1_000, 100).unwrap();
        let paras = paragraphs(40, 250);
        let text = paras.join(PARAGRAPH_DELIMITER);

        let segments = chunker.chunk(&text);
        let mut last_segment = 0;
        for para in &paras {
            let found = segments
                .iter()
                .skip(last_segment)
                .position(|s| s.text.contains(para.as_str()))
                .map(|offset| offset + last_segment);
            let found = found.unwrap_or_else(|| panic!("paragraph missing: {}", &para[..5]));
            assert!(found >= last_segment);
            last_segment = found;
        }
    }

    #[test]
    fn test_segments_respect_max_size() {
        let chunker = Chunker::new(1_000, 200).unwrap();
        // Mix of lengths, including one that barely fits next to a seed
        let mut paras = paragraphs(10, 300);
        paras.push("z".repeat(990));
        paras.extend(paragraphs(5, 600));
        let text = paras.join(PARAGRAPH_DELIMITER);

        for segment in chunker.chunk(&text) {
            assert!(segment.text.chars().count() <= 1_000);
        }
    }

    #[test]
    fn test_force_split_oversized_paragraph() {
        let chunker = Chunker::new(100, 20).unwrap();
        let paragraph: String = (0..250).map(|i| char::from(b'a' + (i % 26) as u8)).collect();

        let segments = chunker.chunk(&paragraph);
        // Slices start at 0, 80, 160; the last one reaches the end
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].text, paragraph[0..100]);
        assert_eq!(segments[1].text, paragraph[80..180]);
        assert_eq!(segments[2].text, paragraph[160..250]);

        // Consecutive slices overlap by exactly `overlap` characters
        assert_eq!(&segments[0].text[80..], &segments[1].text[..20]);

        // Dropping the overlap recovers the original text
        let mut rebuilt = segments[0].text.clone();
        for segment in &segments[1..] {
            rebuilt.push_str(&segment.text[20..]);
        }
        assert_eq!(rebuilt, paragraph);
    }

    #[test]
    fn test_oversized_paragraph_after_buffer() {
        let chunker = Chunker::new(100, 10).unwrap();
        let big = "q".repeat(150);
        let text = format!("intro paragraph\n\n{}\n\noutro", big);

        let segments = chunker.chunk(&text);
        assert_eq!(segments[0].text, "intro paragraph");
        assert!(segments.iter().all(|s| s.text.chars().count() <= 100));
        assert_eq!(segments.last().map(|s| s.text.as_str()), Some("outro"));
    }

    #[test]
    fn test_force_split_terminates_with_large_overlap() {
        let chunker = Chunker::new(10, 9).unwrap();
        let text = "w".repeat(200);

        let segments = chunker.chunk(&text);
        // Step of one character
        assert_eq!(segments.len(), 191);
        assert!(segments.iter().all(|s| s.text.len() == 10));
    }

    #[test]
    fn test_multibyte_text() {
        let chunker = Chunker::new(12, 3).unwrap();
        let text = "é".repeat(30);

        let segments = chunker.chunk(&text);
        assert!(segments.len() > 1);
        for segment in &segments {
            assert!(segment.text.chars().count() <= 12);
            assert!(segment.text.chars().all(|c| c == 'é'));
        }
    }

    #[test]
    fn test_duplicate_paragraphs_stay_distinct() {
        let chunker = Chunker::new(20, 2).unwrap();
        let text = ["same paragraph 1234"; 3].join(PARAGRAPH_DELIMITER);

        let segments = chunker.chunk(&text);
        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| s.text == "same paragraph 1234"));
    }

    #[test]
    fn test_large_document_scenario() {
        let chunker = Chunker::new(50_000, 1_000).unwrap();
        let text = paragraphs(200, 998).join(PARAGRAPH_DELIMITER);
        assert_eq!(text.chars().count(), 200 * 998 + 199 * 2);

        let segments = chunker.chunk(&text);
        assert!(segments.len() >= 4);
        for segment in &segments {
            assert!(segment.text.chars().count() <= 50_000);
            assert_eq!(segment.total, segments.len());
        }
    }

    #[test]
    fn test_delimiter_only_text_still_yields_segments() {
        let chunker = Chunker::new(10, 2).unwrap();
        let text = PARAGRAPH_DELIMITER.repeat(10);

        let segments = chunker.chunk(&text);

        assert!(!segments.is_empty());
        for segment in &segments {
            assert!(!segment.text.is_empty());
            assert!(char_len(&segment.text) <= 10);
            assert_eq!(segment.total, segments.len());
        }
    }

    #[test]
    fn test_tail() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("ab", 5), "ab");
        assert_eq!(tail("abc", 0), "");
        assert_eq!(tail("naïve", 3), "ïve");
    }
}
