//! Splits document text into classification-sized chunks.
//!
//! Paragraphs are packed up to a target size with a fixed overlap carried
//! between consecutive chunks, so statements straddling a boundary are
//! seen twice rather than never. Oversized paragraphs fall back to a
//! sliding window that prefers to break at a sentence boundary near the
//! end of the window.

/// One classification unit: a bounded span of document text.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    /// Position in document order, starting at 0.
    pub index: usize,
    /// Byte offset of the chunk start in the source text. Approximate
    /// for chunks that begin with carried overlap.
    pub char_offset: usize,
}

pub struct TextSplitter {
    target_chars: usize,
    overlap_chars: usize,
}

impl TextSplitter {
    /// Overlap is capped at half the target so every chunk carries more
    /// fresh text than repeated text.
    pub fn new(target_chars: usize, overlap_chars: usize) -> Self {
        let target_chars = target_chars.max(1);
        Self {
            target_chars,
            overlap_chars: overlap_chars.min(target_chars / 2),
        }
    }

    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut current = String::new();
        let mut current_start = 0usize;
        let mut has_fresh = false;

        for (offset, paragraph) in paragraph_spans(text) {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }

            if paragraph.len() > self.target_chars {
                // Flush packed text; the window split manages its own overlap.
                if has_fresh {
                    push(&mut chunks, std::mem::take(&mut current), current_start);
                }
                current.clear();
                has_fresh = false;
                self.split_long_paragraph(&mut chunks, paragraph, offset);
                continue;
            }

            let separator = if current.is_empty() { 0 } else { 2 };
            if current.len() + separator + paragraph.len() > self.target_chars {
                if has_fresh {
                    let carried = tail(&current, self.overlap_chars).to_string();
                    push(&mut chunks, std::mem::take(&mut current), current_start);
                    current = carried;
                } else {
                    // Carry-only text never forms a chunk of its own.
                    current.clear();
                }

                // Drop the carry when the next paragraph leaves no room for it.
                if !current.is_empty() && current.len() + 2 + paragraph.len() > self.target_chars {
                    current.clear();
                }
                current_start = offset.saturating_sub(if current.is_empty() {
                    0
                } else {
                    current.len() + 2
                });
            }

            if current.is_empty() {
                current_start = offset;
            } else {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
            has_fresh = true;
        }

        if has_fresh && !current.is_empty() {
            push(&mut chunks, current, current_start);
        }

        chunks
    }

    /// Sliding window over a paragraph larger than the target. Breaks at
    /// a sentence boundary when one falls in the final fifth of the
    /// window, then steps back by the overlap.
    fn split_long_paragraph(&self, chunks: &mut Vec<Chunk>, paragraph: &str, base_offset: usize) {
        let mut start = 0usize;

        while start < paragraph.len() {
            let mut end = (start + self.target_chars).min(paragraph.len());
            while !paragraph.is_char_boundary(end) {
                end -= 1;
            }
            // A char wider than the window walks `end` back onto `start`;
            // take that char whole so the window always advances.
            if end <= start {
                end = (start + 1).min(paragraph.len());
                while !paragraph.is_char_boundary(end) {
                    end += 1;
                }
            }

            let break_at = if end < paragraph.len() {
                let mut search_from = start + self.target_chars * 4 / 5;
                while search_from < end && !paragraph.is_char_boundary(search_from) {
                    search_from += 1;
                }
                if search_from >= end {
                    end
                } else {
                    paragraph[search_from..end]
                        .rfind(". ")
                        .map(|pos| search_from + pos + 2)
                        .unwrap_or(end)
                }
            } else {
                end
            };

            let piece = paragraph[start..break_at].trim();
            if !piece.is_empty() {
                push(chunks, piece.to_string(), base_offset + start);
            }

            if break_at >= paragraph.len() {
                break;
            }

            let mut next = break_at - self.overlap_chars.min(break_at);
            while !paragraph.is_char_boundary(next) {
                next += 1;
            }
            // The window must advance even with a pathological overlap.
            start = if next > start { next } else { break_at };
        }
    }
}

fn push(chunks: &mut Vec<Chunk>, text: String, char_offset: usize) {
    let index = chunks.len();
    chunks.push(Chunk {
        text,
        index,
        char_offset,
    });
}

/// Blank-line separated segments with their byte offsets.
fn paragraph_spans(text: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    for (idx, _) in text.match_indices("\n\n") {
        spans.push((start, &text[start..idx]));
        start = idx + 2;
    }
    spans.push((start, &text[start..]));
    spans
}

/// Last `want` bytes of `s`, moved forward to the nearest char boundary.
fn tail(s: &str, want: usize) -> &str {
    if want == 0 {
        return "";
    }
    if s.len() <= want {
        return s;
    }
    let mut cut = s.len() - want;
    while !s.is_char_boundary(cut) {
        cut += 1;
    }
    &s[cut..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter() -> TextSplitter {
        TextSplitter::new(200, 40)
    }

    fn sentence_paragraph(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("Sentence number {i} carries a bit of filler text."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = splitter().split("A single small paragraph.");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "A single small paragraph.");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].char_offset, 0);
    }

    #[test]
    fn empty_and_whitespace_yield_no_chunks() {
        assert!(splitter().split("").is_empty());
        assert!(splitter().split("   \n\n  \n \t ").is_empty());
    }

    #[test]
    fn paragraphs_pack_until_target() {
        let text = "First paragraph here.\n\nSecond paragraph here.\n\nThird paragraph here.";

        let chunks = splitter().split(text);

        assert_eq!(chunks.len(), 1, "all three fit inside the target");
        assert!(chunks[0].text.contains("First"));
        assert!(chunks[0].text.contains("Third"));
    }

    #[test]
    fn no_chunk_exceeds_target() {
        let paragraphs: Vec<String> = (0..12).map(|_| sentence_paragraph(3)).collect();
        let text = paragraphs.join("\n\n");

        for chunk in splitter().split(&text) {
            assert!(
                chunk.text.len() <= 200,
                "chunk of {} bytes exceeds target",
                chunk.text.len()
            );
        }
    }

    #[test]
    fn size_split_carries_overlap() {
        let a = "A".repeat(150);
        let b = "B".repeat(150);
        let text = format!("{a}\n\n{b}");

        let chunks = splitter().split(&text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, a);
        let carried = &chunks[0].text[chunks[0].text.len() - 40..];
        assert!(
            chunks[1].text.starts_with(carried),
            "second chunk repeats the tail of the first"
        );
        assert!(chunks[1].text.ends_with(&b));
    }

    #[test]
    fn long_paragraph_splits_on_sentence_boundary() {
        let text = sentence_paragraph(20);
        assert!(text.len() > 200);

        let chunks = splitter().split(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.len() <= 200);
        }
        // All but the last window should end where a sentence ended.
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(
                chunk.text.ends_with('.'),
                "window broke mid-sentence: ...{:?}",
                &chunk.text[chunk.text.len().saturating_sub(20)..]
            );
        }
    }

    #[test]
    fn unbroken_run_hard_splits() {
        let text = "X".repeat(450);

        let chunks = TextSplitter::new(200, 0).split(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text.len(), 200);
        assert_eq!(chunks[1].text.len(), 200);
        assert_eq!(chunks[2].text.len(), 50);
    }

    #[test]
    fn indices_sequential_and_offsets_monotonic() {
        let paragraphs: Vec<String> = (0..10).map(|_| sentence_paragraph(4)).collect();
        let text = paragraphs.join("\n\n");

        let chunks = splitter().split(&text);

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
        for pair in chunks.windows(2) {
            assert!(pair[0].char_offset <= pair[1].char_offset);
        }
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        // é is two bytes in UTF-8; the odd overlap forces the window to
        // land mid-char and walk to a boundary.
        let text = "é".repeat(501);

        let chunks = TextSplitter::new(200, 31).split(&text);

        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.text.len() <= 200);
            assert!(chunk.text.chars().all(|c| c == 'é'));
        }
    }

    #[test]
    fn window_narrower_than_one_char_takes_whole_chars() {
        // Each € is three bytes, wider than the two-byte window; the
        // splitter must emit it whole and keep advancing.
        let chunks = TextSplitter::new(2, 0).split("€€");

        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.text == "€"));
        assert_eq!(chunks[0].char_offset, 0);
        assert_eq!(chunks[1].char_offset, 3);

        assert_eq!(TextSplitter::new(1, 0).split("é").len(), 1);
        assert_eq!(TextSplitter::new(2, 1).split("€a€").len(), 3);
    }

    #[test]
    fn overlap_capped_below_target() {
        let splitter = TextSplitter::new(100, 400);
        let text = format!("{}\n\n{}", "A".repeat(90), "B".repeat(90));

        let chunks = splitter.split(&text);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].text.len() <= 100 + 50, "carry stays bounded");
    }
}
