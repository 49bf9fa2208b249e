//! Token aggregation: turns an incremental fragment stream into
//! synthesis-ready chunks.

use crate::chunk::policy::ChunkPolicy;

/// Accumulates token fragments and cuts them into formatted chunks at
/// policy boundaries.
///
/// The buffer and fragment counter reset on every boundary, including when
/// formatting yields nothing speakable: repeated punctuation must not pile
/// up into later chunks.
pub struct ChunkAggregator {
    policy: Box<dyn ChunkPolicy>,
    buffer: String,
    fragments: usize,
}

impl ChunkAggregator {
    /// Creates an aggregator driven by the given policy.
    pub fn new(policy: Box<dyn ChunkPolicy>) -> Self {
        Self {
            policy,
            buffer: String::new(),
            fragments: 0,
        }
    }

    /// Appends one fragment. Returns a formatted chunk when a boundary or
    /// the over-length fallback fires and the formatted text is non-empty.
    pub fn push(&mut self, content: &str) -> Option<String> {
        self.buffer.push_str(content);
        self.fragments += 1;

        if self.policy.is_boundary(&self.buffer) || self.policy.is_over_length(self.fragments) {
            return self.cut();
        }
        None
    }

    /// Formats and returns any residual buffer. Called at end of stream so
    /// a reply without terminal punctuation is still spoken.
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        self.cut()
    }

    /// Discards the pending buffer, e.g. when the current unit is abandoned.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.fragments = 0;
    }

    /// True when no fragments are pending.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn cut(&mut self) -> Option<String> {
        let formatted = self.policy.format(&self.buffer);
        self.reset();
        if formatted.is_empty() {
            None
        } else {
            Some(formatted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::policy::SpokenTextPolicy;

    fn aggregator(max_fragments: usize) -> ChunkAggregator {
        ChunkAggregator::new(Box::new(SpokenTextPolicy::new(
            vec!['.', '!', '?', ':'],
            max_fragments,
        )))
    }

    #[test]
    fn accumulates_until_sentence_end() {
        let mut agg = aggregator(100);

        assert_eq!(agg.push("Hello"), None);
        assert_eq!(agg.push(", "), None);
        assert_eq!(agg.push("world"), None);
        assert_eq!(agg.push("."), Some("Hello, world.".to_string()));
        assert!(agg.is_empty());
    }

    #[test]
    fn trailing_whitespace_defers_the_cut() {
        let mut agg = aggregator(100);

        assert_eq!(agg.push("A. "), None);
        assert_eq!(agg.push("B. "), None);
        assert_eq!(agg.push("C."), Some("A. B. C.".to_string()));
    }

    #[test]
    fn over_length_cuts_without_punctuation() {
        let mut agg = aggregator(45);
        let mut chunks = Vec::new();

        for _ in 0..200 {
            if let Some(chunk) = agg.push("word ") {
                chunks.push(chunk);
            }
        }
        if let Some(chunk) = agg.flush() {
            chunks.push(chunk);
        }

        // ceil(200 / 45) chunks, none larger than 45 fragments' worth
        assert_eq!(chunks.len(), 5);
        for chunk in &chunks {
            assert!(chunk.split_whitespace().count() <= 45);
        }
    }

    #[test]
    fn counter_resets_after_each_cut() {
        let mut agg = aggregator(3);

        assert_eq!(agg.push("a"), None);
        assert_eq!(agg.push("b"), None);
        assert_eq!(agg.push("c"), Some("abc".to_string()));
        assert_eq!(agg.push("d"), None);
        assert_eq!(agg.push("e"), None);
        assert_eq!(agg.push("f"), Some("def".to_string()));
    }

    #[test]
    fn unspeakable_chunk_is_suppressed_but_buffer_resets() {
        let mut agg = aggregator(2);

        // Two fragments of pure emphasis markers format to nothing
        assert_eq!(agg.push("**"), None);
        assert_eq!(agg.push("**"), None);
        // The buffer reset anyway: the next cut carries only new content
        assert_eq!(agg.push("fine"), None);
        assert_eq!(agg.push("."), Some("fine.".to_string()));
    }

    #[test]
    fn flush_formats_residual() {
        let mut agg = aggregator(100);
        agg.push("unterminated reply");
        assert_eq!(agg.flush(), Some("unterminated reply".to_string()));
        assert_eq!(agg.flush(), None);
    }

    #[test]
    fn flush_on_empty_returns_none() {
        let mut agg = aggregator(100);
        assert_eq!(agg.flush(), None);
    }

    #[test]
    fn reset_discards_pending_content() {
        let mut agg = aggregator(100);
        agg.push("doomed fragment");
        agg.reset();
        assert!(agg.is_empty());
        assert_eq!(agg.flush(), None);
    }

    #[test]
    fn list_markers_do_not_end_chunks() {
        let mut agg = aggregator(100);

        // Ends in "1." (digit-dot), so the chunk keeps growing
        assert_eq!(agg.push("Two things: 1."), None);
        // Mid-line markers are not rewritten; only the emphasis is stripped
        assert_eq!(
            agg.push(" **Speed:** fast."),
            Some("Two things: 1. Speed: fast.".to_string())
        );
    }

    #[test]
    fn formatted_list_reply_is_spoken_form() {
        let mut agg = aggregator(100);
        let chunk = agg.push("1. **Time Dilation:** moving clocks run slow.");
        assert_eq!(
            chunk,
            Some("1. Time Dilation,  moving clocks run slow.".to_string())
        );
    }
}
