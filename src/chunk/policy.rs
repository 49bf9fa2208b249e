//! Chunk boundary and formatting policy for synthesis-ready text.

use crate::defaults;

/// Strategy deciding when accumulated text becomes a chunk and how it is
/// formatted before synthesis.
///
/// Implementations must be pure: no I/O, no shared state. This keeps the
/// policy swappable for other locales or markup conventions.
pub trait ChunkPolicy: Send {
    /// Returns true if the buffer ends at a speakable sentence boundary.
    fn is_boundary(&self, buffer: &str) -> bool;

    /// Returns true once the fragment count since the last boundary reaches
    /// the configured limit.
    fn is_over_length(&self, fragments: usize) -> bool;

    /// Normalizes a chunk for synthesis. An empty return value means the
    /// chunk carries nothing speakable and must not be enqueued.
    fn format(&self, text: &str) -> String;
}

/// Default policy: punctuation boundaries with a digit-list carve-out,
/// a fragment-count fallback, and markdown list/emphasis normalization.
#[derive(Debug, Clone)]
pub struct SpokenTextPolicy {
    punctuation: Vec<char>,
    max_fragments: usize,
}

impl SpokenTextPolicy {
    /// Creates a policy with an explicit punctuation set and fragment limit.
    pub fn new(punctuation: Vec<char>, max_fragments: usize) -> Self {
        Self {
            punctuation,
            max_fragments,
        }
    }
}

impl Default for SpokenTextPolicy {
    fn default() -> Self {
        Self::new(defaults::PUNCTUATION.to_vec(), defaults::MAX_CHUNK_TOKENS)
    }
}

impl ChunkPolicy for SpokenTextPolicy {
    fn is_boundary(&self, buffer: &str) -> bool {
        if buffer.trim().is_empty() {
            return false;
        }

        // The raw final character decides: a fragment that ends in trailing
        // whitespace defers the boundary to a later fragment, which keeps
        // mid-sentence fragments like "A. " from splitting prematurely.
        let mut chars = buffer.chars().rev();
        let Some(last) = chars.next() else {
            return false;
        };
        if !self.punctuation.contains(&last) {
            return false;
        }

        // "12." is a list marker, not a sentence end. Only `.` gets the
        // carve-out; "!?:" never follow bare item numbers.
        if last == '.' && chars.next().is_some_and(|prev| prev.is_ascii_digit()) {
            return false;
        }

        true
    }

    fn is_over_length(&self, fragments: usize) -> bool {
        fragments >= self.max_fragments
    }

    fn format(&self, text: &str) -> String {
        let mut rewritten = String::with_capacity(text.len());
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                rewritten.push('\n');
            }
            match rewrite_list_marker(line) {
                Some(spoken) => rewritten.push_str(&spoken),
                None => rewritten.push_str(line),
            }
        }

        rewritten.replace("**", "").trim().to_string()
    }
}

/// Rewrites a numbered emphasis marker at the start of a line into its
/// spoken form: `1. **Time Dilation:**` becomes `1. Time Dilation, `.
///
/// The comma after the title and the period after the number read as short
/// pauses in synthesis. The colon may sit inside or after the bold span;
/// either way it is dropped from the spoken title. Lines without a marker
/// are returned unchanged via `None`.
fn rewrite_list_marker(line: &str) -> Option<String> {
    let rest = line.trim_start();

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let number = &rest[..digits_end];

    let rest = rest[digits_end..].strip_prefix('.')?;
    let rest = rest.trim_start().strip_prefix("**")?;
    let close = rest.find("**")?;
    let inner = &rest[..close];
    let mut remainder = &rest[close + 2..];

    let colon_inside = inner.trim_end().ends_with(':');
    let colon_after = remainder.strip_prefix(':');
    if let Some(stripped) = colon_after {
        remainder = stripped;
    }
    if !colon_inside && colon_after.is_none() {
        // Plain bold text, not a titled list item
        return None;
    }

    let title = inner.trim().trim_end_matches(':').trim_end();
    Some(format!("{number}. {title}, {remainder}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SpokenTextPolicy {
        SpokenTextPolicy::default()
    }

    // ── Boundary detection ───────────────────────────────────────────────

    #[test]
    fn boundary_never_fires_on_empty_buffer() {
        assert!(!policy().is_boundary(""));
        assert!(!policy().is_boundary("   "));
        assert!(!policy().is_boundary("\n\t"));
    }

    #[test]
    fn boundary_fires_on_sentence_end() {
        assert!(policy().is_boundary("Hello."));
        assert!(policy().is_boundary("Really?"));
        assert!(policy().is_boundary("Stop!"));
        assert!(policy().is_boundary("Here is the list:"));
    }

    #[test]
    fn boundary_skips_digit_before_dot() {
        assert!(!policy().is_boundary("12."));
        assert!(!policy().is_boundary("The options are 1."));
        // The carve-out is for `.` only
        assert!(policy().is_boundary("It costs 12!"));
        assert!(policy().is_boundary("Chapter 3:"));
    }

    #[test]
    fn boundary_requires_terminal_punctuation() {
        assert!(!policy().is_boundary("Hello"));
        assert!(!policy().is_boundary("Hello, world"));
        // Trailing whitespace defers the boundary to a later fragment
        assert!(!policy().is_boundary("A. "));
        assert!(!policy().is_boundary("Done.\n"));
    }

    #[test]
    fn boundary_on_lone_punctuation() {
        assert!(policy().is_boundary("."));
        assert!(policy().is_boundary("!"));
    }

    #[test]
    fn boundary_respects_custom_punctuation() {
        let policy = SpokenTextPolicy::new(vec!['。'], 45);
        assert!(policy.is_boundary("こんにちは。"));
        assert!(!policy.is_boundary("Hello."));
    }

    // ── Over-length fallback ─────────────────────────────────────────────

    #[test]
    fn over_length_fires_at_threshold() {
        let policy = policy();
        assert!(!policy.is_over_length(0));
        assert!(!policy.is_over_length(44));
        assert!(policy.is_over_length(45));
        assert!(policy.is_over_length(46));
    }

    // ── Formatting ───────────────────────────────────────────────────────

    #[test]
    fn format_rewrites_titled_list_item() {
        let formatted = policy().format("1. **Time Dilation:** text");
        assert_eq!(formatted, "1. Time Dilation,  text");
        assert!(!formatted.contains("**"));
    }

    #[test]
    fn format_rewrites_colon_after_bold_span() {
        let formatted = policy().format("2. **Length Contraction**: more text");
        assert_eq!(formatted, "2. Length Contraction,  more text");
    }

    #[test]
    fn format_rewrites_markers_on_any_line() {
        let input = "Two effects matter.\n1. **Time Dilation:** clocks slow.\n2. **Length Contraction:** rulers shrink.";
        let formatted = policy().format(input);
        assert_eq!(
            formatted,
            "Two effects matter.\n1. Time Dilation,  clocks slow.\n2. Length Contraction,  rulers shrink."
        );
    }

    #[test]
    fn format_strips_remaining_emphasis() {
        assert_eq!(policy().format("this is **important** stuff"), "this is important stuff");
    }

    #[test]
    fn format_is_identity_modulo_trim_without_markup() {
        for input in ["Hello world.", "  padded  ", "no punctuation at all", "1. plain item"] {
            assert_eq!(policy().format(input), input.trim());
        }
    }

    #[test]
    fn format_returns_empty_for_whitespace_only() {
        assert_eq!(policy().format("   "), "");
        assert_eq!(policy().format("\n\t"), "");
        assert_eq!(policy().format("****"), "");
    }

    #[test]
    fn format_leaves_untitled_bold_list_item_markers_alone() {
        // Bold without a colon is emphasis, not a section title
        assert_eq!(policy().format("1. **just bold** text"), "1. just bold text");
    }

    #[test]
    fn format_drops_leading_indent_of_marker_lines() {
        assert_eq!(
            policy().format("   3. **Recap:** done"),
            "3. Recap,  done"
        );
    }

    // ── Marker scanner details ───────────────────────────────────────────

    #[test]
    fn rewrite_requires_number_and_dot() {
        assert!(rewrite_list_marker("**Bold:** text").is_none());
        assert!(rewrite_list_marker("a. **Bold:** text").is_none());
        assert!(rewrite_list_marker("1 **Bold:** text").is_none());
    }

    #[test]
    fn rewrite_requires_closed_bold_span() {
        assert!(rewrite_list_marker("1. **unterminated").is_none());
    }

    #[test]
    fn rewrite_keeps_remainder_verbatim() {
        let spoken = rewrite_list_marker("10. **Wrap Up:**  and then some").unwrap();
        assert_eq!(spoken, "10. Wrap Up,   and then some");
    }
}
