//! Sentence-cap post-processing for generated answers.

use std::sync::LazyLock;

use regex::Regex;

/// A sentence ends at `.`, `!`, or `?` followed by whitespace or the end of the text.
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?](?:\s|$)").expect("sentence regex is valid"));

/// Count sentence boundaries in `text`.
pub fn count_sentences(text: &str) -> usize {
    SENTENCE_END.find_iter(text.trim()).count()
}

/// Keep at most `max_sentences` sentences of `text`.
///
/// Returns the trimmed text cut right after the `max_sentences`-th sentence
/// terminator, and whether anything was cut. Text past the last terminator
/// (an unterminated trailing fragment) counts toward nothing and is kept
/// only when the cap is not reached.
pub fn truncate_sentences(text: &str, max_sentences: usize) -> (String, bool) {
    let text = text.trim();
    if max_sentences == 0 {
        return (String::new(), !text.is_empty());
    }

    match SENTENCE_END.find_iter(text).nth(max_sentences - 1) {
        Some(boundary) => {
            // The terminator is a single ASCII byte at the start of the match.
            let cut = boundary.start() + 1;
            let kept = &text[..cut];
            (kept.to_string(), cut < text.len())
        }
        None => (text.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_sentences() {
        let (text, truncated) = truncate_sentences("One. Two! Three? Four.", 2);
        assert_eq!(text, "One. Two!");
        assert!(truncated);
    }

    #[test]
    fn short_answers_pass_through() {
        let (text, truncated) = truncate_sentences("  Only one sentence.  ", 3);
        assert_eq!(text, "Only one sentence.");
        assert!(!truncated);
    }

    #[test]
    fn exactly_at_cap_is_not_truncated() {
        let (text, truncated) = truncate_sentences("A. B. C.", 3);
        assert_eq!(text, "A. B. C.");
        assert!(!truncated);
    }

    #[test]
    fn decimals_are_not_boundaries() {
        let (text, _) = truncate_sentences("Costs 3.50 dollars. Next.", 1);
        assert_eq!(text, "Costs 3.50 dollars.");
    }

    #[test]
    fn ellipsis_ends_on_last_dot() {
        let (text, _) = truncate_sentences("Wait... then go. Next.", 1);
        assert_eq!(text, "Wait...");
    }

    #[test]
    fn newline_counts_as_whitespace() {
        let (text, truncated) = truncate_sentences("First.\nSecond.", 1);
        assert_eq!(text, "First.");
        assert!(truncated);
    }

    #[test]
    fn counts_sentences() {
        assert_eq!(count_sentences("A. B? C"), 2);
        assert_eq!(count_sentences(""), 0);
    }
}
