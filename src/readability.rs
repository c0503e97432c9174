//! # Readability Scoring
//!
//! A simplified Flesch-style reading-ease score shared by the content
//! transformation endpoints. It approximates the standard formula using only
//! word and sentence counts — syllable counting is intentionally omitted, so
//! the constant term dominates for short sentences.
//!
//! The score is a pure function of the input text: no configuration, no I/O,
//! no error conditions.

/// Compute a reading-ease score in `[0.0, 100.0]` for the given text.
///
/// Words are whitespace-delimited tokens. Sentences are counted as the number
/// of `.`, `!` and `?` characters anywhere in the text, floored at 1 so the
/// average sentence length is always defined. The raw Flesch-style value
/// `206.835 - 1.015 * avg_sentence_length` is then clamped into `[0, 100]`.
///
/// Empty text scores at the top of the range (0 words over 1 sentence): that
/// is defined behavior, not an error.
///
/// Rounding for presentation is left to the caller — see [`round2`].
pub fn score(text: &str) -> f64 {
    let words = text.split_whitespace().count();
    let sentence_marks = text
        .chars()
        .filter(|c| matches!(c, '.' | '!' | '?'))
        .count();
    let sentences = sentence_marks.max(1);

    let avg_sentence_length = words as f64 / sentences as f64;
    let raw = 206.835 - 1.015 * avg_sentence_length;

    raw.clamp(0.0, 100.0)
}

/// Round a score to two decimal places for JSON responses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
