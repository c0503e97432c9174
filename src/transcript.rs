//! # Transcript Segment Parsing
//!
//! Turns the semi-structured text returned by the transcription backend into
//! discrete, queryable segments. The expected shape is one `[MM:SS] text`
//! line per utterance, with bare lines continuing the previous utterance —
//! but the parser is total: any string input produces a well-formed (possibly
//! empty) segment list, and it never raises.
//!
//! The timestamp token is opaque text. Whatever sits between the brackets is
//! carried verbatim; no time format is assumed or validated.

use serde::Serialize;

/// One timestamp/text pair extracted from a raw transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptSegment {
    /// Verbatim token from between `[` and `]`, e.g. `"00:30"`.
    pub timestamp: String,
    /// Utterance text, trimmed; never empty.
    pub text: String,
}

/// Parse a raw timestamped transcript into ordered segments.
///
/// Rules, applied line by line in input order:
/// - A line whose trimmed form starts with `[` and contains a closing `]`
///   starts a new segment: timestamp is the text between the brackets, text
///   is the trimmed remainder of the line.
/// - A bracketed line whose remainder is empty is skipped entirely — the
///   output never contains an empty-text segment.
/// - Any other non-empty line is a continuation: it is appended to the
///   previous segment's text with a single space. Continuations that arrive
///   before the first segment are dropped.
/// - Blank lines are ignored.
///
/// Segments come out in line order; nothing is reordered or deduplicated.
pub fn parse(raw: &str) -> Vec<TranscriptSegment> {
    let mut segments: Vec<TranscriptSegment> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let bracketed = line
            .strip_prefix('[')
            .and_then(|rest| rest.split_once(']'));

        match bracketed {
            Some((timestamp, remainder)) => {
                let text = remainder.trim();
                if text.is_empty() {
                    // A marker with no words on its line carries no content.
                    continue;
                }
                segments.push(TranscriptSegment {
                    timestamp: timestamp.to_string(),
                    text: text.to_string(),
                });
            }
            None => {
                // Continuation line (including a stray '[' with no closing
                // bracket): merge into the previous segment if one exists.
                if let Some(last) = segments.last_mut() {
                    last.text.push(' ');
                    last.text.push_str(line);
                }
            }
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(timestamp: &str, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            timestamp: timestamp.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_two_segments_with_continuation() {
        let raw = "[00:00] Hello world\n[00:30] more text\nand continuing";
        assert_eq!(
            parse(raw),
            vec![
                seg("00:00", "Hello world"),
                seg("00:30", "more text and continuing"),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_orphan_continuation_is_dropped() {
        let raw = "no marker yet\n[01:00] first real line";
        assert_eq!(parse(raw), vec![seg("01:00", "first real line")]);
    }

    #[test]
    fn test_timestamp_is_opaque() {
        // Not a time at all — still carried verbatim.
        let raw = "[chapter one] Intro text";
        assert_eq!(parse(raw), vec![seg("chapter one", "Intro text")]);
    }

    #[test]
    fn test_empty_text_segment_is_skipped() {
        let raw = "[00:00]\n[00:10] spoken words";
        assert_eq!(parse(raw), vec![seg("00:10", "spoken words")]);
    }

    #[test]
    fn test_no_segment_has_empty_text() {
        let raw = "[00:00]   \n[00:05] a\n\n[00:10]\ntrailing continuation";
        let segments = parse(raw);
        assert!(segments.iter().all(|s| !s.text.is_empty()));
        // The continuation after the skipped marker lands on the last stored
        // segment, not on the skipped one.
        assert_eq!(segments, vec![seg("00:05", "a trailing continuation")]);
    }

    #[test]
    fn test_line_order_preserved() {
        let raw = "[02:00] b\n[01:00] a\n[02:00] b again";
        let segments = parse(raw);
        let stamps: Vec<&str> = segments.iter().map(|s| s.timestamp.as_str()).collect();
        // Insertion order, even when timestamps repeat or go backwards.
        assert_eq!(stamps, vec!["02:00", "01:00", "02:00"]);
    }

    #[test]
    fn test_unclosed_bracket_is_a_continuation() {
        let raw = "[00:00] start\n[broken line without close";
        assert_eq!(
            parse(raw),
            vec![seg("00:00", "start [broken line without close")]
        );
    }

    #[test]
    fn test_blank_lines_ignored() {
        let raw = "\n\n[00:00] text\n\n\nmore\n";
        assert_eq!(parse(raw), vec![seg("00:00", "text more")]);
    }
}
