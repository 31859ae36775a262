use std::borrow::Cow;
use std::io::Write;

use crate::Result;
use crate::segment_encoder::SegmentEncoder;
use crate::segments::Segment;
use crate::timestamp::format_timestamp;

/// The delimiter between a cue's start and end timestamps.
pub const CUE_ARROW: &str = " --> ";

/// What a literal [`CUE_ARROW`] inside cue text is rewritten to.
pub const ESCAPED_ARROW: &str = " \u{2192} ";

/// A `SegmentEncoder` that writes segments as SubRip (`.srt`) cues.
///
/// Each cue is:
///
/// ```text
/// 1
/// 00:00:01,000 --> 00:00:02,500
/// hello
/// ```
///
/// Cues are numbered from 1 in the order they are written and separated by exactly one blank
/// line. An encoder that never sees a segment writes nothing at all.
pub struct SrtEncoder<W: Write> {
    /// The underlying writer we stream cues into.
    w: W,

    /// Index of the next cue to write.
    next_index: usize,

    /// Whether the encoder has been closed.
    closed: bool,
}

impl<W: Write> SrtEncoder<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            next_index: 1,
            closed: false,
        }
    }

    /// Number of cues written so far.
    pub fn cues_written(&self) -> usize {
        self.next_index - 1
    }
}

impl<W: Write> SegmentEncoder for SrtEncoder<W> {
    fn write_segment(&mut self, seg: &Segment) -> Result<()> {
        if self.closed {
            return Err(
                std::io::Error::other("cannot write segment: encoder is already closed").into(),
            );
        }

        // The blank line goes *before* every cue but the first, so the document ends right
        // after the last cue's text line.
        if self.next_index > 1 {
            writeln!(&mut self.w)?;
        }

        let start = format_timestamp(seg.start_seconds);
        let end = format_timestamp(seg.end_seconds);

        writeln!(&mut self.w, "{}", self.next_index)?;
        writeln!(&mut self.w, "{start}{CUE_ARROW}{end}")?;
        writeln!(&mut self.w, "{}", cue_text(&seg.text))?;

        self.next_index += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.w.flush()?;
        self.closed = true;
        Ok(())
    }
}

/// Trim the segment text and neutralize any arrow that could be read as a timing line.
pub fn cue_text(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.trim();
    if trimmed.contains(CUE_ARROW) {
        Cow::Owned(trimmed.replace(CUE_ARROW, ESCAPED_ARROW))
    } else {
        Cow::Borrowed(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> Segment {
        Segment::new(start, end, text)
    }

    fn encode(segments: &[Segment]) -> anyhow::Result<String> {
        let mut out = Vec::new();
        let mut enc = SrtEncoder::new(&mut out);
        for s in segments {
            enc.write_segment(s)?;
        }
        enc.close()?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn srt_close_without_segments_emits_nothing() -> anyhow::Result<()> {
        assert_eq!(encode(&[])?, "");
        Ok(())
    }

    #[test]
    fn srt_single_segment_is_one_trimmed_block() -> anyhow::Result<()> {
        let s = encode(&[seg(1.0, 2.5, "  hello  ")])?;
        assert_eq!(s, "1\n00:00:01,000 --> 00:00:02,500\nhello\n");
        Ok(())
    }

    #[test]
    fn srt_blocks_are_numbered_and_separated_by_one_blank_line() -> anyhow::Result<()> {
        let s = encode(&[
            seg(0.0, 1.2345, "hello"),
            seg(61.2, 62.0, " world"),
            seg(3661.0, 3662.0, "again "),
        ])?;

        assert_eq!(
            s,
            "1\n00:00:00,000 --> 00:00:01,235\nhello\n\
             \n\
             2\n00:01:01,200 --> 00:01:02,000\nworld\n\
             \n\
             3\n01:01:01,000 --> 01:01:02,000\nagain\n"
        );
        assert!(!s.contains("\n\n\n"));
        Ok(())
    }

    #[test]
    fn srt_escapes_arrow_inside_text() -> anyhow::Result<()> {
        let s = encode(&[seg(0.0, 1.0, "left --> right")])?;
        let lines: Vec<&str> = s.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "left \u{2192} right");
        assert_eq!(s.matches(CUE_ARROW).count(), 1);
        Ok(())
    }

    #[test]
    fn cue_text_borrows_when_nothing_to_escape() {
        assert!(matches!(cue_text(" plain "), Cow::Borrowed("plain")));
        assert!(matches!(cue_text("a --> b"), Cow::Owned(_)));
    }

    #[test]
    fn srt_tracks_cue_count() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = SrtEncoder::new(&mut out);
        assert_eq!(enc.cues_written(), 0);
        enc.write_segment(&seg(0.0, 1.0, "a"))?;
        enc.write_segment(&seg(1.0, 2.0, "b"))?;
        assert_eq!(enc.cues_written(), 2);
        Ok(())
    }

    #[test]
    fn srt_write_after_close_errors() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = SrtEncoder::new(&mut out);
        enc.close()?;
        enc.close()?;
        let err = enc.write_segment(&seg(0.0, 1.0, "nope")).unwrap_err();
        assert!(err.to_string().contains("already closed"));
        Ok(())
    }
}
