use crate::Result;
use crate::segments::Segment;

/// Streaming sink for transcription segments.
///
/// Encoders are fed segments in emission order and must be closed exactly once the input is
/// exhausted; `close` is idempotent.
pub trait SegmentEncoder {
    fn write_segment(&mut self, seg: &Segment) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}
