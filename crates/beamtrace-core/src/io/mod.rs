pub mod ser;

use crate::error::Result;
use crate::frame::Frame;

/// Random-access provider of single-channel intensity frames.
///
/// Frame numbers live in the source's own index space; `frame_range` returns
/// inclusive bounds. Access may be non-monotonic, and implementations must be
/// `Sync` so per-frame work can fan out across Rayon workers.
pub trait FrameSource: Sync {
    fn get_frame(&self, frame_number: usize) -> Result<Frame>;

    /// Inclusive (first, last) frame numbers of the recording.
    fn frame_range(&self) -> (usize, usize);

    fn frame_count(&self) -> usize {
        let (first, last) = self.frame_range();
        last - first + 1
    }
}
