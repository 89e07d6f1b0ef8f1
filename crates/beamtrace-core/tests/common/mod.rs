#![allow(dead_code)]

use ndarray::Array2;

use beamtrace_core::error::Result;
use beamtrace_core::frame::Frame;
use beamtrace_core::io::ser::SER_HEADER_SIZE;
use beamtrace_core::io::FrameSource;

/// Build a mono 8-bit SER file header.
///
/// Returns a `Vec<u8>` containing just the 178-byte header. Append frame
/// pixel data after calling this function.
pub fn build_ser_header(width: u32, height: u32, num_frames: usize) -> Vec<u8> {
    build_ser_header_full(width, height, 8, num_frames, 0)
}

/// Build a SER file header with configurable bit depth and color id.
pub fn build_ser_header_full(
    width: u32,
    height: u32,
    bit_depth: u32,
    num_frames: usize,
    color_id: i32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    // Magic (14 bytes)
    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID (4 bytes)
    buf.extend_from_slice(&0i32.to_le_bytes());
    // ColorID (4 bytes)
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian = 0 (little-endian per Siril convention)
    buf.extend_from_slice(&0i32.to_le_bytes());
    // Width
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    // Height
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    // PixelDepth
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    // FrameCount
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Observer / Instrument / Telescope (40 bytes each)
    buf.extend_from_slice(&[0u8; 120]);
    // DateTime + DateTimeUTC (8 bytes each)
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Build a complete synthetic mono 8-bit SER file with the given frame data.
pub fn build_ser_with_frames(width: u32, height: u32, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = build_ser_header(width, height, frames.len());
    for frame in frames {
        buf.extend_from_slice(frame);
    }
    buf
}

/// Write a SER buffer to a temporary file and return the temp file handle.
///
/// The file stays alive as long as the returned `NamedTempFile` is not
/// dropped.
pub fn write_test_ser(data: &[u8]) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut f = tempfile::NamedTempFile::new().expect("create temp file");
    f.write_all(data).expect("write SER data");
    f.flush().expect("flush");
    f
}

/// In-memory frame source over pre-built frames, numbered from `first`.
pub struct VecSource {
    pub frames: Vec<Array2<f32>>,
    pub first: usize,
}

impl VecSource {
    pub fn new(frames: Vec<Array2<f32>>) -> Self {
        Self { frames, first: 0 }
    }
}

impl FrameSource for VecSource {
    fn get_frame(&self, frame_number: usize) -> Result<Frame> {
        let data = self.frames[frame_number - self.first].clone();
        Ok(Frame::new(data, 8))
    }

    fn frame_range(&self) -> (usize, usize) {
        (self.first, self.first + self.frames.len() - 1)
    }
}

/// A Gaussian intensity blob of the given amplitude on a black background.
pub fn gaussian_blob(
    height: usize,
    width: usize,
    cx: f64,
    cy: f64,
    sigma: f64,
    amplitude: f64,
) -> Array2<f32> {
    let mut data = Array2::<f32>::zeros((height, width));
    for row in 0..height {
        for col in 0..width {
            let dx = col as f64 - cx;
            let dy = row as f64 - cy;
            let v = amplitude * (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp();
            data[[row, col]] = v as f32;
        }
    }
    data
}
