use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use ndarray::Array2;

use crate::error::{BeamtraceError, Result};
use crate::frame::Frame;
use crate::io::FrameSource;

pub const SER_HEADER_SIZE: usize = 178;
const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

/// SER file header (178 bytes). Only mono recordings are supported; the
/// analysis pipeline is single-channel by construction.
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
    pub observer: String,
    pub instrument: String,
    pub telescope: String,
}

impl SerHeader {
    /// Bytes per pixel (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_pixel(&self) -> usize {
        if self.pixel_depth <= 8 {
            1
        } else {
            2
        }
    }

    /// Total bytes per frame.
    pub fn frame_byte_size(&self) -> usize {
        self.width as usize * self.height as usize * self.bytes_per_pixel()
    }
}

/// Memory-mapped mono SER recording exposing the [`FrameSource`] contract.
///
/// `first_frame_number` shifts the source's external frame-number space,
/// mirroring cameras whose recorded range does not start at zero.
pub struct SerSource {
    mmap: Mmap,
    pub header: SerHeader,
    first_frame_number: usize,
}

impl SerSource {
    /// Open a SER file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_offset(path, 0)
    }

    /// Open a SER file whose first frame carries the given frame number.
    pub fn open_with_offset(path: &Path, first_frame_number: usize) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(BeamtraceError::InvalidSer(
                "File too small for SER header".into(),
            ));
        }

        if &mmap[0..14] != SER_MAGIC {
            return Err(BeamtraceError::InvalidSer(
                "Missing LUCAM-RECORDER magic".into(),
            ));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;

        if header.color_id != 0 {
            return Err(BeamtraceError::InvalidSer(format!(
                "Unsupported color id {} (mono recordings only)",
                header.color_id
            )));
        }
        if header.frame_count == 0 {
            return Err(BeamtraceError::InvalidSer("Zero frame count".into()));
        }

        let expected_data_size =
            SER_HEADER_SIZE + header.frame_byte_size() * header.frame_count as usize;
        if mmap.len() < expected_data_size {
            return Err(BeamtraceError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected_data_size,
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            header,
            first_frame_number,
        })
    }

    /// Raw bytes of a single frame (zero-copy from the mmap), by internal
    /// zero-based index.
    fn frame_raw(&self, index: usize) -> &[u8] {
        let offset = SER_HEADER_SIZE + index * self.header.frame_byte_size();
        &self.mmap[offset..offset + self.header.frame_byte_size()]
    }
}

impl FrameSource for SerSource {
    /// Read a single frame, decoded to raw intensity counts as f32.
    fn get_frame(&self, frame_number: usize) -> Result<Frame> {
        let (first, last) = self.frame_range();
        if frame_number < first || frame_number > last {
            return Err(BeamtraceError::FrameOutOfRange {
                number: frame_number,
                first,
                last,
            });
        }

        let raw = self.frame_raw(frame_number - first);
        let h = self.header.height as usize;
        let w = self.header.width as usize;
        let data = decode_mono(raw, h, w, self.header.bytes_per_pixel(), self.header.little_endian);

        Ok(Frame::new(data, self.header.bytes_per_pixel() as u8 * 8))
    }

    fn frame_range(&self) -> (usize, usize) {
        (
            self.first_frame_number,
            self.first_frame_number + self.header.frame_count as usize - 1,
        )
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()? as u32;
    let height = cursor.read_i32::<LittleEndian>()? as u32;
    let pixel_depth = cursor.read_i32::<LittleEndian>()? as u32;
    let frame_count = cursor.read_i32::<LittleEndian>()? as u32;

    let observer = read_fixed_string(&buf[42..82]);
    let instrument = read_fixed_string(&buf[82..122]);
    let telescope = read_fixed_string(&buf[122..162]);

    if width == 0 || height == 0 {
        return Err(BeamtraceError::InvalidSer(format!(
            "Invalid dimensions {width}x{height}"
        )));
    }

    // SER spec says LittleEndian = 0 means big-endian pixel data, but most
    // writers use 0 for little-endian. Follow Siril's convention.
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width,
        height,
        pixel_depth,
        frame_count,
        observer,
        instrument,
        telescope,
    })
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

fn decode_mono(
    raw: &[u8],
    height: usize,
    width: usize,
    bytes_per_pixel: usize,
    little_endian: bool,
) -> Array2<f32> {
    let mut data = Array2::<f32>::zeros((height, width));

    for row in 0..height {
        for col in 0..width {
            let idx = (row * width + col) * bytes_per_pixel;
            let val = if bytes_per_pixel == 1 {
                raw[idx] as f32
            } else {
                let pair = [raw[idx], raw[idx + 1]];
                let v = if little_endian {
                    u16::from_le_bytes(pair)
                } else {
                    u16::from_be_bytes(pair)
                };
                v as f32
            };
            data[[row, col]] = val;
        }
    }

    data
}
