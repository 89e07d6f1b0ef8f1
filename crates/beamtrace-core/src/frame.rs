use ndarray::Array2;

/// A single grayscale video frame.
///
/// Pixel values are raw intensity counts stored as f32 (not normalized):
/// the dark threshold and ramp step threshold are defined in count units.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Original bit depth of the source (8 or 16)
    pub original_bit_depth: u8,
}

impl Frame {
    pub fn new(data: Array2<f32>, bit_depth: u8) -> Self {
        Self {
            data,
            original_bit_depth: bit_depth,
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

/// A sub-pixel position in the coordinate space of a region of interest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoiPoint {
    pub x: f64,
    pub y: f64,
}

/// A sub-pixel position in full-frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FramePoint {
    pub x: f64,
    pub y: f64,
}

/// Rectangular region of interest in full-frame pixel coordinates.
///
/// Owns the only conversion between ROI-local and full-frame space so the
/// two coordinate systems cannot be mixed silently.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Roi {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Roi {
    /// ROI covering the whole frame.
    pub fn full_frame(width: usize, height: usize) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Reproject an ROI-local point into full-frame coordinates.
    pub fn to_frame(&self, p: RoiPoint) -> FramePoint {
        FramePoint {
            x: p.x + self.x as f64,
            y: p.y + self.y as f64,
        }
    }

    /// Extract the ROI pixels from a full frame. The ROI is clipped to the
    /// frame bounds first.
    pub fn extract(&self, frame: &Frame) -> Array2<f32> {
        let y1 = self.y.min(frame.height());
        let x1 = self.x.min(frame.width());
        let y2 = (self.y + self.height).min(frame.height());
        let x2 = (self.x + self.width).min(frame.width());
        frame.data.slice(ndarray::s![y1..y2, x1..x2]).to_owned()
    }
}

/// Result of locating the bright spot in a single region.
///
/// A frame where thresholding leaves no qualifying pixels yields the
/// geometric center of the region, explicitly marked so downstream
/// consumers must decide how to treat it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpotLocation {
    /// Intensity-weighted centroid of the thresholded bright region.
    Detected(RoiPoint),
    /// No pixel survived thresholding; geometric center of the region.
    FallbackCenter(RoiPoint),
}

impl SpotLocation {
    pub fn position(&self) -> RoiPoint {
        match *self {
            Self::Detected(p) | Self::FallbackCenter(p) => p,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::FallbackCenter(_))
    }
}
