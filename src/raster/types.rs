use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::errors::SkopeError;

/// Sample type of the pixels stored by a backend.
///
/// Names follow GDAL's data type names, so `"Float32"` parses to [`PixelType::Float32`].
/// Grids always expose samples as `f64`; the pixel type only governs how a backend
/// stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    Byte,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl PixelType {
    /// Subset of the GDAL data types supported by skope.
    pub fn available_types() -> &'static [PixelType] {
        use PixelType::*;
        &[Byte, UInt16, Int16, UInt32, Int32, Float32, Float64]
    }

    pub fn name(&self) -> &'static str {
        match self {
            PixelType::Byte => "Byte",
            PixelType::UInt16 => "UInt16",
            PixelType::Int16 => "Int16",
            PixelType::UInt32 => "UInt32",
            PixelType::Int32 => "Int32",
            PixelType::Float32 => "Float32",
            PixelType::Float64 => "Float64",
        }
    }

    /// The value `value` takes once stored with this pixel type.
    ///
    /// Integer types round to the nearest integer and saturate at their range, NaN
    /// becomes zero. `Float32` loses precision the way an `f32` cast does.
    pub fn quantize(&self, value: f64) -> f64 {
        match self {
            PixelType::Byte => value.round() as u8 as f64,
            PixelType::UInt16 => value.round() as u16 as f64,
            PixelType::Int16 => value.round() as i16 as f64,
            PixelType::UInt32 => value.round() as u32 as f64,
            PixelType::Int32 => value.round() as i32 as f64,
            PixelType::Float32 => value as f32 as f64,
            PixelType::Float64 => value,
        }
    }
}

impl Display for PixelType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelType {
    type Err = SkopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PixelType::available_types()
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| SkopeError::BadArgument(format!("unknown pixel type '{s}'")))
    }
}

/// Dimensions of a 3-D pixel array, in `(bands, rows, cols)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridShape {
    pub bands: usize,
    pub rows: usize,
    pub cols: usize,
}

impl GridShape {
    pub fn new(bands: usize, rows: usize, cols: usize) -> Self {
        GridShape { bands, rows, cols }
    }

    pub fn is_empty(&self) -> bool {
        self.bands == 0 || self.rows == 0 || self.cols == 0
    }

    /// `(rows, cols)` shape of a single band.
    pub fn band_dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

impl From<(usize, usize, usize)> for GridShape {
    fn from((bands, rows, cols): (usize, usize, usize)) -> Self {
        GridShape::new(bands, rows, cols)
    }
}

impl From<GridShape> for (usize, usize, usize) {
    fn from(shape: GridShape) -> Self {
        (shape.bands, shape.rows, shape.cols)
    }
}
