use crate::errors::{Result, SkopeError};
use crate::geo_transform::{GeoTransform, GeoTransformEx};
use crate::raster::{GridShape, PixelType};

/// Parameters for [`RasterGrid::create`](crate::RasterGrid::create).
///
/// `pixel_size` is `(width, height)`. The height must be positive; it is stored
/// negated so the new grid is north-up. A negative width lays columns out east to west.
///
/// ```
/// use skope::{CreateOptions, GridShape, PixelType};
///
/// let options = CreateOptions {
///     format: "MEM".to_string(),
///     pixel_type: PixelType::UInt16,
///     shape: GridShape::new(4, 3, 2),
///     origin: (-123.0, 45.0),
///     pixel_size: (1.0, 2.0),
///     ..Default::default()
/// };
/// assert_eq!(options.geo_transform(), [-123.0, 1.0, 0.0, 45.0, 0.0, -2.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOptions {
    /// Short format name understood by the backend, e.g. `GTiff`.
    pub format: String,
    pub pixel_type: PixelType,
    pub shape: GridShape,
    /// `(longitude, latitude)` of the north-west corner.
    pub origin: (f64, f64),
    pub pixel_size: (f64, f64),
    /// Name of a well known geographic coordinate system.
    pub coordinate_system: String,
}

impl Default for CreateOptions {
    fn default() -> Self {
        CreateOptions {
            format: "GTiff".to_string(),
            pixel_type: PixelType::Float32,
            shape: GridShape::new(1, 1, 1),
            origin: (0.0, 0.0),
            pixel_size: (1.0, 1.0),
            coordinate_system: "WGS84".to_string(),
        }
    }
}

impl CreateOptions {
    pub fn geo_transform(&self) -> GeoTransform {
        let (lon, lat) = self.origin;
        let (width, height) = self.pixel_size;
        [lon, width, 0.0, lat, 0.0, -height]
    }

    /// Checks the options before anything is allocated.
    ///
    /// A non-positive pixel height would not be north-up; a degenerate transform
    /// cannot be inverted.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.shape.is_empty() {
            return Err(SkopeError::BadArgument(format!(
                "cannot create a grid of shape {:?}",
                self.shape
            )));
        }
        let geo_transform = self.geo_transform();
        if !geo_transform.is_north_up() {
            return Err(SkopeError::NotNorthUp { geo_transform });
        }
        geo_transform.invert()?;
        Ok(())
    }
}
