//! Format backends: the storage side of a [`RasterGrid`](crate::RasterGrid).
//!
//! A [`Backend`] opens and allocates datasets; the [`BackendDataset`] it hands out is
//! the opaque handle a grid decodes pixels from and writes pixels through.
//!
//! Band indices are 0-based everywhere in this module.

use std::path::Path;

use bitflags::bitflags;
use ndarray::{Array2, Array3};

use crate::errors::Result;
use crate::geo_transform::GeoTransform;
use crate::raster::{GridShape, PixelType};

#[cfg(feature = "gdal")]
#[cfg_attr(docsrs, doc(cfg(feature = "gdal")))]
mod gdal_io;
mod geotiff;
mod memory;

#[cfg(feature = "gdal")]
#[cfg_attr(docsrs, doc(cfg(feature = "gdal")))]
pub use gdal_io::{GdalBackend, GdalDataset};
pub use geotiff::{GeoTiffBackend, GeoTiffDataset};
pub use memory::{MemoryBackend, MemoryDataset};

bitflags! {
    /// Access mode for [`Backend::open`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        const READ_ONLY = 0x00;
        /// Allow writes and commits through the returned handle.
        const UPDATE = 0x01;
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        OpenFlags::READ_ONLY
    }
}

/// Opens and allocates datasets of one or more raster formats.
pub trait Backend {
    type Dataset: BackendDataset;

    /// Short name used in log and error messages.
    fn name(&self) -> &'static str;

    /// Whether a dataset exists at `path`.
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Opens the dataset at `path`.
    ///
    /// Fails with [`NotFound`](crate::errors::SkopeError::NotFound) when nothing exists
    /// at `path` and with [`InvalidFormat`](crate::errors::SkopeError::InvalidFormat)
    /// when it cannot be decoded.
    fn open(&self, path: &Path, flags: OpenFlags) -> Result<Self::Dataset>;

    /// Allocates a new zero-filled dataset, opened for update.
    fn allocate(
        &self,
        path: &Path,
        format: &str,
        pixel_type: PixelType,
        shape: GridShape,
    ) -> Result<Self::Dataset>;
}

/// An open dataset handle.
pub trait BackendDataset {
    /// Short name of the format, e.g. `GTiff`.
    fn format(&self) -> &str;

    fn shape(&self) -> GridShape;

    fn pixel_type(&self) -> PixelType;

    fn geo_transform(&self) -> Result<GeoTransform>;

    fn set_geo_transform(&mut self, geo_transform: &GeoTransform) -> Result<()>;

    /// WKT of the dataset's coordinate system, if one was assigned.
    fn coordinate_system(&self) -> Result<Option<String>>;

    /// Assigns a well known geographic coordinate system by name, e.g. `WGS84`.
    fn set_coordinate_system(&mut self, name: &str) -> Result<()>;

    /// Decodes every band into a `(bands, rows, cols)` array.
    fn read_all_bands(&self) -> Result<Array3<f64>>;

    /// Decodes one band into a `(rows, cols)` array.
    fn read_band(&self, band: usize) -> Result<Array2<f64>>;

    /// Replaces the pixels of one band; `data` must be `(rows, cols)`.
    fn write_band(&mut self, band: usize, data: &Array2<f64>) -> Result<()>;

    fn no_data(&self, band: usize) -> Result<Option<f64>>;

    fn set_no_data(&mut self, band: usize, value: f64) -> Result<()>;

    /// Persists buffered changes to durable storage.
    fn commit(&mut self) -> Result<()>;
}

pub(crate) fn check_band(band: usize, shape: GridShape) -> Result<()> {
    if band >= shape.bands {
        return Err(crate::errors::SkopeError::BandOutOfRange {
            band,
            bands: shape.bands,
        });
    }
    Ok(())
}

pub(crate) fn check_band_dim(data: &Array2<f64>, shape: GridShape) -> Result<()> {
    if data.dim() != shape.band_dim() {
        return Err(crate::errors::SkopeError::BadArgument(format!(
            "band array has shape {:?}, expected {:?}",
            data.dim(),
            shape.band_dim()
        )));
    }
    Ok(())
}
