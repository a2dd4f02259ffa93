#![crate_name = "skope"]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Geocoded raster grids with per-pixel time series extraction.
//!
//! A [`RasterGrid`] pairs a `(band, row, column)` pixel array with the affine transform
//! placing it on the globe, so pixels can be addressed either by index or by
//! longitude/latitude. Bands are typically time steps, which makes
//! [`series_at_point`](RasterGrid::series_at_point) the time series of a location.
//!
//! Storage goes through a [`Backend`](backend::Backend):
//!
//! * [`MemoryBackend`](backend::MemoryBackend) keeps datasets in process;
//! * [`GeoTiffBackend`](backend::GeoTiffBackend) reads and writes GeoTIFF files natively;
//! * `GdalBackend` (with the `gdal` feature) opens anything GDAL can.
//!
//! ## Use
//!
//! ```
//! # fn main() -> skope::errors::Result<()> {
//! use skope::backend::MemoryBackend;
//! use skope::{CreateOptions, GridShape, PixelType, RasterGrid};
//! use ndarray::Array2;
//!
//! let options = CreateOptions {
//!     format: "MEM".to_string(),
//!     pixel_type: PixelType::UInt16,
//!     shape: GridShape::new(5, 5, 5),
//!     origin: (-123.0, 45.0),
//!     pixel_size: (1.0, 1.0),
//!     ..Default::default()
//! };
//! let mut grid = RasterGrid::create(MemoryBackend::new(), "annual", &options)?;
//! for band in 0..grid.bands() {
//!     let data = Array2::from_elem((5, 5), 100.0 * (band + 1) as f64);
//!     grid.write_band(band, &data, 0.0)?;
//! }
//! grid.flush()?;
//!
//! let series = grid.series_at_point(-123.0, 45.0, None, None)?;
//! assert_eq!(series, vec![100.0, 200.0, 300.0, 400.0, 500.0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! * `gdal`: enables the GDAL backend; needs a system libgdal.
//! * `bundled`: like `gdal`, but builds GDAL from source.
//! * `service`: builds the `skope-service` HTTP binary.

pub mod backend;
pub mod config;
pub mod errors;
mod geo_transform;
pub mod raster;
pub mod spatial_ref;
pub mod timeseries;

#[cfg(test)]
mod test_utils;

pub use geo_transform::{Affine, GeoTransform, GeoTransformEx};
pub use raster::{CreateOptions, GridShape, PixelType, RasterGrid};
