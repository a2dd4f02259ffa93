use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use geo_types::{coord, Coord};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use tracing::{debug, trace};

use crate::backend::{check_band, Backend, BackendDataset, OpenFlags};
use crate::errors::{Result, SkopeError};
use crate::geo_transform::{Affine, GeoTransform, GeoTransformEx};
use crate::raster::{CreateOptions, GridShape};

/// A geocoded `(band, row, column)` pixel array.
///
/// The grid keeps a decoded copy of every band in memory. Queries are answered from
/// that copy; writes go straight to the backend and only become visible to queries
/// after [`flush`](Self::flush).
///
/// Only north-up grids are supported: construction fails with
/// [`SkopeError::NotNorthUp`] when the pixel height is not negative.
///
/// ```
/// # fn main() -> skope::errors::Result<()> {
/// use skope::backend::MemoryBackend;
/// use skope::{CreateOptions, GridShape, PixelType, RasterGrid};
///
/// let options = CreateOptions {
///     format: "MEM".to_string(),
///     pixel_type: PixelType::Int32,
///     shape: GridShape::new(4, 3, 2),
///     origin: (-123.0, 45.0),
///     pixel_size: (1.0, 2.0),
///     ..Default::default()
/// };
/// let grid = RasterGrid::create(MemoryBackend::new(), "grid", &options)?;
/// assert_eq!(grid.pixel_at(-122.5, 44.0), Some((0, 0)));
/// assert_eq!(grid.series_at_point(-122.5, 44.0, None, None)?, vec![0.0; 4]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RasterGrid<B: Backend> {
    backend: B,
    dataset: B::Dataset,
    path: Option<PathBuf>,
    geo_transform: GeoTransform,
    affine: Affine,
    inverse_affine: Affine,
    pixels: Array3<f64>,
}

impl<B: Backend> RasterGrid<B> {
    /// Opens the dataset at `path` for update and decodes it.
    pub fn open_path(backend: B, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !backend.exists(path) {
            return Err(SkopeError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let dataset = backend.open(path, OpenFlags::UPDATE)?;
        debug!(path = %path.display(), backend = backend.name(), "opened raster grid");
        Self::from_parts(backend, dataset, Some(path.to_path_buf()))
    }

    /// Builds a grid over an already open dataset handle.
    pub fn open_handle(backend: B, dataset: B::Dataset) -> Result<Self> {
        Self::from_parts(backend, dataset, None)
    }

    /// Allocates a new zero-filled dataset at `path` and opens it.
    pub fn create(backend: B, path: impl AsRef<Path>, options: &CreateOptions) -> Result<Self> {
        let path = path.as_ref();
        options.validate()?;
        let mut dataset =
            backend.allocate(path, &options.format, options.pixel_type, options.shape)?;
        dataset.set_geo_transform(&options.geo_transform())?;
        dataset.set_coordinate_system(&options.coordinate_system)?;
        dataset.commit()?;
        drop(dataset);
        debug!(
            path = %path.display(),
            format = %options.format,
            pixel_type = %options.pixel_type,
            shape = ?options.shape,
            "created raster grid"
        );
        Self::open_path(backend, path)
    }

    fn from_parts(backend: B, dataset: B::Dataset, path: Option<PathBuf>) -> Result<Self> {
        let geo_transform = dataset.geo_transform()?;
        if !geo_transform.is_north_up() {
            return Err(SkopeError::NotNorthUp { geo_transform });
        }
        let affine = Affine::from_gdal(&geo_transform);
        let inverse_affine = affine.inverse()?;
        let pixels = dataset.read_all_bands()?;
        Ok(RasterGrid {
            backend,
            dataset,
            path,
            geo_transform,
            affine,
            inverse_affine,
            pixels,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn dataset(&self) -> &B::Dataset {
        &self.dataset
    }

    /// Direct access to the backend handle. Changes made through it are not
    /// reflected in [`pixels`](Self::pixels) until [`flush`](Self::flush).
    pub fn dataset_mut(&mut self) -> &mut B::Dataset {
        &mut self.dataset
    }

    /// Path the grid was opened from, `None` for grids built over a handle.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn geo_transform(&self) -> &GeoTransform {
        &self.geo_transform
    }

    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    pub fn inverse_affine(&self) -> &Affine {
        &self.inverse_affine
    }

    /// The in-memory snapshot as of the last open or flush.
    pub fn pixels(&self) -> &Array3<f64> {
        &self.pixels
    }

    pub fn shape(&self) -> GridShape {
        self.pixels.dim().into()
    }

    pub fn bands(&self) -> usize {
        self.pixels.len_of(Axis(0))
    }

    pub fn rows(&self) -> usize {
        self.pixels.len_of(Axis(1))
    }

    pub fn cols(&self) -> usize {
        self.pixels.len_of(Axis(2))
    }

    pub fn pixel_size_x(&self) -> f64 {
        self.geo_transform[1]
    }

    pub fn pixel_size_y(&self) -> f64 {
        -self.geo_transform[5]
    }

    pub fn pixel_size(&self) -> (f64, f64) {
        (self.pixel_size_x(), self.pixel_size_y())
    }

    pub fn origin_long(&self) -> f64 {
        self.geo_transform[0]
    }

    pub fn origin_lat(&self) -> f64 {
        self.geo_transform[3]
    }

    pub fn origin(&self) -> Coord<f64> {
        coord! { x: self.origin_long(), y: self.origin_lat() }
    }

    fn corner(&self, column: f64, row: f64) -> Coord<f64> {
        self.affine.apply_coord(coord! { x: column, y: row })
    }

    pub fn northwest_corner(&self) -> Coord<f64> {
        self.corner(0.0, 0.0)
    }

    pub fn northeast_corner(&self) -> Coord<f64> {
        self.corner(self.cols() as f64, 0.0)
    }

    pub fn southeast_corner(&self) -> Coord<f64> {
        self.corner(self.cols() as f64, self.rows() as f64)
    }

    pub fn southwest_corner(&self) -> Coord<f64> {
        self.corner(0.0, self.rows() as f64)
    }

    pub fn center(&self) -> Coord<f64> {
        self.corner(self.cols() as f64 / 2.0, self.rows() as f64 / 2.0)
    }

    /// Whether the fractional pixel position lies inside the grid.
    pub fn pixel_in_bounds(&self, row: f64, column: f64) -> bool {
        (0.0..self.cols() as f64).contains(&column) && (0.0..self.rows() as f64).contains(&row)
    }

    /// `(row, column)` of the pixel covering the point, or `None` outside the grid.
    ///
    /// Fractional pixel positions are truncated, so a point anywhere inside a pixel
    /// maps to that pixel.
    pub fn pixel_at(&self, longitude: f64, latitude: f64) -> Option<(usize, usize)> {
        let (column, row) = self.inverse_affine.apply(longitude, latitude);
        if !self.pixel_in_bounds(row, column) {
            return None;
        }
        Some((row as usize, column as usize))
    }

    pub fn value_at_pixel(&self, band: usize, row: usize, column: usize) -> Result<f64> {
        self.pixels
            .get((band, row, column))
            .copied()
            .ok_or_else(|| SkopeError::IndexOutOfBounds {
                band,
                row,
                column,
                shape: self.pixels.dim(),
            })
    }

    pub fn value_at_point(&self, longitude: f64, latitude: f64, band: usize) -> Result<f64> {
        let (row, column) = self.locate(longitude, latitude)?;
        self.value_at_pixel(band, row, column)
    }

    /// Values of one pixel across the bands `begin..end`.
    ///
    /// `begin` defaults to the first band and `end` to the band count. An empty range
    /// yields an empty series.
    pub fn series_at_pixel(
        &self,
        row: usize,
        column: usize,
        begin: Option<usize>,
        end: Option<usize>,
    ) -> Result<Vec<f64>> {
        let begin = begin.unwrap_or(0);
        let end = end.unwrap_or_else(|| self.bands());
        (begin..end)
            .map(|band| self.value_at_pixel(band, row, column))
            .collect()
    }

    pub fn series_at_point(
        &self,
        longitude: f64,
        latitude: f64,
        begin: Option<usize>,
        end: Option<usize>,
    ) -> Result<Vec<f64>> {
        let (row, column) = self.locate(longitude, latitude)?;
        self.series_at_pixel(row, column, begin, end)
    }

    fn locate(&self, longitude: f64, latitude: f64) -> Result<(usize, usize)> {
        self.pixel_at(longitude, latitude)
            .ok_or(SkopeError::PointOutOfBounds {
                longitude,
                latitude,
            })
    }

    /// One band of the in-memory snapshot.
    pub fn read_band(&self, band: usize) -> Result<ArrayView2<'_, f64>> {
        check_band(band, self.shape())?;
        Ok(self.pixels.index_axis(Axis(0), band))
    }

    /// Replaces a band in the backend and records its no-data value.
    ///
    /// The write is committed immediately but [`pixels`](Self::pixels) keeps the old
    /// values until [`flush`](Self::flush).
    pub fn write_band(&mut self, band: usize, data: &Array2<f64>, no_data: f64) -> Result<()> {
        trace!(band, no_data, "writing band");
        self.dataset.write_band(band, data)?;
        self.dataset.set_no_data(band, no_data)?;
        self.dataset.commit()
    }

    /// Sets a single pixel in the backend.
    ///
    /// The whole band is read back from the backend, modified and rewritten, so this
    /// is not atomic with respect to other writers of the same dataset.
    pub fn write_pixel(
        &mut self,
        band: usize,
        row: usize,
        column: usize,
        value: f64,
    ) -> Result<()> {
        let shape = self.shape();
        if band >= shape.bands || row >= shape.rows || column >= shape.cols {
            return Err(SkopeError::IndexOutOfBounds {
                band,
                row,
                column,
                shape: shape.into(),
            });
        }
        trace!(band, row, column, value, "writing pixel");
        let mut data = self.dataset.read_band(band)?;
        data[[row, column]] = value;
        self.dataset.write_band(band, &data)?;
        self.dataset.commit()
    }

    /// Commits pending writes and reloads the in-memory snapshot.
    pub fn flush(&mut self) -> Result<()> {
        self.dataset.commit()?;
        if let Some(path) = &self.path {
            self.dataset = self.backend.open(path, OpenFlags::UPDATE)?;
        }
        self.pixels = self.dataset.read_all_bands()?;
        debug!(path = ?self.path, "flushed raster grid");
        Ok(())
    }
}

impl<B: Backend> Display for RasterGrid<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.path.as_deref().and_then(Path::file_name) {
            Some(name) => write!(f, "RasterGrid('{}')", name.to_string_lossy()),
            None => f.write_str("RasterGrid(<handle>)"),
        }
    }
}
