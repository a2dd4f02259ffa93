//! GDAL-backed datasets (requires the `gdal` feature)

use std::path::{Path, PathBuf};

use gdal::raster::{Buffer, GdalDataType};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DatasetOptions, DriverManager, GdalOpenFlags};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use tracing::debug;

use crate::backend::{check_band, check_band_dim, Backend, BackendDataset, OpenFlags};
use crate::errors::{Result, SkopeError};
use crate::geo_transform::GeoTransform;
use crate::raster::{GridShape, PixelType};
use crate::spatial_ref::WellKnownGeogCs;

/// What GDAL reports for a dataset without a geotransform.
const DEFAULT_GEO_TRANSFORM: GeoTransform = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Opens and creates datasets through any GDAL raster driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalBackend;

impl GdalBackend {
    pub fn new() -> Self {
        GdalBackend
    }
}

impl Backend for GdalBackend {
    type Dataset = GdalDataset;

    fn name(&self) -> &'static str {
        "gdal"
    }

    fn open(&self, path: &Path, flags: OpenFlags) -> Result<GdalDataset> {
        if !self.exists(path) {
            return Err(SkopeError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let mut open_flags = GdalOpenFlags::GDAL_OF_RASTER;
        if flags.contains(OpenFlags::UPDATE) {
            open_flags |= GdalOpenFlags::GDAL_OF_UPDATE;
        }
        let dataset = Dataset::open_ex(
            path,
            DatasetOptions {
                open_flags,
                ..Default::default()
            },
        )
        .map_err(|e| SkopeError::InvalidFormat {
            path: path.to_path_buf(),
            msg: e.to_string(),
        })?;
        let mut dataset = GdalDataset::from_dataset(dataset, flags)?;
        dataset.path = Some(path.to_path_buf());
        Ok(dataset)
    }

    fn allocate(
        &self,
        path: &Path,
        format: &str,
        pixel_type: PixelType,
        shape: GridShape,
    ) -> Result<GdalDataset> {
        if shape.is_empty() {
            return Err(SkopeError::BadArgument(format!(
                "cannot allocate a dataset of shape {shape:?}"
            )));
        }
        let driver = DriverManager::get_driver_by_name(format).map_err(|_| {
            SkopeError::UnsupportedFormat {
                format: format.to_string(),
                backend: self.name(),
            }
        })?;
        let (cols, rows, bands) = (shape.cols, shape.rows, shape.bands);
        let dataset = match pixel_type {
            PixelType::Byte => driver.create_with_band_type::<u8, _>(path, cols, rows, bands),
            PixelType::UInt16 => driver.create_with_band_type::<u16, _>(path, cols, rows, bands),
            PixelType::Int16 => driver.create_with_band_type::<i16, _>(path, cols, rows, bands),
            PixelType::UInt32 => driver.create_with_band_type::<u32, _>(path, cols, rows, bands),
            PixelType::Int32 => driver.create_with_band_type::<i32, _>(path, cols, rows, bands),
            PixelType::Float32 => {
                driver.create_with_band_type::<f32, _>(path, cols, rows, bands)
            }
            PixelType::Float64 => {
                driver.create_with_band_type::<f64, _>(path, cols, rows, bands)
            }
        }?;
        debug!(path = %path.display(), format, %pixel_type, "created GDAL dataset");
        let mut dataset = GdalDataset::from_dataset(dataset, OpenFlags::UPDATE)?;
        dataset.path = Some(path.to_path_buf());
        Ok(dataset)
    }
}

/// An open [`gdal::Dataset`].
#[derive(Debug)]
pub struct GdalDataset {
    dataset: Dataset,
    path: Option<PathBuf>,
    flags: OpenFlags,
    format: String,
    pixel_type: PixelType,
}

impl GdalDataset {
    /// Wraps a dataset opened directly through GDAL.
    ///
    /// `flags` should match how `dataset` was opened; writes are refused unless it
    /// contains [`OpenFlags::UPDATE`].
    pub fn from_dataset(dataset: Dataset, flags: OpenFlags) -> Result<Self> {
        if dataset.raster_count() == 0 {
            return Err(SkopeError::BadArgument(
                "dataset has no raster bands".to_string(),
            ));
        }
        let band_type = dataset.rasterband(1)?.band_type();
        let pixel_type = match band_type {
            GdalDataType::UInt8 => PixelType::Byte,
            GdalDataType::UInt16 => PixelType::UInt16,
            GdalDataType::Int16 => PixelType::Int16,
            GdalDataType::UInt32 => PixelType::UInt32,
            GdalDataType::Int32 => PixelType::Int32,
            GdalDataType::Float32 => PixelType::Float32,
            GdalDataType::Float64 => PixelType::Float64,
            other => {
                return Err(SkopeError::BadArgument(format!(
                    "unsupported band type {other:?}"
                )))
            }
        };
        let format = dataset.driver().short_name();
        Ok(GdalDataset {
            dataset,
            path: None,
            flags,
            format,
            pixel_type,
        })
    }

    pub fn gdal_dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn ensure_writable(&self) -> Result<()> {
        if !self.flags.contains(OpenFlags::UPDATE) {
            let path = self
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            return Err(SkopeError::ReadOnly { path });
        }
        Ok(())
    }
}

impl BackendDataset for GdalDataset {
    fn format(&self) -> &str {
        &self.format
    }

    fn shape(&self) -> GridShape {
        let (cols, rows) = self.dataset.raster_size();
        GridShape::new(self.dataset.raster_count(), rows, cols)
    }

    fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    fn geo_transform(&self) -> Result<GeoTransform> {
        Ok(self
            .dataset
            .geo_transform()
            .unwrap_or(DEFAULT_GEO_TRANSFORM))
    }

    fn set_geo_transform(&mut self, geo_transform: &GeoTransform) -> Result<()> {
        self.ensure_writable()?;
        self.dataset.set_geo_transform(geo_transform)?;
        Ok(())
    }

    fn coordinate_system(&self) -> Result<Option<String>> {
        let wkt = self.dataset.projection();
        Ok((!wkt.is_empty()).then_some(wkt))
    }

    fn set_coordinate_system(&mut self, name: &str) -> Result<()> {
        self.ensure_writable()?;
        let cs: WellKnownGeogCs = name.parse()?;
        let srs = SpatialRef::from_epsg(u32::from(cs.epsg()))?;
        self.dataset.set_spatial_ref(&srs)?;
        Ok(())
    }

    fn read_all_bands(&self) -> Result<Array3<f64>> {
        let bands = (0..self.shape().bands)
            .map(|band| self.read_band(band))
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<ArrayView2<f64>> = bands.iter().map(|band| band.view()).collect();
        Ok(ndarray::stack(Axis(0), &views)?)
    }

    fn read_band(&self, band: usize) -> Result<Array2<f64>> {
        let shape = self.shape();
        check_band(band, shape)?;
        let rasterband = self.dataset.rasterband(band + 1)?;
        let size = (shape.cols, shape.rows);
        let buffer = rasterband.read_as::<f64>((0, 0), size, size, None)?;
        Ok(buffer.to_array()?)
    }

    fn write_band(&mut self, band: usize, data: &Array2<f64>) -> Result<()> {
        self.ensure_writable()?;
        let shape = self.shape();
        check_band(band, shape)?;
        check_band_dim(data, shape)?;
        let mut buffer: Buffer<f64> = data.clone().into();
        let mut rasterband = self.dataset.rasterband(band + 1)?;
        rasterband.write((0, 0), (shape.cols, shape.rows), &mut buffer)?;
        Ok(())
    }

    fn no_data(&self, band: usize) -> Result<Option<f64>> {
        check_band(band, self.shape())?;
        Ok(self.dataset.rasterband(band + 1)?.no_data_value())
    }

    fn set_no_data(&mut self, band: usize, value: f64) -> Result<()> {
        self.ensure_writable()?;
        check_band(band, self.shape())?;
        let mut rasterband = self.dataset.rasterband(band + 1)?;
        rasterband.set_no_data_value(Some(value))?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.dataset.flush_cache()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TempFixture;
    use ndarray::arr2;

    #[test]
    fn test_create_geotiff() {
        let fixture = TempFixture::empty("gdal_created.tif");
        let mut dataset = GdalBackend
            .allocate(
                fixture.path(),
                "GTiff",
                PixelType::Float32,
                GridShape::new(6, 4, 5),
            )
            .unwrap();
        dataset
            .set_geo_transform(&[-123.0, 1.0, 0.0, 45.0, 0.0, -2.0])
            .unwrap();
        dataset.set_coordinate_system("WGS84").unwrap();
        dataset.commit().unwrap();
        drop(dataset);

        let reopened = GdalBackend
            .open(fixture.path(), OpenFlags::READ_ONLY)
            .unwrap();
        assert_eq!(reopened.format(), "GTiff");
        assert_eq!(reopened.shape(), GridShape::new(6, 4, 5));
        assert_eq!(reopened.pixel_type(), PixelType::Float32);
        assert_eq!(
            reopened.geo_transform().unwrap(),
            [-123.0, 1.0, 0.0, 45.0, 0.0, -2.0]
        );
        let wkt = reopened.coordinate_system().unwrap().unwrap();
        assert_eq!(&wkt[8..14], "WGS 84");
        assert!(reopened.read_all_bands().unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_write_band_round_trip() {
        let fixture = TempFixture::empty("gdal_bands.tif");
        let mut dataset = GdalBackend
            .allocate(fixture.path(), "GTiff", PixelType::Int32, GridShape::new(2, 2, 2))
            .unwrap();
        dataset
            .write_band(1, &arr2(&[[1.0, 2.0], [3.0, 4.0]]))
            .unwrap();
        dataset.set_no_data(1, -1.0).unwrap();
        dataset.commit().unwrap();
        drop(dataset);

        let reopened = GdalBackend
            .open(fixture.path(), OpenFlags::READ_ONLY)
            .unwrap();
        assert_eq!(
            reopened.read_band(1).unwrap(),
            arr2(&[[1.0, 2.0], [3.0, 4.0]])
        );
        assert_eq!(reopened.no_data(1).unwrap(), Some(-1.0));
    }

    #[test]
    fn test_open_invalid_file() {
        let fixture = TempFixture::empty("gdal_invalid.txt");
        std::fs::write(fixture.path(), b"").unwrap();
        let result = GdalBackend.open(fixture.path(), OpenFlags::READ_ONLY);
        assert!(matches!(result, Err(SkopeError::InvalidFormat { .. })));
    }

    #[test]
    fn test_unknown_driver() {
        let fixture = TempFixture::empty("gdal_unknown.xyz");
        let result = GdalBackend.allocate(
            fixture.path(),
            "NoSuchDriver",
            PixelType::Byte,
            GridShape::new(1, 1, 1),
        );
        assert!(matches!(
            result,
            Err(SkopeError::UnsupportedFormat { backend: "gdal", .. })
        ));
    }
}
