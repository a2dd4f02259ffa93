use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ndarray::{Array2, Array3, Axis};

use crate::backend::{check_band, check_band_dim, Backend, BackendDataset, OpenFlags};
use crate::errors::{Result, SkopeError};
use crate::geo_transform::GeoTransform;
use crate::raster::{GridShape, PixelType};
use crate::spatial_ref::WellKnownGeogCs;

const FORMAT: &str = "MEM";
const DEFAULT_GEO_TRANSFORM: GeoTransform = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

#[derive(Debug, Clone)]
struct StoredRaster {
    pixel_type: PixelType,
    geo_transform: GeoTransform,
    coordinate_system: Option<WellKnownGeogCs>,
    pixels: Array3<f64>,
    no_data: Vec<Option<f64>>,
}

impl StoredRaster {
    fn shape(&self) -> GridShape {
        self.pixels.dim().into()
    }
}

type Store = Rc<RefCell<HashMap<PathBuf, StoredRaster>>>;

/// An in-process backend keeping datasets in a map keyed by path.
///
/// Clones share the same store. Handles work on a private copy of their dataset
/// until [`commit`](BackendDataset::commit) publishes it back to the store, which is
/// what a later [`open`](Backend::open) sees.
///
/// The store is reference counted without locking, so the backend stays on the thread
/// that created it.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Store,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `pixels` as a dataset at `path`, replacing any previous one.
    pub fn insert(
        &self,
        path: impl AsRef<Path>,
        pixel_type: PixelType,
        geo_transform: GeoTransform,
        pixels: Array3<f64>,
    ) {
        let bands = pixels.len_of(Axis(0));
        let pixels = pixels.mapv(|v| pixel_type.quantize(v));
        self.store.borrow_mut().insert(
            path.as_ref().to_path_buf(),
            StoredRaster {
                pixel_type,
                geo_transform,
                coordinate_system: None,
                pixels,
                no_data: vec![None; bands],
            },
        );
    }

    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.store.borrow_mut().remove(path.as_ref()).is_some()
    }

    pub fn len(&self) -> usize {
        self.store.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.borrow().is_empty()
    }
}

impl Backend for MemoryBackend {
    type Dataset = MemoryDataset;

    fn name(&self) -> &'static str {
        "memory"
    }

    fn exists(&self, path: &Path) -> bool {
        self.store.borrow().contains_key(path)
    }

    fn open(&self, path: &Path, flags: OpenFlags) -> Result<MemoryDataset> {
        let raster = self
            .store
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| SkopeError::NotFound {
                path: path.to_path_buf(),
            })?;
        Ok(MemoryDataset {
            store: Rc::clone(&self.store),
            path: path.to_path_buf(),
            flags,
            raster,
        })
    }

    fn allocate(
        &self,
        path: &Path,
        format: &str,
        pixel_type: PixelType,
        shape: GridShape,
    ) -> Result<MemoryDataset> {
        if !format.eq_ignore_ascii_case(FORMAT) {
            return Err(SkopeError::UnsupportedFormat {
                format: format.to_string(),
                backend: self.name(),
            });
        }
        if shape.is_empty() {
            return Err(SkopeError::BadArgument(format!(
                "cannot allocate a dataset of shape {shape:?}"
            )));
        }
        self.insert(
            path,
            pixel_type,
            DEFAULT_GEO_TRANSFORM,
            Array3::zeros((shape.bands, shape.rows, shape.cols)),
        );
        self.open(path, OpenFlags::UPDATE)
    }
}

/// Handle on a dataset of a [`MemoryBackend`].
#[derive(Debug)]
pub struct MemoryDataset {
    store: Store,
    path: PathBuf,
    flags: OpenFlags,
    raster: StoredRaster,
}

impl MemoryDataset {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_writable(&self) -> Result<()> {
        if !self.flags.contains(OpenFlags::UPDATE) {
            return Err(SkopeError::ReadOnly {
                path: self.path.display().to_string(),
            });
        }
        Ok(())
    }
}

impl BackendDataset for MemoryDataset {
    fn format(&self) -> &str {
        FORMAT
    }

    fn shape(&self) -> GridShape {
        self.raster.shape()
    }

    fn pixel_type(&self) -> PixelType {
        self.raster.pixel_type
    }

    fn geo_transform(&self) -> Result<GeoTransform> {
        Ok(self.raster.geo_transform)
    }

    fn set_geo_transform(&mut self, geo_transform: &GeoTransform) -> Result<()> {
        self.ensure_writable()?;
        self.raster.geo_transform = *geo_transform;
        Ok(())
    }

    fn coordinate_system(&self) -> Result<Option<String>> {
        Ok(self.raster.coordinate_system.map(|cs| cs.to_wkt()))
    }

    fn set_coordinate_system(&mut self, name: &str) -> Result<()> {
        self.ensure_writable()?;
        self.raster.coordinate_system = Some(name.parse()?);
        Ok(())
    }

    fn read_all_bands(&self) -> Result<Array3<f64>> {
        Ok(self.raster.pixels.clone())
    }

    fn read_band(&self, band: usize) -> Result<Array2<f64>> {
        check_band(band, self.shape())?;
        Ok(self.raster.pixels.index_axis(Axis(0), band).to_owned())
    }

    fn write_band(&mut self, band: usize, data: &Array2<f64>) -> Result<()> {
        self.ensure_writable()?;
        check_band(band, self.shape())?;
        check_band_dim(data, self.shape())?;
        let pixel_type = self.raster.pixel_type;
        self.raster
            .pixels
            .index_axis_mut(Axis(0), band)
            .zip_mut_with(data, |stored, &v| *stored = pixel_type.quantize(v));
        Ok(())
    }

    fn no_data(&self, band: usize) -> Result<Option<f64>> {
        check_band(band, self.shape())?;
        Ok(self.raster.no_data[band])
    }

    fn set_no_data(&mut self, band: usize, value: f64) -> Result<()> {
        self.ensure_writable()?;
        check_band(band, self.shape())?;
        self.raster.no_data[band] = Some(value);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        // a read-only handle has nothing to publish
        if !self.flags.contains(OpenFlags::UPDATE) {
            return Ok(());
        }
        self.store
            .borrow_mut()
            .insert(self.path.clone(), self.raster.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn allocated(backend: &MemoryBackend) -> MemoryDataset {
        backend
            .allocate(
                Path::new("grid"),
                "MEM",
                PixelType::UInt16,
                GridShape::new(2, 2, 3),
            )
            .unwrap()
    }

    #[test]
    fn test_allocate_is_zero_filled() {
        let backend = MemoryBackend::new();
        let dataset = allocated(&backend);
        assert_eq!(dataset.format(), "MEM");
        assert_eq!(dataset.shape(), GridShape::new(2, 2, 3));
        assert_eq!(dataset.pixel_type(), PixelType::UInt16);
        assert_eq!(dataset.geo_transform().unwrap(), DEFAULT_GEO_TRANSFORM);
        assert!(dataset.read_all_bands().unwrap().iter().all(|&v| v == 0.0));
        assert!(backend.exists(Path::new("grid")));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_allocate_rejects_other_formats() {
        let backend = MemoryBackend::new();
        let result = backend.allocate(
            Path::new("grid"),
            "GTiff",
            PixelType::Byte,
            GridShape::new(1, 1, 1),
        );
        assert!(matches!(
            result,
            Err(SkopeError::UnsupportedFormat { backend: "memory", .. })
        ));
    }

    #[test]
    fn test_allocate_rejects_empty_shape() {
        let backend = MemoryBackend::new();
        let result = backend.allocate(
            Path::new("grid"),
            "MEM",
            PixelType::Byte,
            GridShape::new(1, 0, 1),
        );
        assert!(matches!(result, Err(SkopeError::BadArgument(_))));
        assert!(backend.is_empty());
    }

    #[test]
    fn test_open_missing() {
        let backend = MemoryBackend::new();
        let result = backend.open(Path::new("nowhere"), OpenFlags::READ_ONLY);
        assert!(matches!(result, Err(SkopeError::NotFound { .. })));
    }

    #[test]
    fn test_writes_are_private_until_commit() {
        let backend = MemoryBackend::new();
        let mut dataset = allocated(&backend);
        dataset
            .write_band(1, &arr2(&[[1.2, 2.0, 3.0], [4.0, 5.0, 70000.0]]))
            .unwrap();
        assert_eq!(
            dataset.read_band(1).unwrap(),
            arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 65535.0]])
        );

        let other = backend.open(Path::new("grid"), OpenFlags::READ_ONLY).unwrap();
        assert_eq!(other.read_band(1).unwrap(), Array2::<f64>::zeros((2, 3)));

        dataset.set_no_data(1, -1.0).unwrap();
        dataset.commit().unwrap();
        let reopened = backend.open(Path::new("grid"), OpenFlags::READ_ONLY).unwrap();
        assert_eq!(reopened.read_band(1).unwrap()[[1, 2]], 65535.0);
        assert_eq!(reopened.no_data(1).unwrap(), Some(-1.0));
        assert_eq!(reopened.no_data(0).unwrap(), None);
    }

    #[test]
    fn test_read_only_handle_refuses_writes() {
        let backend = MemoryBackend::new();
        allocated(&backend);
        let mut dataset = backend.open(Path::new("grid"), OpenFlags::READ_ONLY).unwrap();
        assert!(matches!(
            dataset.set_no_data(0, 0.0),
            Err(SkopeError::ReadOnly { .. })
        ));
        assert!(matches!(
            dataset.write_band(0, &Array2::zeros((2, 3))),
            Err(SkopeError::ReadOnly { .. })
        ));
        assert!(dataset.commit().is_ok());
    }

    #[test]
    fn test_band_checks() {
        let backend = MemoryBackend::new();
        let mut dataset = allocated(&backend);
        assert!(matches!(
            dataset.read_band(2),
            Err(SkopeError::BandOutOfRange { band: 2, bands: 2 })
        ));
        assert!(matches!(
            dataset.write_band(0, &Array2::zeros((3, 2))),
            Err(SkopeError::BadArgument(_))
        ));
    }

    #[test]
    fn test_coordinate_system() {
        let backend = MemoryBackend::new();
        let mut dataset = allocated(&backend);
        assert_eq!(dataset.coordinate_system().unwrap(), None);
        dataset.set_coordinate_system("WGS84").unwrap();
        let wkt = dataset.coordinate_system().unwrap().unwrap();
        assert!(wkt.starts_with("GEOGCS[\"WGS 84\""));
        assert!(dataset.set_coordinate_system("Mars2000").is_err());
    }
}
