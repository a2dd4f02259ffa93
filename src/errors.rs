use std::path::PathBuf;

use thiserror::Error;

use crate::geo_transform::GeoTransform;

pub type Result<T> = std::result::Result<T, SkopeError>;

#[derive(Debug, Error)]
pub enum SkopeError {
    #[error("Dataset file not found at path {}", path.display())]
    NotFound { path: PathBuf },
    #[error("Invalid dataset file found at path {}: {msg}", path.display())]
    InvalidFormat { path: PathBuf, msg: String },
    #[error("Bad argument: {0}")]
    BadArgument(String),
    #[error("The dataset is not north-up (geotransform {geo_transform:?})")]
    NotNorthUp { geo_transform: GeoTransform },
    #[error("Point ({longitude}, {latitude}) is outside the dataset coverage")]
    PointOutOfBounds { longitude: f64, latitude: f64 },
    #[error(
        "Index (band {band}, row {row}, column {column}) is out of bounds for shape {shape:?}"
    )]
    IndexOutOfBounds {
        band: usize,
        row: usize,
        column: usize,
        shape: (usize, usize, usize),
    },
    #[error("Band {band} is out of range for a dataset with {bands} bands")]
    BandOutOfRange { band: usize, bands: usize },
    #[error("Dataset '{path}' was opened read-only")]
    ReadOnly { path: String },
    #[error("Format '{format}' is not supported by the {backend} backend")]
    UnsupportedFormat {
        format: String,
        backend: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Tiff(#[from] tiff::TiffError),
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    #[cfg(feature = "gdal")]
    #[cfg_attr(docsrs, doc(cfg(feature = "gdal")))]
    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),
}
