//! Prints the time series of one pixel of a raster dataset, one value per line.
//!
//! ```text
//! series -f data/annual_5x5x5_dataset_uint16_variable.tif -x 0 -y 0
//! series -f data/annual_5x5x5_dataset_uint16_variable.tif --lon -123 --lat 45 --begin 1
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use skope::backend::{Backend, GeoTiffBackend};
use skope::errors::{Result, SkopeError};
use skope::RasterGrid;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum BackendKind {
    /// Native GeoTIFF reader
    Geotiff,
    /// Any format GDAL can open (requires the `gdal` feature)
    Gdal,
}

/// Extract the time series of a pixel from a raster dataset
#[derive(Parser, Debug)]
#[command(name = "series")]
#[command(group(ArgGroup::new("location").args(["column", "longitude"]).required(true)))]
#[command(group(
    ArgGroup::new("pixel")
        .args(["column", "row"])
        .multiple(true)
        .conflicts_with("point")
))]
#[command(group(ArgGroup::new("point").args(["longitude", "latitude"]).multiple(true)))]
struct Args {
    /// Path to the raster dataset file
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Column index of the pixel to sample
    #[arg(short = 'x', long, visible_alias = "col", requires = "row")]
    column: Option<usize>,

    /// Row index of the pixel to sample
    #[arg(short = 'y', long, requires = "column")]
    row: Option<usize>,

    /// Longitude of the point to sample
    #[arg(
        long,
        visible_aliases = ["lon", "long"],
        requires = "latitude",
        allow_negative_numbers = true
    )]
    longitude: Option<f64>,

    /// Latitude of the point to sample
    #[arg(long, visible_alias = "lat", requires = "longitude", allow_negative_numbers = true)]
    latitude: Option<f64>,

    /// First band of the series
    #[arg(long)]
    begin: Option<usize>,

    /// Band after the last band of the series
    #[arg(long)]
    end: Option<usize>,

    /// Backend used to open the dataset
    #[arg(long, value_enum, default_value_t = BackendKind::Geotiff, env = "SKOPE_BACKEND")]
    backend: BackendKind,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let series = match args.backend {
        BackendKind::Geotiff => extract(GeoTiffBackend::new(), &args),
        #[cfg(feature = "gdal")]
        BackendKind::Gdal => extract(skope::backend::GdalBackend::new(), &args),
        #[cfg(not(feature = "gdal"))]
        BackendKind::Gdal => Err(SkopeError::BadArgument(
            "series was built without the `gdal` feature".to_string(),
        )),
    };

    match series {
        Ok(values) => {
            for value in values {
                println!("{value}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn extract<B: Backend>(backend: B, args: &Args) -> Result<Vec<f64>> {
    let grid = RasterGrid::open_path(backend, &args.file)?;
    debug!(grid = %grid, shape = ?grid.shape(), "sampling series");
    match (args.row, args.column, args.longitude, args.latitude) {
        (Some(row), Some(column), _, _) => grid.series_at_pixel(row, column, args.begin, args.end),
        (_, _, Some(longitude), Some(latitude)) => {
            grid.series_at_point(longitude, latitude, args.begin, args.end)
        }
        _ => Err(SkopeError::BadArgument(
            "provide either -x and -y or --lon and --lat".to_string(),
        )),
    }
}
