//! Geocoded raster grids

mod create_options;
mod grid;
mod types;

pub use create_options::CreateOptions;
pub use grid::RasterGrid;
pub use types::{GridShape, PixelType};
