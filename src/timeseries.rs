//! Request and response types of the time-series service.
//!
//! Band bounds are inclusive on the wire: `start=0&end=4` selects five bands. They are
//! translated to the half-open range used by
//! [`RasterGrid::series_at_point`](crate::RasterGrid::series_at_point) in
//! [`TimeseriesQuery::band_range`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::Backend;
use crate::config::ServiceConfig;
use crate::errors::Result;
use crate::raster::RasterGrid;

const DEFAULT_START: &str = "0";
const DEFAULT_END: &str = "4";

/// Query string of `GET {base}/timeseries/{datasetId}/{variableName}`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TimeseriesQuery {
    pub longitude: f64,
    pub latitude: f64,
    /// First band, inclusive.
    pub start: Option<usize>,
    /// Last band, inclusive.
    pub end: Option<usize>,
}

impl TimeseriesQuery {
    /// `(begin, end)` as a half-open band range.
    pub fn band_range(&self) -> (Option<usize>, Option<usize>) {
        (self.start, self.end.map(|end| end + 1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub name: String,
}

impl StatusResponse {
    pub fn new(config: &ServiceConfig) -> Self {
        StatusResponse {
            name: config.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

impl PointGeometry {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        PointGeometry {
            kind: "Point".to_string(),
            coordinates: [longitude, latitude],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesResponse {
    pub dataset_id: String,
    pub variable_name: String,
    pub boundary_geometry: PointGeometry,
    pub start: String,
    pub end: String,
    pub values: Vec<f64>,
}

/// Looks up the series of one variable of a dataset at a point.
pub fn timeseries<B: Backend>(
    config: &ServiceConfig,
    backend: B,
    dataset_id: &str,
    variable_name: &str,
    query: &TimeseriesQuery,
) -> Result<TimeseriesResponse> {
    let path = config.resolve_dataset_path(&backend, dataset_id, variable_name)?;
    let grid = RasterGrid::open_path(backend, &path)?;
    let (begin, end) = query.band_range();
    let values = grid.series_at_point(query.longitude, query.latitude, begin, end)?;
    debug!(
        dataset_id,
        variable_name,
        longitude = query.longitude,
        latitude = query.latitude,
        count = values.len(),
        "extracted time series"
    );
    Ok(TimeseriesResponse {
        dataset_id: dataset_id.to_string(),
        variable_name: variable_name.to_string(),
        boundary_geometry: PointGeometry::new(query.longitude, query.latitude),
        start: query
            .start
            .map_or_else(|| DEFAULT_START.to_string(), |start| start.to_string()),
        end: query
            .end
            .map_or_else(|| DEFAULT_END.to_string(), |end| end.to_string()),
        values,
    })
}
