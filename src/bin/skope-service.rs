//! SKOPE time-series service
//!
//! Serves `GET {base}/status` and
//! `GET {base}/timeseries/{datasetId}/{variableName}?longitude=&latitude=&start=&end=`.
//! Settings come from the environment, see [`skope::config::ServiceConfig::from_env`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Extension, Json, Router};
use clap::Parser;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use skope::config::ServiceConfig;
use skope::errors::SkopeError;
use skope::timeseries::{self, StatusResponse, TimeseriesQuery, TimeseriesResponse};

/// SKOPE time-series service
#[derive(Parser, Debug)]
#[command(name = "skope-service")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "127.0.0.1:8001", env = "SKOPE_LISTEN_ADDR")]
    listen: SocketAddr,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<SkopeError> for ApiError {
    fn from(e: SkopeError) -> Self {
        let status = match &e {
            SkopeError::NotFound { .. } => StatusCode::NOT_FOUND,
            SkopeError::BadArgument(_)
            | SkopeError::PointOutOfBounds { .. }
            | SkopeError::IndexOutOfBounds { .. }
            | SkopeError::BandOutOfRange { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, "{}", self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn status_handler(Extension(config): Extension<Arc<ServiceConfig>>) -> Json<StatusResponse> {
    Json(StatusResponse::new(&config))
}

async fn timeseries_handler(
    Extension(config): Extension<Arc<ServiceConfig>>,
    Path((dataset_id, variable_name)): Path<(String, String)>,
    Query(query): Query<TimeseriesQuery>,
) -> Result<Json<TimeseriesResponse>, ApiError> {
    let response = tokio::task::spawn_blocking(move || {
        timeseries::timeseries(&config, backend(), &dataset_id, &variable_name, &query)
    })
    .await
    .map_err(|e| ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: e.to_string(),
    })??;
    Ok(Json(response))
}

#[cfg(feature = "gdal")]
fn backend() -> skope::backend::GdalBackend {
    skope::backend::GdalBackend::new()
}

#[cfg(not(feature = "gdal"))]
fn backend() -> skope::backend::GeoTiffBackend {
    skope::backend::GeoTiffBackend::new()
}

fn app(config: ServiceConfig) -> Router {
    Router::new()
        .route(&format!("{}/status", config.base_path), get(status_handler))
        .route(
            &format!(
                "{}/timeseries/:dataset_id/:variable_name",
                config.base_path
            ),
            get(timeseries_handler),
        )
        .layer(Extension(Arc::new(config)))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = ServiceConfig::from_env();
    info!(base = %config.base_path, template = %config.data_path_template, "starting service");

    info!("listening on {}", args.listen);
    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    axum::serve(listener, app(config)).await
}
