//! Runtime configuration
//!
//! Options are read from environment variables; anything unset falls back to a
//! built-in default.
//!
//! ```
//! use skope::config::get_config_option;
//!
//! assert_eq!(get_config_option("SKOPE_SURELY_UNSET_OPTION", "XXX"), "XXX");
//! ```

use std::path::PathBuf;

use tracing::debug;

use crate::backend::Backend;
use crate::errors::{Result, SkopeError};

pub const SERVICE_BASE_KEY: &str = "SKOPE_SERVICE_BASE";
pub const SERVICE_NAME_KEY: &str = "SKOPE_SERVICE_NAME";
pub const DATA_PATH_TEMPLATE_KEY: &str = "SKOPE_DATA_PATH_TEMPLATE";
pub const DATA_FILE_EXTENSIONS_KEY: &str = "SKOPE_DATA_FILE_EXTENSIONS";

const DEFAULT_SERVICE_BASE: &str = "/timeseries-service/api/v1";
const DEFAULT_SERVICE_NAME: &str = "SKOPE Timeseries Service";
const DEFAULT_DATA_PATH_TEMPLATE: &str = "../data/{datasetId}_{variableName}";
const DEFAULT_DATA_FILE_EXTENSIONS: &[&str] = &[".tif", ".nc", ".nc4"];

/// Get the value of a configuration option
///
/// If the option specified by `key` is not set (or is not valid unicode), the value
/// passed in the `default` parameter is returned.
pub fn get_config_option(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Settings of the time-series service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// URI path prefix of every endpoint.
    pub base_path: String,
    /// Name reported by the status endpoint.
    pub name: String,
    /// Dataset path without extension; `{datasetId}` and `{variableName}` are substituted.
    pub data_path_template: String,
    /// Extensions tried in order when resolving a dataset path.
    pub data_file_extensions: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            base_path: DEFAULT_SERVICE_BASE.to_string(),
            name: DEFAULT_SERVICE_NAME.to_string(),
            data_path_template: DEFAULT_DATA_PATH_TEMPLATE.to_string(),
            data_file_extensions: DEFAULT_DATA_FILE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl ServiceConfig {
    /// Reads every setting from the environment, see the `*_KEY` constants.
    pub fn from_env() -> Self {
        let defaults = ServiceConfig::default();
        let extensions = get_config_option(
            DATA_FILE_EXTENSIONS_KEY,
            &defaults.data_file_extensions.join(","),
        );
        ServiceConfig {
            base_path: get_config_option(SERVICE_BASE_KEY, &defaults.base_path),
            name: get_config_option(SERVICE_NAME_KEY, &defaults.name),
            data_path_template: get_config_option(
                DATA_PATH_TEMPLATE_KEY,
                &defaults.data_path_template,
            ),
            data_file_extensions: parse_extensions(&extensions),
        }
    }

    /// The data path template with identifiers substituted, without an extension.
    pub fn dataset_stem(&self, dataset_id: &str, variable_name: &str) -> Result<String> {
        for (label, value) in [("dataset id", dataset_id), ("variable name", variable_name)] {
            if value.is_empty() || value.contains(['/', '\\']) || value == ".." {
                return Err(SkopeError::BadArgument(format!(
                    "invalid {label} '{value}'"
                )));
            }
        }
        Ok(self
            .data_path_template
            .replace("{datasetId}", dataset_id)
            .replace("{variableName}", variable_name))
    }

    /// First existing dataset path for the identifiers, trying each extension in turn.
    pub fn resolve_dataset_path<B: Backend>(
        &self,
        backend: &B,
        dataset_id: &str,
        variable_name: &str,
    ) -> Result<PathBuf> {
        let stem = self.dataset_stem(dataset_id, variable_name)?;
        let candidates = self
            .data_file_extensions
            .iter()
            .map(|ext| PathBuf::from(format!("{stem}{ext}")));
        for candidate in candidates {
            if backend.exists(&candidate) {
                debug!(path = %candidate.display(), "resolved dataset path");
                return Ok(candidate);
            }
        }
        Err(SkopeError::NotFound {
            path: PathBuf::from(stem),
        })
    }
}

fn parse_extensions(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .map(|ext| {
            if ext.starts_with('.') {
                ext.to_string()
            } else {
                format!(".{ext}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::raster::PixelType;
    use ndarray::Array3;

    #[test]
    fn test_get_config_option() {
        // tests share the process environment: this key must not be read anywhere else
        const KEY: &str = "SKOPE_GET_CONFIG_OPTION_TEST_ONLY";
        std::env::set_var(KEY, "1024");
        assert_eq!(get_config_option(KEY, ""), "1024");
        std::env::remove_var(KEY);
        assert_eq!(get_config_option(KEY, "XXX"), "XXX");
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.base_path, "/timeseries-service/api/v1");
        assert_eq!(config.name, "SKOPE Timeseries Service");
        assert_eq!(config.data_file_extensions, vec![".tif", ".nc", ".nc4"]);
    }

    #[test]
    fn test_parse_extensions() {
        assert_eq!(parse_extensions(".tif, nc4,,"), vec![".tif", ".nc4"]);
        assert!(parse_extensions("").is_empty());
    }

    #[test]
    fn test_dataset_stem() {
        let config = ServiceConfig::default();
        assert_eq!(
            config.dataset_stem("annual_5x5x5_dataset", "uint16_variable").unwrap(),
            "../data/annual_5x5x5_dataset_uint16_variable"
        );
        assert!(config.dataset_stem("../etc", "passwd").is_err());
        assert!(config.dataset_stem("dataset", "").is_err());
    }

    #[test]
    fn test_resolve_dataset_path() {
        let config = ServiceConfig {
            data_path_template: "data/{datasetId}_{variableName}".to_string(),
            ..Default::default()
        };
        let backend = MemoryBackend::new();
        backend.insert(
            "data/monthly_precipitation.nc4",
            PixelType::Float32,
            [0.0, 1.0, 0.0, 0.0, 0.0, -1.0],
            Array3::zeros((1, 1, 1)),
        );
        assert_eq!(
            config
                .resolve_dataset_path(&backend, "monthly", "precipitation")
                .unwrap(),
            PathBuf::from("data/monthly_precipitation.nc4")
        );
        assert!(matches!(
            config.resolve_dataset_path(&backend, "monthly", "temperature"),
            Err(SkopeError::NotFound { .. })
        ));
    }
}
