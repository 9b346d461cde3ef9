//! Engine configuration

use serde::{Deserialize, Serialize};
use underwrite_xlsx::DEFAULT_MIN_COLUMNS;

use crate::catalog::MetricsCatalog;
use crate::error::Result;
use crate::irr::IrrConfig;

/// Hold period used when the workbook's hold-period cell is unusable
pub const DEFAULT_HOLD_PERIOD_YEARS: u32 = 5;

/// Everything an evaluation can be tuned with
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Where the metrics live
    pub catalog: MetricsCatalog,
    /// Floor on the snapshot width, so year columns past the last used
    /// column still exist
    pub min_columns: u32,
    pub default_hold_period_years: u32,
    pub irr: IrrConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog: MetricsCatalog::loopmagic(),
            min_columns: DEFAULT_MIN_COLUMNS,
            default_hold_period_years: DEFAULT_HOLD_PERIOD_YEARS,
            irr: IrrConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration; the catalog is validated
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.catalog.validate()?;
        Ok(config)
    }

    pub fn with_catalog(mut self, catalog: MetricsCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}
