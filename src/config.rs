//! Report configuration (YAML)
//!
//! ```yaml
//! max_upload_bytes: 10485760
//! rates:
//!   EUR: 0.92
//!   CHF: 1.25
//! layout:
//!   opex_month_marker: "26"
//! ```
//!
//! Every field is optional; missing fields take the defaults below.

use crate::currency::ExchangeRateTable;
use crate::error::{ReportError, ReportResult};
use crate::parser::layout::{SheetLayout, LAYOUT_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Default cap on workbook size (25 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub max_upload_bytes: u64,
    /// Rates merged over the built-in seed (1 unit → USD)
    pub rates: BTreeMap<String, f64>,
    pub layout: SheetLayout,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            rates: BTreeMap::new(),
            layout: SheetLayout::default(),
        }
    }
}

impl ReportConfig {
    /// Read and validate a YAML config file
    pub fn load(path: &Path) -> ReportResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> ReportResult<Self> {
        let config: ReportConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReportResult<()> {
        if !self.layout.is_supported() {
            return Err(ReportError::Config(format!(
                "layout version {} is not supported (expected {})",
                self.layout.version, LAYOUT_VERSION
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(ReportError::Config(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        if self.layout.customer_months.is_empty() {
            return Err(ReportError::Config(
                "layout.customer_months must list at least one month".to_string(),
            ));
        }
        if self.layout.opex_month_marker.is_empty() {
            return Err(ReportError::Config(
                "layout.opex_month_marker must not be empty".to_string(),
            ));
        }
        // Surfaces bad rates as InvalidRate before a session is built
        self.exchange_rates().map(|_| ())
    }

    /// Seed rates with this config's overrides applied
    pub fn exchange_rates(&self) -> ReportResult<ExchangeRateTable> {
        let mut table = ExchangeRateTable::default();
        for (code, rate) in &self.rates {
            table.set_rate(code, *rate)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.max_upload_bytes, 26_214_400);
        assert!(config.rates.is_empty());
        assert_eq!(config.layout, SheetLayout::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = ReportConfig::from_yaml("{}").unwrap();
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn test_rate_overrides_merge_over_seed() {
        let config = ReportConfig::from_yaml("rates:\n  EUR: 0.9\n  chf: 1.25\n").unwrap();
        let rates = config.exchange_rates().unwrap();

        assert_eq!(rates.get("EUR"), Some(0.9));
        assert_eq!(rates.get("CHF"), Some(1.25));
        assert_eq!(rates.get("JPY"), Some(0.0067));
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let result = ReportConfig::from_yaml("rates:\n  EUR: -2\n");
        assert!(matches!(result, Err(ReportError::InvalidRate { .. })));
    }

    #[test]
    fn test_unsupported_layout_version_rejected() {
        let result = ReportConfig::from_yaml("layout:\n  version: 2\n");
        assert!(matches!(result, Err(ReportError::Config(_))));
    }

    #[test]
    fn test_zero_upload_cap_rejected() {
        let result = ReportConfig::from_yaml("max_upload_bytes: 0\n");
        assert!(matches!(result, Err(ReportError::Config(_))));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = ReportConfig::from_yaml("max_upload_bytes: [1, 2");
        assert!(matches!(result, Err(ReportError::Yaml(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_upload_bytes: 1024").unwrap();
        writeln!(file, "layout:").unwrap();
        writeln!(file, "  customer_months: [\"Jan-26\", \"Feb-26\"]").unwrap();

        let config = ReportConfig::load(file.path()).unwrap();
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.layout.customer_months, vec!["Jan-26", "Feb-26"]);
        assert_eq!(config.layout.customer_last_month_col(), 2);
    }
}
