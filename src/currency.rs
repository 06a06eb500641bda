//! Exchange-rate table and USD conversion of tidy-table columns

use crate::error::{ReportError, ReportResult};
use crate::types::{ColumnValue, TidyTable};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Conversion target; every stored rate converts one unit of a currency to this
pub const BASE_CURRENCY: &str = "USD";

/// Seed rates (1 unit of currency → USD)
pub const DEFAULT_RATES: [(&str, f64); 4] = [
    ("EUR", 0.875843475231553),
    ("GBP", 1.14175652188951),
    ("INR", 0.012),
    ("JPY", 0.0067),
];

/// What a conversion request did to the table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ConversionOutcome {
    Converted { rate: f64 },
    /// No rate stored for the source currency; the table is unchanged
    UnknownCurrency,
    /// The column is already in USD; the table is unchanged
    AlreadyUsd,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRateTable {
    rates: BTreeMap<String, f64>,
}

impl Default for ExchangeRateTable {
    fn default() -> Self {
        Self {
            rates: DEFAULT_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
        }
    }
}

impl ExchangeRateTable {
    /// A table with no rates at all
    pub fn empty() -> Self {
        Self {
            rates: BTreeMap::new(),
        }
    }

    pub fn get(&self, currency: &str) -> Option<f64> {
        self.rates.get(&normalize(currency)).copied()
    }

    pub fn contains(&self, currency: &str) -> bool {
        self.rates.contains_key(&normalize(currency))
    }

    /// Insert or update a rate. Rates must be positive and finite.
    pub fn set_rate(&mut self, currency: &str, rate: f64) -> ReportResult<()> {
        let code = normalize(currency);
        if code.is_empty() || !rate.is_finite() || rate <= 0.0 {
            return Err(ReportError::InvalidRate {
                currency: code,
                rate,
            });
        }
        info!(currency = %code, rate, "exchange rate updated");
        self.rates.insert(code, rate);
        Ok(())
    }

    pub fn currencies(&self) -> Vec<&str> {
        self.rates.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(code, rate)| (code.as_str(), *rate))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Multiply every value of `column` by the rate for `from`, in place.
    ///
    /// Unknown currencies leave the table untouched and log a warning. A column
    /// converted once is tagged USD and later requests are no-ops.
    pub fn convert_column(
        &self,
        table: &mut TidyTable,
        column: &str,
        from: &str,
    ) -> ReportResult<ConversionOutcome> {
        let table_name = table.name.clone();
        let target = table
            .column_mut(column)
            .ok_or_else(|| ReportError::ColumnNotFound(column.to_string()))?;

        let ColumnValue::Number(values) = &mut target.values else {
            return Err(ReportError::ColumnNotNumeric(column.to_string()));
        };

        let code = normalize(from);
        if code == BASE_CURRENCY || target.currency.as_deref() == Some(BASE_CURRENCY) {
            return Ok(ConversionOutcome::AlreadyUsd);
        }

        let Some(rate) = self.rates.get(&code).copied() else {
            warn!(
                table = %table_name,
                column,
                currency = %code,
                "no exchange rate for currency, column left unchanged"
            );
            return Ok(ConversionOutcome::UnknownCurrency);
        };

        for value in values.iter_mut() {
            *value *= rate;
        }
        target.currency = Some(BASE_CURRENCY.to_string());
        info!(table = %table_name, column, currency = %code, rate, "column converted to USD");

        Ok(ConversionOutcome::Converted { rate })
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}
