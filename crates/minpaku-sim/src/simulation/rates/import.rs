use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::{RateTable, RegionRate};

#[derive(Debug, thiserror::Error)]
pub enum RateTableError {
    #[error("failed to read rate table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rate table CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("rate table row {line}: {reason}")]
    Invalid { line: usize, reason: String },
}

#[derive(Debug, Deserialize)]
struct RegionRow {
    key: String,
    name: String,
    nightly_rate: i64,
    occupancy_percent: u32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    expense_percent: Option<f64>,
}

impl RegionRow {
    fn into_rate(self, line: usize) -> Result<RegionRate, RateTableError> {
        let invalid = |reason: &str| RateTableError::Invalid {
            line,
            reason: reason.to_string(),
        };

        if self.key.trim().is_empty() {
            return Err(invalid("key must not be empty"));
        }
        if self.nightly_rate < 0 {
            return Err(invalid("nightly_rate must not be negative"));
        }
        if self.occupancy_percent > 100 {
            return Err(invalid("occupancy_percent must be within 0..=100"));
        }
        if let Some(expense) = self.expense_percent {
            if !(0.0..=100.0).contains(&expense) {
                return Err(invalid("expense_percent must be within 0..=100"));
            }
        }

        let name = if self.name.trim().is_empty() {
            self.key.clone()
        } else {
            self.name
        };

        Ok(RegionRate {
            key: self.key,
            display_name: name,
            nightly_rate: self.nightly_rate,
            occupancy_percent: self.occupancy_percent,
            expense_percent: self.expense_percent,
        })
    }
}

impl RateTable {
    /// Applies region overrides from a CSV file with the header
    /// `key,name,nightly_rate,occupancy_percent,expense_percent`.
    pub fn with_region_overrides_from_path<P: AsRef<Path>>(
        self,
        path: P,
    ) -> Result<Self, RateTableError> {
        let file = std::fs::File::open(path)?;
        self.with_region_overrides_from_reader(file)
    }

    pub fn with_region_overrides_from_reader<R: Read>(
        mut self,
        reader: R,
    ) -> Result<Self, RateTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rates = Vec::new();
        for (index, row) in csv_reader.deserialize::<RegionRow>().enumerate() {
            // header occupies line 1
            rates.push(row?.into_rate(index + 2)?);
        }

        for rate in rates {
            self.upsert_region(rate);
        }
        Ok(self)
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
