//! Reference data for regions, legal regimes, and property types.
//!
//! Every lookup succeeds: unknown keys resolve to the table's designated default
//! entry, and the returned [`Resolution`] records whether that happened.

mod import;

pub use import::RateTableError;

use serde::Serialize;

use super::domain::{PropertyInput, Yen};

/// Baseline economics for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRate {
    pub key: String,
    pub display_name: String,
    pub nightly_rate: Yen,
    /// Whole percent in `0..=100`.
    pub occupancy_percent: u32,
    /// Region specific management/expense ratio as a percent of revenue.
    pub expense_percent: Option<f64>,
}

impl RegionRate {
    pub fn occupancy_rate(&self) -> f64 {
        f64::from(self.occupancy_percent) / 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegalRegime {
    pub key: String,
    pub display_name: String,
    pub max_operating_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyProfile {
    pub key: String,
    pub monthly_cleaning_cost: Yen,
    pub max_capacity: u32,
}

/// Outcome of a lookup; `matched` is false when the default entry was substituted.
#[derive(Debug, PartialEq)]
pub struct Resolution<'a, T> {
    pub entry: &'a T,
    pub matched: bool,
}

impl<T> Clone for Resolution<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Resolution<'_, T> {}

impl<T> Resolution<'_, T> {
    pub fn is_fallback(&self) -> bool {
        !self.matched
    }
}

/// All rates needed to project one input.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRates<'a> {
    pub region: Resolution<'a, RegionRate>,
    pub regime: Resolution<'a, LegalRegime>,
    pub property: Resolution<'a, PropertyProfile>,
}

trait Keyed {
    fn key(&self) -> &str;
    fn display_name(&self) -> &str;
}

impl Keyed for RegionRate {
    fn key(&self) -> &str {
        &self.key
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl Keyed for LegalRegime {
    fn key(&self) -> &str {
        &self.key
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl Keyed for PropertyProfile {
    fn key(&self) -> &str {
        &self.key
    }

    fn display_name(&self) -> &str {
        &self.key
    }
}

fn lookup<'a, T: Keyed>(entries: &'a [T], default: usize, raw: &str) -> Resolution<'a, T> {
    let needle = raw.trim();
    let found = entries.iter().find(|entry| {
        entry.key().eq_ignore_ascii_case(needle) || entry.display_name() == needle
    });

    match found {
        Some(entry) => Resolution {
            entry,
            matched: true,
        },
        None => Resolution {
            entry: &entries[default],
            matched: false,
        },
    }
}

/// Immutable lookup table consolidating every observed rate variant.
#[derive(Debug, Clone)]
pub struct RateTable {
    regions: Vec<RegionRate>,
    default_region: usize,
    regimes: Vec<LegalRegime>,
    default_regime: usize,
    properties: Vec<PropertyProfile>,
    default_property: usize,
}

impl Default for RateTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RateTable {
    pub const DEFAULT_REGION: &'static str = "other";
    pub const DEFAULT_REGIME: &'static str = "ryokan";
    pub const DEFAULT_PROPERTY: &'static str = "1K";

    pub fn standard() -> Self {
        let regions = vec![
            region("tokyo", "東京都", 8500, 75),
            region("osaka", "大阪府", 6500, 70),
            region("kyoto", "京都府", 7000, 68),
            region("kanagawa", "神奈川県", 7500, 72),
            region("aichi", "愛知県", 5500, 65),
            region("fukuoka", "福岡県", 4500, 62),
            region("okinawa", "沖縄県", 6000, 62),
            region("hokkaido", "北海道", 5000, 55),
            region(Self::DEFAULT_REGION, "その他地方", 4000, 40),
        ];

        let regimes = vec![
            regime("shinpo", "民泊新法対応", 180),
            regime(Self::DEFAULT_REGIME, "旅館業法", 365),
            regime("tokku", "特区民泊", 365),
        ];

        let properties = vec![
            property(Self::DEFAULT_PROPERTY, 15_000, 3),
            property("1DK", 18_000, 4),
            property("1LDK", 20_000, 5),
            property("2LDK", 25_000, 6),
            property("3LDK", 30_000, 8),
            property("戸建て", 35_000, 10),
        ];

        Self {
            default_region: position(&regions, Self::DEFAULT_REGION),
            default_regime: position(&regimes, Self::DEFAULT_REGIME),
            default_property: position(&properties, Self::DEFAULT_PROPERTY),
            regions,
            regimes,
            properties,
        }
    }

    pub fn regions(&self) -> &[RegionRate] {
        &self.regions
    }

    pub fn regimes(&self) -> &[LegalRegime] {
        &self.regimes
    }

    pub fn properties(&self) -> &[PropertyProfile] {
        &self.properties
    }

    pub fn resolve_region(&self, raw: &str) -> Resolution<'_, RegionRate> {
        lookup(&self.regions, self.default_region, raw)
    }

    pub fn resolve_regime(&self, raw: &str) -> Resolution<'_, LegalRegime> {
        lookup(&self.regimes, self.default_regime, raw)
    }

    pub fn resolve_property(&self, raw: &str) -> Resolution<'_, PropertyProfile> {
        lookup(&self.properties, self.default_property, raw)
    }

    pub fn resolve(&self, input: &PropertyInput) -> ResolvedRates<'_> {
        ResolvedRates {
            region: self.resolve_region(&input.region),
            regime: self.resolve_regime(&input.legal_regime),
            property: self.resolve_property(&input.property_type),
        }
    }

    /// Replaces the region with the same key, or appends a new one.
    pub(crate) fn upsert_region(&mut self, rate: RegionRate) {
        match self
            .regions
            .iter_mut()
            .find(|existing| existing.key.eq_ignore_ascii_case(&rate.key))
        {
            Some(existing) => *existing = rate,
            None => self.regions.push(rate),
        }
    }
}

fn position<T: Keyed>(entries: &[T], key: &str) -> usize {
    entries
        .iter()
        .position(|entry| entry.key() == key)
        .unwrap_or_default()
}

fn region(key: &str, name: &str, nightly_rate: Yen, occupancy_percent: u32) -> RegionRate {
    RegionRate {
        key: key.to_string(),
        display_name: name.to_string(),
        nightly_rate,
        occupancy_percent,
        expense_percent: None,
    }
}

fn regime(key: &str, name: &str, max_operating_days: u32) -> LegalRegime {
    LegalRegime {
        key: key.to_string(),
        display_name: name.to_string(),
        max_operating_days,
    }
}

fn property(key: &str, monthly_cleaning_cost: Yen, max_capacity: u32) -> PropertyProfile {
    PropertyProfile {
        key: key.to_string(),
        monthly_cleaning_cost,
        max_capacity,
    }
}
