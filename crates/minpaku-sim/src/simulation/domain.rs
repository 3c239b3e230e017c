use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Canonical internal currency unit.
pub type Yen = i64;

/// Amount entered in 万円 (ten-thousand yen) at the input boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManYen(pub i64);

impl ManYen {
    pub const YEN_PER_UNIT: i64 = 10_000;

    /// Converts to yen, returning `None` when the product overflows.
    pub fn to_yen(self) -> Option<Yen> {
        self.0.checked_mul(Self::YEN_PER_UNIT)
    }
}

/// Identifier wrapper for persisted simulations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationId(pub String);

impl SimulationId {
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("sim-{sequence:06}"))
    }
}

impl fmt::Display for SimulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Lease a unit and sublet it as a short-term rental.
    Rental,
    /// Buy the property outright.
    Purchase,
}

impl OperationType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "転貸" => Some(Self::Rental),
            "購入" => Some(Self::Purchase),
            other => match other.to_ascii_lowercase().as_str() {
                "rental" | "lease" | "sublet" | "lease-sublet" => Some(Self::Rental),
                "purchase" | "buy" => Some(Self::Purchase),
                _ => None,
            },
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Rental => "rental",
            Self::Purchase => "purchase",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Rental => "転貸",
            Self::Purchase => "購入",
        }
    }
}

/// The one active cost path for a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostBasis {
    Rental {
        monthly_rent: Yen,
        initial_costs: BTreeMap<String, Yen>,
    },
    Purchase {
        purchase_price: Yen,
    },
}

/// Normalized request: every amount in yen, required keys present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInput {
    pub region: String,
    pub property_type: String,
    pub area_sqm: u32,
    pub capacity: u32,
    pub legal_regime: String,
    pub renovation_cost: Yen,
    pub cost_basis: CostBasis,
}

impl PropertyInput {
    pub fn operation_type(&self) -> OperationType {
        match self.cost_basis {
            CostBasis::Rental { .. } => OperationType::Rental,
            CostBasis::Purchase { .. } => OperationType::Purchase,
        }
    }

    pub fn monthly_rent(&self) -> Yen {
        match &self.cost_basis {
            CostBasis::Rental { monthly_rent, .. } => *monthly_rent,
            CostBasis::Purchase { .. } => 0,
        }
    }

    pub fn purchase_price(&self) -> Yen {
        match &self.cost_basis {
            CostBasis::Purchase { purchase_price } => *purchase_price,
            CostBasis::Rental { .. } => 0,
        }
    }

    pub fn initial_costs(&self) -> BTreeMap<String, Yen> {
        match &self.cost_basis {
            CostBasis::Rental { initial_costs, .. } => initial_costs.clone(),
            CostBasis::Purchase { .. } => BTreeMap::new(),
        }
    }
}

/// Years needed to recoup the investment, or `Never` when profit is not positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum PaybackPeriod {
    Years(f64),
    Never,
}

impl PaybackPeriod {
    pub fn years(self) -> Option<f64> {
        match self {
            Self::Years(years) => Some(years),
            Self::Never => None,
        }
    }

    pub fn is_never(self) -> bool {
        matches!(self, Self::Never)
    }
}

impl From<Option<f64>> for PaybackPeriod {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(years) if years.is_finite() => Self::Years(years),
            _ => Self::Never,
        }
    }
}

impl From<PaybackPeriod> for Option<f64> {
    fn from(value: PaybackPeriod) -> Self {
        value.years()
    }
}

/// A monthly amount derived from an exact annual figure.
///
/// The annual value is retained so `value() * 12` never accumulates
/// rounding drift; serialization emits the real-valued quotient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyFigure {
    annual: Yen,
}

impl MonthlyFigure {
    pub const MONTHS: i64 = 12;

    pub fn from_annual(annual: Yen) -> Self {
        Self { annual }
    }

    pub fn value(self) -> f64 {
        self.annual as f64 / Self::MONTHS as f64
    }

    pub fn annualized(self) -> Yen {
        self.annual
    }
}

impl Serialize for MonthlyFigure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

impl<'de> Deserialize<'de> for MonthlyFigure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let monthly = f64::deserialize(deserializer)?;
        if !monthly.is_finite() {
            return Err(serde::de::Error::custom("monthly figure must be finite"));
        }
        Ok(Self::from_annual((monthly * Self::MONTHS as f64).round() as Yen))
    }
}

/// Output record of one projection. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub region: String,
    pub operation_type: OperationType,
    pub property_type: String,
    pub area: u32,
    pub capacity: u32,
    pub minpaku_law: String,
    pub daily_rate: Yen,
    pub occupancy_rate: f64,
    pub actual_operating_days: u32,
    pub annual_revenue: Yen,
    pub annual_costs: Yen,
    pub annual_profit: Yen,
    pub total_investment: Yen,
    pub roi: f64,
    pub payback_period: PaybackPeriod,
    pub monthly_revenue: MonthlyFigure,
    pub monthly_profit: MonthlyFigure,
    pub renovation_cost: Yen,
    pub monthly_rent: Yen,
    pub purchase_price: Yen,
    #[serde(default)]
    pub initial_costs: BTreeMap<String, Yen>,
    pub timestamp: DateTime<Utc>,
}
