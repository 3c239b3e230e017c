use chrono::{DateTime, Utc};

use super::domain::{
    CostBasis, MonthlyFigure, PaybackPeriod, ProjectionResult, PropertyInput, Yen,
};
use super::error::CalculationError;
use super::rates::{RegionRate, ResolvedRates};

/// Formula deltas between deployments. The default reproduces the canonical
/// rent-only model: no capacity pricing, no expense ratio, no cleaning costs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectionConfig {
    /// Nightly rate grows by this fraction per guest above [`BASE_CAPACITY`],
    /// up to the property type's maximum capacity.
    pub capacity_step: Option<f64>,
    /// Percent of revenue charged as management expense when the region has no own ratio.
    pub expense_percent: f64,
    /// Add the property type's monthly cleaning cost to recurring costs.
    pub include_cleaning: bool,
}

pub const BASE_CAPACITY: u32 = 2;
pub const DAYS_PER_YEAR: u32 = 365;
const MONTHS_PER_YEAR: i64 = 12;

#[derive(Debug, Clone, Default)]
pub struct ProjectionCalculator {
    config: ProjectionConfig,
}

impl ProjectionCalculator {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn project(
        &self,
        input: &PropertyInput,
        rates: &ResolvedRates<'_>,
    ) -> Result<ProjectionResult, CalculationError> {
        self.project_at(input, rates, Utc::now())
    }

    /// Same as [`project`](Self::project) with an explicit creation time.
    pub fn project_at(
        &self,
        input: &PropertyInput,
        rates: &ResolvedRates<'_>,
        created_at: DateTime<Utc>,
    ) -> Result<ProjectionResult, CalculationError> {
        let region = rates.region.entry;
        let regime = rates.regime.entry;

        let operating_cap = regime.max_operating_days.min(DAYS_PER_YEAR);
        let actual_operating_days = operating_cap * region.occupancy_percent.min(100) / 100;

        let priced_guests = input.capacity.min(rates.property.entry.max_capacity);
        let daily_rate = self.daily_rate(region, priced_guests)?;
        let annual_revenue = daily_rate
            .checked_mul(Yen::from(actual_operating_days))
            .ok_or(CalculationError::Overflow {
                step: "annual revenue",
            })?;

        let expense_percent = region
            .expense_percent
            .unwrap_or(self.config.expense_percent);
        let annual_expense = percent_of(annual_revenue, expense_percent)?;

        let annual_cleaning = if self.config.include_cleaning {
            annualize(rates.property.entry.monthly_cleaning_cost, "cleaning costs")?
        } else {
            0
        };

        let (annual_rent, total_investment) = match &input.cost_basis {
            CostBasis::Rental {
                monthly_rent,
                initial_costs,
            } => {
                let annual_rent = annualize(*monthly_rent, "annual rent")?;
                let total_initial = initial_costs
                    .values()
                    .try_fold(0_i64, |sum, cost| sum.checked_add(*cost))
                    .ok_or(CalculationError::Overflow {
                        step: "initial costs",
                    })?;
                let investment = input.renovation_cost.checked_add(total_initial).ok_or(
                    CalculationError::Overflow {
                        step: "total investment",
                    },
                )?;
                (annual_rent, investment)
            }
            CostBasis::Purchase { purchase_price } => {
                let investment = purchase_price.checked_add(input.renovation_cost).ok_or(
                    CalculationError::Overflow {
                        step: "total investment",
                    },
                )?;
                (0, investment)
            }
        };

        let annual_costs = annual_rent
            .checked_add(annual_expense)
            .and_then(|costs| costs.checked_add(annual_cleaning))
            .ok_or(CalculationError::Overflow {
                step: "annual costs",
            })?;
        let annual_profit =
            annual_revenue
                .checked_sub(annual_costs)
                .ok_or(CalculationError::Overflow {
                    step: "annual profit",
                })?;

        let roi = if total_investment > 0 {
            annual_profit as f64 / total_investment as f64 * 100.0
        } else {
            0.0
        };

        let payback_period = if annual_profit > 0 {
            PaybackPeriod::Years(total_investment as f64 / annual_profit as f64)
        } else {
            PaybackPeriod::Never
        };

        Ok(ProjectionResult {
            region: region.display_name.clone(),
            operation_type: input.operation_type(),
            property_type: input.property_type.clone(),
            area: input.area_sqm,
            capacity: input.capacity,
            minpaku_law: regime.display_name.clone(),
            daily_rate,
            occupancy_rate: f64::from(region.occupancy_percent),
            actual_operating_days,
            annual_revenue,
            annual_costs,
            annual_profit,
            total_investment,
            roi,
            payback_period,
            monthly_revenue: MonthlyFigure::from_annual(annual_revenue),
            monthly_profit: MonthlyFigure::from_annual(annual_profit),
            renovation_cost: input.renovation_cost,
            monthly_rent: input.monthly_rent(),
            purchase_price: input.purchase_price(),
            initial_costs: input.initial_costs(),
            timestamp: created_at,
        })
    }

    fn daily_rate(&self, region: &RegionRate, capacity: u32) -> Result<Yen, CalculationError> {
        let Some(step) = self.config.capacity_step else {
            return Ok(region.nightly_rate);
        };

        let extra_guests = f64::from(capacity) - f64::from(BASE_CAPACITY);
        let multiplier = (1.0 + extra_guests * step).max(0.0);
        to_yen(region.nightly_rate as f64 * multiplier, "daily rate")
    }
}

fn annualize(monthly: Yen, step: &'static str) -> Result<Yen, CalculationError> {
    monthly
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or(CalculationError::Overflow { step })
}

fn percent_of(amount: Yen, percent: f64) -> Result<Yen, CalculationError> {
    if percent == 0.0 {
        return Ok(0);
    }
    to_yen((amount as f64 * percent / 100.0).floor(), "expense ratio")
}

fn to_yen(value: f64, step: &'static str) -> Result<Yen, CalculationError> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded >= Yen::MAX as f64 || rounded <= Yen::MIN as f64 {
        return Err(CalculationError::Overflow { step });
    }
    Ok(rounded as Yen)
}
