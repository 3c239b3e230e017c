use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{CostBasis, ManYen, OperationType, PropertyInput, Yen};
use super::error::{CalculationError, SimulationError, ValidationError};

/// Raw request as posted by the simulator front end.
///
/// Fields stay loosely typed so that coercion rules (blank → 0, numeric
/// strings, truncation) are applied here rather than by the deserializer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    #[serde(default)]
    pub region: Option<Value>,
    #[serde(default)]
    pub operation_type: Option<Value>,
    #[serde(default)]
    pub property_type: Option<Value>,
    #[serde(default)]
    pub area: Option<Value>,
    #[serde(default)]
    pub custom_area: Option<Value>,
    #[serde(default)]
    pub capacity: Option<Value>,
    #[serde(default)]
    pub minpaku_law: Option<Value>,
    #[serde(default)]
    pub monthly_rent: Option<Value>,
    #[serde(default)]
    pub purchase_price: Option<Value>,
    #[serde(default)]
    pub renovation_cost: Option<Value>,
    #[serde(default)]
    pub initial_costs: Option<Value>,
}

impl SimulationRequest {
    /// Validates required keys and converts every amount to yen.
    pub fn normalize(&self) -> Result<PropertyInput, SimulationError> {
        let region = required_text("region", self.region.as_ref())?;
        let operation_raw = required_text("operationType", self.operation_type.as_ref())?;
        let property_type = required_text("propertyType", self.property_type.as_ref())?;
        let legal_regime = required_text("minpakuLaw", self.minpaku_law.as_ref())?;

        let operation_type = OperationType::parse(&operation_raw).ok_or_else(|| {
            ValidationError::invalid("operationType", "expected `rental` or `purchase`")
        })?;

        let custom_area = count("customArea", self.custom_area.as_ref(), 0)?;
        let area_sqm = if custom_area > 0 {
            custom_area
        } else {
            count("area", self.area.as_ref(), 0)?
        };

        let capacity = count("capacity", self.capacity.as_ref(), 1)?;
        if capacity == 0 {
            return Err(ValidationError::invalid("capacity", "must be at least 1").into());
        }

        let renovation_cost = man_yen("renovationCost", self.renovation_cost.as_ref())?;

        let cost_basis = match operation_type {
            OperationType::Rental => {
                let monthly_rent = amount("monthlyRent", self.monthly_rent.as_ref())?;
                let initial_costs = initial_costs(self.initial_costs.as_ref())?;
                CostBasis::Rental {
                    monthly_rent,
                    initial_costs,
                }
            }
            OperationType::Purchase => CostBasis::Purchase {
                purchase_price: man_yen("purchasePrice", self.purchase_price.as_ref())?,
            },
        };

        Ok(PropertyInput {
            region,
            property_type,
            area_sqm,
            capacity,
            legal_regime,
            renovation_cost,
            cost_basis,
        })
    }
}

fn required_text(field: &str, value: Option<&Value>) -> Result<String, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::missing(field)),
        Some(Value::String(text)) if text.trim().is_empty() => {
            Err(ValidationError::missing(field))
        }
        Some(Value::String(text)) => Ok(text.trim().to_string()),
        Some(_) => Err(ValidationError::invalid(field, "expected a string")),
    }
}

/// Coerces a loosely typed number: absent or blank → `default`, fractions truncate.
fn integer(field: &str, value: Option<&Value>, default: i64) -> Result<i64, SimulationError> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(default),
        Some(Value::Number(number)) => match number.as_i64() {
            Some(whole) => whole,
            None => truncate(field, number.as_f64())?,
        },
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(default);
            }
            match trimmed.parse::<i64>() {
                Ok(whole) => whole,
                Err(_) => truncate(field, trimmed.parse::<f64>().ok())?,
            }
        }
        Some(_) => return Err(CalculationError::non_numeric(field).into()),
    };

    if parsed < 0 {
        return Err(ValidationError::invalid(field, "must not be negative").into());
    }
    Ok(parsed)
}

fn truncate(field: &str, value: Option<f64>) -> Result<i64, SimulationError> {
    let value = value.ok_or_else(|| CalculationError::non_numeric(field))?;
    if !value.is_finite() {
        return Err(CalculationError::non_numeric(field).into());
    }
    let whole = value.trunc();
    if whole >= i64::MAX as f64 || whole <= i64::MIN as f64 {
        return Err(CalculationError::Overflow {
            step: "input coercion",
        }
        .into());
    }
    Ok(whole as i64)
}

fn amount(field: &str, value: Option<&Value>) -> Result<Yen, SimulationError> {
    integer(field, value, 0)
}

fn man_yen(field: &str, value: Option<&Value>) -> Result<Yen, SimulationError> {
    let units = ManYen(integer(field, value, 0)?);
    units.to_yen().ok_or_else(|| {
        CalculationError::Overflow {
            step: "unit conversion",
        }
        .into()
    })
}

/// Labelled one-time costs; a missing or null map is empty, zero entries are dropped.
fn initial_costs(value: Option<&Value>) -> Result<BTreeMap<String, Yen>, SimulationError> {
    let entries = match value {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => entries,
        Some(_) => return Err(CalculationError::non_numeric("initialCosts").into()),
    };

    let mut costs = BTreeMap::new();
    for (label, value) in entries {
        let cost = amount(&format!("initialCosts.{label}"), Some(value))?;
        if cost > 0 {
            costs.insert(label.clone(), cost);
        }
    }
    Ok(costs)
}

fn count(field: &str, value: Option<&Value>, default: u32) -> Result<u32, SimulationError> {
    let raw = integer(field, value, i64::from(default))?;
    u32::try_from(raw).map_err(|_| ValidationError::invalid(field, "value is too large").into())
}
