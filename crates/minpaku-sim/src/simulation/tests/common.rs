use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::simulation::domain::{CostBasis, ProjectionResult, PropertyInput, SimulationId};
use crate::simulation::input::SimulationRequest;
use crate::simulation::rates::{LegalRegime, PropertyProfile, RegionRate, Resolution, ResolvedRates};
use crate::simulation::relay::{DeliveryTarget, MessageRelay, RelayError};
use crate::simulation::repository::{RepositoryError, SimulationRecord, SimulationRepository};
use crate::simulation::service::SimulationService;

pub(super) fn tokyo_rental_request() -> SimulationRequest {
    request(json!({
        "region": "tokyo",
        "operationType": "rental",
        "propertyType": "1LDK",
        "area": 40,
        "capacity": 4,
        "minpakuLaw": "shinpo",
        "monthlyRent": 100000,
        "renovationCost": 0,
        "initialCosts": {}
    }))
}

pub(super) fn request(value: Value) -> SimulationRequest {
    serde_json::from_value(value).expect("request deserializes")
}

pub(super) fn rental_input(monthly_rent: i64, renovation_cost: i64) -> PropertyInput {
    PropertyInput {
        region: "tokyo".to_string(),
        property_type: "1LDK".to_string(),
        area_sqm: 40,
        capacity: 2,
        legal_regime: "shinpo".to_string(),
        renovation_cost,
        cost_basis: CostBasis::Rental {
            monthly_rent,
            initial_costs: BTreeMap::new(),
        },
    }
}

pub(super) fn purchase_input(purchase_price: i64) -> PropertyInput {
    PropertyInput {
        region: "custom".to_string(),
        property_type: "戸建て".to_string(),
        area_sqm: 90,
        capacity: 6,
        legal_regime: "ryokan".to_string(),
        renovation_cost: 0,
        cost_basis: CostBasis::Purchase { purchase_price },
    }
}

pub(super) fn region_rate(nightly_rate: i64, occupancy_percent: u32) -> RegionRate {
    RegionRate {
        key: "custom".to_string(),
        display_name: "テスト県".to_string(),
        nightly_rate,
        occupancy_percent,
        expense_percent: None,
    }
}

pub(super) fn regime(max_operating_days: u32) -> LegalRegime {
    LegalRegime {
        key: "custom".to_string(),
        display_name: "テスト法".to_string(),
        max_operating_days,
    }
}

pub(super) fn profile(monthly_cleaning_cost: i64) -> PropertyProfile {
    PropertyProfile {
        key: "1LDK".to_string(),
        monthly_cleaning_cost,
        max_capacity: 5,
    }
}

pub(super) fn resolved<'a>(
    region: &'a RegionRate,
    regime: &'a LegalRegime,
    property: &'a PropertyProfile,
) -> ResolvedRates<'a> {
    ResolvedRates {
        region: Resolution {
            entry: region,
            matched: true,
        },
        regime: Resolution {
            entry: regime,
            matched: true,
        },
        property: Resolution {
            entry: property,
            matched: true,
        },
    }
}

pub(super) fn build_service() -> (
    SimulationService<MemoryRepository, MemoryRelay>,
    Arc<MemoryRepository>,
    Arc<MemoryRelay>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let relay = Arc::new(MemoryRelay::default());
    let service = SimulationService::new(repository.clone(), relay.clone());
    (service, repository, relay)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<Vec<SimulationRecord>>>,
}

impl SimulationRepository for MemoryRepository {
    fn append(&self, result: ProjectionResult) -> Result<SimulationId, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let id = SimulationId::from_sequence(guard.len() as u64 + 1);
        guard.push(SimulationRecord {
            simulation_id: id.clone(),
            result,
        });
        Ok(id)
    }

    fn latest(&self) -> Result<Option<SimulationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.last().cloned())
    }

    fn fetch(&self, id: &SimulationId) -> Result<Option<SimulationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .find(|record| &record.simulation_id == id)
            .cloned())
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.records.lock().expect("repository mutex poisoned").len())
    }
}

pub(super) struct UnavailableRepository;

impl SimulationRepository for UnavailableRepository {
    fn append(&self, _result: ProjectionResult) -> Result<SimulationId, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest(&self) -> Result<Option<SimulationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SimulationId) -> Result<Option<SimulationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRelay {
    deliveries: Arc<Mutex<Vec<(DeliveryTarget, String)>>>,
}

impl MemoryRelay {
    pub(super) fn deliveries(&self) -> Vec<(DeliveryTarget, String)> {
        self.deliveries.lock().expect("relay mutex poisoned").clone()
    }
}

impl MessageRelay for MemoryRelay {
    fn deliver(&self, target: &DeliveryTarget, text: &str) -> Result<(), RelayError> {
        self.deliveries
            .lock()
            .expect("relay mutex poisoned")
            .push((target.clone(), text.to_string()));
        Ok(())
    }
}

pub(super) struct FailingRelay;

impl MessageRelay for FailingRelay {
    fn deliver(&self, _target: &DeliveryTarget, _text: &str) -> Result<(), RelayError> {
        Err(RelayError::Transport("timeout".to_string()))
    }
}

pub(super) fn text_event(reply_token: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": reply_token,
        "source": { "type": "user", "userId": "U-test" },
        "message": { "type": "text", "id": "m-1", "text": text }
    })
}
