//! Minpaku investment simulation: rate lookup, projection, formatting,
//! persistence, and chat relay.

pub mod domain;
mod error;
pub mod format;
pub mod input;
pub mod projection;
pub mod rates;
pub mod relay;
pub mod repository;
pub mod router;
pub mod service;
pub mod sqlite;
pub mod webhook;

#[cfg(test)]
mod tests;

pub use domain::{
    CostBasis, ManYen, MonthlyFigure, OperationType, PaybackPeriod, ProjectionResult,
    PropertyInput, SimulationId, Yen,
};
pub use error::{CalculationError, SimulationError, ValidationError};
pub use format::ResultFormatter;
pub use input::SimulationRequest;
pub use projection::{ProjectionCalculator, ProjectionConfig};
pub use rates::{
    LegalRegime, PropertyProfile, RateTable, RateTableError, RegionRate, Resolution,
    ResolvedRates,
};
pub use relay::{DeliveryTarget, MessageRelay, RelayError};
pub use repository::{RepositoryError, SimulationRecord, SimulationRepository};
pub use router::simulation_router;
pub use service::{SimulationOutcome, SimulationService, WebhookSummary};
pub use sqlite::SqliteSimulationRepository;
pub use webhook::{ChatIntent, WebhookEvent, WebhookPayload};
