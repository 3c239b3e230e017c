use serde::{Deserialize, Serialize};

use super::domain::{ProjectionResult, SimulationId};

/// A stored projection together with its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRecord {
    pub simulation_id: SimulationId,
    #[serde(flatten)]
    pub result: ProjectionResult,
}

/// Append-only store of projections ordered by insertion.
///
/// Implementations must serialize concurrent appends; records are never
/// updated in place.
pub trait SimulationRepository: Send + Sync {
    fn append(&self, result: ProjectionResult) -> Result<SimulationId, RepositoryError>;
    fn latest(&self) -> Result<Option<SimulationRecord>, RepositoryError>;
    fn fetch(&self, id: &SimulationId) -> Result<Option<SimulationRecord>, RepositoryError>;
    fn count(&self) -> Result<usize, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("stored record is unreadable: {0}")]
    Corrupt(String),
}
