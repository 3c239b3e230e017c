use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use minpaku_sim::config::StorageConfig;
use minpaku_sim::simulation::{
    DeliveryTarget, MessageRelay, ProjectionResult, RelayError, RepositoryError, SimulationId,
    SimulationRecord, SimulationRepository, SqliteSimulationRepository,
};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) store: Arc<ConfiguredRepository>,
    pub(crate) started_at: DateTime<Utc>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySimulationRepository {
    records: Arc<Mutex<Vec<SimulationRecord>>>,
}

impl InMemorySimulationRepository {
    fn records(&self) -> Result<MutexGuard<'_, Vec<SimulationRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl SimulationRepository for InMemorySimulationRepository {
    fn append(&self, result: ProjectionResult) -> Result<SimulationId, RepositoryError> {
        let mut guard = self.records()?;
        let id = SimulationId::from_sequence(guard.len() as u64 + 1);
        guard.push(SimulationRecord {
            simulation_id: id.clone(),
            result,
        });
        Ok(id)
    }

    fn latest(&self) -> Result<Option<SimulationRecord>, RepositoryError> {
        Ok(self.records()?.last().cloned())
    }

    fn fetch(&self, id: &SimulationId) -> Result<Option<SimulationRecord>, RepositoryError> {
        Ok(self
            .records()?
            .iter()
            .find(|record| &record.simulation_id == id)
            .cloned())
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.records()?.len())
    }
}

/// Store selected by `APP_STORE`.
pub(crate) enum ConfiguredRepository {
    Memory(InMemorySimulationRepository),
    Sqlite(SqliteSimulationRepository),
}

impl ConfiguredRepository {
    pub(crate) fn from_config(config: &StorageConfig) -> Result<Self, RepositoryError> {
        match config {
            StorageConfig::Memory => Ok(Self::Memory(InMemorySimulationRepository::default())),
            StorageConfig::Sqlite { path } => {
                info!(path = %path.display(), "opening sqlite simulation store");
                Ok(Self::Sqlite(SqliteSimulationRepository::open(path)?))
            }
        }
    }

    pub(crate) fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Sqlite(_) => "sqlite",
        }
    }

    fn inner(&self) -> &dyn SimulationRepository {
        match self {
            Self::Memory(repository) => repository,
            Self::Sqlite(repository) => repository,
        }
    }
}

impl SimulationRepository for ConfiguredRepository {
    fn append(&self, result: ProjectionResult) -> Result<SimulationId, RepositoryError> {
        self.inner().append(result)
    }

    fn latest(&self) -> Result<Option<SimulationRecord>, RepositoryError> {
        self.inner().latest()
    }

    fn fetch(&self, id: &SimulationId) -> Result<Option<SimulationRecord>, RepositoryError> {
        self.inner().fetch(id)
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        self.inner().count()
    }
}

/// Records outbound chat replies in the service log instead of sending them.
#[derive(Default, Clone, Copy)]
pub(crate) struct LoggingRelay;

impl MessageRelay for LoggingRelay {
    fn deliver(&self, target: &DeliveryTarget, text: &str) -> Result<(), RelayError> {
        info!(?target, chars = text.chars().count(), "chat reply queued");
        Ok(())
    }
}
