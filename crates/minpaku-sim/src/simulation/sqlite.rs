use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use super::domain::{ProjectionResult, SimulationId};
use super::repository::{RepositoryError, SimulationRecord, SimulationRepository};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS simulations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        region TEXT NOT NULL,
        operation_type TEXT NOT NULL,
        property_type TEXT NOT NULL,
        monthly_rent INTEGER NOT NULL,
        annual_revenue INTEGER NOT NULL,
        annual_costs INTEGER NOT NULL,
        annual_profit INTEGER NOT NULL,
        total_investment INTEGER NOT NULL,
        roi REAL NOT NULL,
        payback_period REAL,
        payload TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
";

/// SQLite-backed store. A single connection behind a mutex serializes writers.
pub struct SqliteSimulationRepository {
    conn: Mutex<Connection>,
}

impl SqliteSimulationRepository {
    /// Opens (or creates) the database file, creating parent directories as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                RepositoryError::Unavailable(format!("create {}: {err}", parent.display()))
            })?;
        }
        let conn = Connection::open(path).map_err(unavailable)?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, RepositoryError> {
        let conn = Connection::open_in_memory().map_err(unavailable)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, RepositoryError> {
        conn.execute_batch(SCHEMA).map_err(unavailable)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection mutex poisoned".to_string()))
    }
}

impl SimulationRepository for SqliteSimulationRepository {
    fn append(&self, result: ProjectionResult) -> Result<SimulationId, RepositoryError> {
        let payload =
            serde_json::to_string(&result).map_err(|err| RepositoryError::Corrupt(err.to_string()))?;
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO simulations (
                region, operation_type, property_type, monthly_rent, annual_revenue,
                annual_costs, annual_profit, total_investment, roi, payback_period,
                payload, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                result.region,
                result.operation_type.key(),
                result.property_type,
                result.monthly_rent,
                result.annual_revenue,
                result.annual_costs,
                result.annual_profit,
                result.total_investment,
                result.roi,
                result.payback_period.years(),
                payload,
                result.timestamp.to_rfc3339(),
            ],
        )
        .map_err(unavailable)?;

        let row_id = conn.last_insert_rowid();
        Ok(SimulationId::from_sequence(row_id.unsigned_abs()))
    }

    fn latest(&self) -> Result<Option<SimulationRecord>, RepositoryError> {
        let conn = self.connection()?;
        let row = conn
            .query_row(
                "SELECT id, payload FROM simulations ORDER BY id DESC LIMIT 1",
                [],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(unavailable)?;

        row.map(|(id, payload)| decode(id, &payload)).transpose()
    }

    fn fetch(&self, id: &SimulationId) -> Result<Option<SimulationRecord>, RepositoryError> {
        let Some(row_id) = parse_row_id(id) else {
            return Ok(None);
        };

        let conn = self.connection()?;
        let payload = conn
            .query_row(
                "SELECT payload FROM simulations WHERE id = ?1",
                params![row_id],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(unavailable)?;

        payload
            .map(|payload| decode(row_id, &payload))
            .transpose()
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        let conn = self.connection()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM simulations", [], |row| row.get(0))
            .map_err(unavailable)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

fn parse_row_id(id: &SimulationId) -> Option<i64> {
    id.0.strip_prefix("sim-")?.parse().ok()
}

fn decode(row_id: i64, payload: &str) -> Result<SimulationRecord, RepositoryError> {
    let result: ProjectionResult = serde_json::from_str(payload)
        .map_err(|err| RepositoryError::Corrupt(format!("row {row_id}: {err}")))?;
    Ok(SimulationRecord {
        simulation_id: SimulationId::from_sequence(row_id.unsigned_abs()),
        result,
    })
}

fn unavailable(err: rusqlite::Error) -> RepositoryError {
    RepositoryError::Unavailable(err.to_string())
}
