use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::domain::{ProjectionResult, SimulationId};
use super::error::{SimulationError, ValidationError};
use super::format::{ResultFormatter, DEFAULT_SIGNATURE};
use super::input::SimulationRequest;
use super::projection::{ProjectionCalculator, ProjectionConfig};
use super::rates::{RateTable, ResolvedRates};
use super::relay::MessageRelay;
use super::repository::{RepositoryError, SimulationRecord, SimulationRepository};
use super::webhook::{ChatIntent, WebhookPayload};

const DEFAULT_SITE_URL: &str = "http://localhost:3000";

/// Result of one simulation run as returned to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutcome {
    /// `None` when the result could not be persisted.
    pub simulation_id: Option<SimulationId>,
    /// Lookups that resolved to a default entry.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<&'static str>,
    #[serde(flatten)]
    pub result: ProjectionResult,
}

/// Counts for one processed webhook delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WebhookSummary {
    pub replies: usize,
    pub failures: usize,
}

/// Service composing rate lookup, projection, persistence, and chat relay.
pub struct SimulationService<R, M> {
    rates: Arc<RateTable>,
    calculator: ProjectionCalculator,
    formatter: ResultFormatter,
    repository: Arc<R>,
    relay: Arc<M>,
}

impl<R, M> SimulationService<R, M>
where
    R: SimulationRepository + 'static,
    M: MessageRelay + 'static,
{
    pub fn new(repository: Arc<R>, relay: Arc<M>) -> Self {
        Self {
            rates: Arc::new(RateTable::standard()),
            calculator: ProjectionCalculator::default(),
            formatter: ResultFormatter::new(DEFAULT_SITE_URL, DEFAULT_SIGNATURE),
            repository,
            relay,
        }
    }

    pub fn with_rates(mut self, rates: RateTable) -> Self {
        self.rates = Arc::new(rates);
        self
    }

    pub fn with_projection(mut self, config: ProjectionConfig) -> Self {
        self.calculator = ProjectionCalculator::new(config);
        self
    }

    pub fn with_formatter(mut self, formatter: ResultFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn formatter(&self) -> &ResultFormatter {
        &self.formatter
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Compute a projection without persisting it.
    pub fn preview(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationOutcome, SimulationError> {
        let input = request.normalize()?;
        let rates = self.rates.resolve(&input);

        let property = rates.property;
        if property.matched && input.capacity > property.entry.max_capacity {
            return Err(ValidationError::invalid(
                "capacity",
                format!(
                    "{} accommodates at most {} guests",
                    property.entry.key, property.entry.max_capacity
                ),
            )
            .into());
        }

        let fallbacks = fallbacks(&rates);
        if !fallbacks.is_empty() {
            debug!(?fallbacks, region = %input.region, "rate lookup used default entries");
        }

        let result = self.calculator.project(&input, &rates).map_err(|err| {
            error!(%err, "projection failed");
            err
        })?;

        Ok(SimulationOutcome {
            simulation_id: None,
            fallbacks,
            result,
        })
    }

    /// Compute a projection and append it to the store.
    ///
    /// A failed store write is logged; the computed result is still returned.
    pub fn submit(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationOutcome, SimulationError> {
        let mut outcome = self.preview(request)?;

        match self.repository.append(outcome.result.clone()) {
            Ok(id) => {
                info!(
                    simulation_id = %id,
                    region = %outcome.result.region,
                    roi = outcome.result.roi,
                    "simulation stored"
                );
                outcome.simulation_id = Some(id);
            }
            Err(err) => warn!(%err, "simulation computed but not stored"),
        }

        Ok(outcome)
    }

    pub fn latest(&self) -> Result<Option<SimulationRecord>, SimulationError> {
        Ok(self.repository.latest()?)
    }

    pub fn get(&self, id: &SimulationId) -> Result<SimulationRecord, SimulationError> {
        let record = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn stored_count(&self) -> Result<usize, SimulationError> {
        Ok(self.repository.count()?)
    }

    /// Formatted latest result, or guidance when nothing is stored yet.
    pub fn latest_message(&self) -> String {
        match self.repository.latest() {
            Ok(Some(record)) => self.formatter.format(&record.result),
            Ok(None) => self.formatter.no_results(),
            Err(err) => {
                warn!(%err, "latest simulation unavailable");
                self.formatter.storage_unavailable()
            }
        }
    }

    /// Answer each text message event through the relay.
    pub fn handle_webhook(&self, payload: &WebhookPayload) -> WebhookSummary {
        let mut summary = WebhookSummary::default();

        for event in &payload.events {
            let Some(text) = event.text() else {
                continue;
            };
            let Some(target) = event.target() else {
                debug!("text event without reply target skipped");
                continue;
            };

            let reply = match ChatIntent::classify(text) {
                ChatIntent::LatestResult => self.latest_message(),
                ChatIntent::Greeting => self.formatter.welcome(),
                ChatIntent::Other => self.formatter.usage_hint(),
            };

            match self.relay.deliver(&target, &reply) {
                Ok(()) => summary.replies += 1,
                Err(err) => {
                    warn!(%err, ?target, "chat reply not delivered");
                    summary.failures += 1;
                }
            }
        }

        summary
    }
}

fn fallbacks(rates: &ResolvedRates<'_>) -> Vec<&'static str> {
    let mut names = Vec::new();
    if rates.region.is_fallback() {
        names.push("region");
    }
    if rates.property.is_fallback() {
        names.push("propertyType");
    }
    if rates.regime.is_fallback() {
        names.push("minpakuLaw");
    }
    names
}
