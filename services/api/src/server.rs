use crate::cli::ServeArgs;
use crate::infra::{AppState, ConfiguredRepository, LoggingRelay};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use minpaku_sim::config::AppConfig;
use minpaku_sim::error::AppError;
use minpaku_sim::simulation::{RateTable, ResultFormatter, SimulationService};
use minpaku_sim::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Standard rates with the configured CSV overrides applied.
pub(crate) fn load_rate_table(config: &AppConfig) -> Result<RateTable, AppError> {
    let table = RateTable::standard();
    match &config.rate_table_path {
        Some(path) => {
            info!(path = %path.display(), "applying region rate overrides");
            Ok(table.with_region_overrides_from_path(path)?)
        }
        None => Ok(table),
    }
}

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let store = Arc::new(ConfiguredRepository::from_config(&config.storage)?);
    let rates = load_rate_table(&config)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        store: store.clone(),
        started_at: Utc::now(),
    };

    let simulation_service = Arc::new(
        SimulationService::new(store.clone(), Arc::new(LoggingRelay))
            .with_rates(rates)
            .with_projection(config.projection.clone())
            .with_formatter(ResultFormatter::new(
                config.messaging.site_url.clone(),
                config.messaging.signature.clone(),
            )),
    );

    let app = with_operational_routes(simulation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        store = store.backend(),
        "minpaku simulator ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
