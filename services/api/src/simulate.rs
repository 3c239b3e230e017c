use crate::infra::{InMemorySimulationRepository, LoggingRelay};
use crate::server::load_rate_table;
use clap::Args;
use minpaku_sim::config::AppConfig;
use minpaku_sim::error::AppError;
use minpaku_sim::simulation::{
    ResultFormatter, SimulationOutcome, SimulationRequest, SimulationService,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct SimulateArgs {
    /// Region key or display name (e.g. tokyo, 東京都)
    #[arg(long)]
    pub(crate) region: String,
    /// rental (lease-sublet) or purchase
    #[arg(long)]
    pub(crate) operation_type: String,
    /// Floor plan key (1K, 1DK, 1LDK, 2LDK, 3LDK, 戸建て)
    #[arg(long)]
    pub(crate) property_type: String,
    /// Legal regime key or display name (shinpo, ryokan, tokku)
    #[arg(long)]
    pub(crate) law: String,
    /// Floor area in square meters
    #[arg(long)]
    pub(crate) area: Option<u32>,
    /// Maximum number of guests (defaults to 1)
    #[arg(long)]
    pub(crate) capacity: Option<u32>,
    /// Monthly rent in yen (rental only)
    #[arg(long)]
    pub(crate) monthly_rent: Option<i64>,
    /// Purchase price in units of 10,000 yen (purchase only)
    #[arg(long)]
    pub(crate) purchase_price: Option<i64>,
    /// Renovation cost in units of 10,000 yen
    #[arg(long)]
    pub(crate) renovation_cost: Option<i64>,
    /// One-time rental cost as label=yen; repeatable
    #[arg(long = "initial-cost", value_parser = parse_initial_cost)]
    pub(crate) initial_costs: Vec<(String, i64)>,
    /// Print the output record as JSON instead of the chat message
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn parse_initial_cost(raw: &str) -> Result<(String, i64), String> {
    let (label, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected label=yen, got '{raw}'"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(format!("initial cost '{raw}' has an empty label"));
    }
    let amount = amount
        .trim()
        .parse::<i64>()
        .map_err(|err| format!("initial cost '{raw}' is not a whole yen amount ({err})"))?;
    Ok((label.to_string(), amount))
}

impl SimulateArgs {
    pub(crate) fn to_request(&self) -> SimulationRequest {
        let initial_costs: Map<String, Value> = self
            .initial_costs
            .iter()
            .map(|(label, amount)| (label.clone(), json!(amount)))
            .collect();

        SimulationRequest {
            region: Some(json!(self.region)),
            operation_type: Some(json!(self.operation_type)),
            property_type: Some(json!(self.property_type)),
            area: self.area.map(|value| json!(value)),
            custom_area: None,
            capacity: self.capacity.map(|value| json!(value)),
            minpaku_law: Some(json!(self.law)),
            monthly_rent: self.monthly_rent.map(|value| json!(value)),
            purchase_price: self.purchase_price.map(|value| json!(value)),
            renovation_cost: self.renovation_cost.map(|value| json!(value)),
            initial_costs: Some(Value::Object(initial_costs)),
        }
    }
}

pub(crate) fn run_simulation(args: SimulateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let rates = load_rate_table(&config)?;
    let formatter = ResultFormatter::new(
        config.messaging.site_url.clone(),
        config.messaging.signature.clone(),
    );

    let service = SimulationService::new(
        Arc::new(InMemorySimulationRepository::default()),
        Arc::new(LoggingRelay),
    )
    .with_rates(rates)
    .with_projection(config.projection.clone())
    .with_formatter(formatter);

    let outcome = service.preview(&args.to_request())?;
    println!("{}", render(&service, &outcome, args.json)?);
    Ok(())
}

fn render(
    service: &SimulationService<InMemorySimulationRepository, LoggingRelay>,
    outcome: &SimulationOutcome,
    as_json: bool,
) -> Result<String, AppError> {
    if as_json {
        return serde_json::to_string_pretty(outcome).map_err(|err| AppError::Io(err.into()));
    }

    let mut text = String::new();
    for name in &outcome.fallbacks {
        text.push_str(&format!("note: unknown {name}, default rates applied\n"));
    }
    text.push_str(&service.formatter().format(&outcome.result));
    Ok(text)
}
