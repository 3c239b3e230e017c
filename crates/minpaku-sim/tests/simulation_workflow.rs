use std::io::Cursor;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use minpaku_sim::simulation::{
    simulation_router, DeliveryTarget, MessageRelay, PaybackPeriod, RateTable, RelayError,
    ResultFormatter, SimulationRequest, SimulationService, SqliteSimulationRepository,
};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Default)]
struct RecordingRelay {
    sent: Mutex<Vec<(DeliveryTarget, String)>>,
}

impl RecordingRelay {
    fn sent(&self) -> Vec<(DeliveryTarget, String)> {
        self.sent.lock().expect("relay mutex poisoned").clone()
    }
}

impl MessageRelay for RecordingRelay {
    fn deliver(&self, target: &DeliveryTarget, text: &str) -> Result<(), RelayError> {
        self.sent
            .lock()
            .expect("relay mutex poisoned")
            .push((target.clone(), text.to_string()));
        Ok(())
    }
}

fn sqlite_service() -> (
    SimulationService<SqliteSimulationRepository, RecordingRelay>,
    Arc<RecordingRelay>,
) {
    let repository =
        Arc::new(SqliteSimulationRepository::in_memory().expect("in-memory database opens"));
    let relay = Arc::new(RecordingRelay::default());
    let service = SimulationService::new(repository, relay.clone());
    (service, relay)
}

fn request(value: Value) -> SimulationRequest {
    serde_json::from_value(value).expect("request deserializes")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is json")
}

#[test]
fn lease_sublet_without_investment_reports_zero_roi() {
    let (service, _) = sqlite_service();

    let outcome = service
        .submit(&request(json!({
            "region": "東京都",
            "operationType": "転貸",
            "propertyType": "1LDK",
            "area": "40",
            "capacity": "4",
            "minpakuLaw": "民泊新法対応",
            "monthlyRent": "100000",
            "renovationCost": "",
            "initialCosts": {}
        })))
        .expect("simulation succeeds");

    let result = &outcome.result;
    assert_eq!(result.actual_operating_days, 135);
    assert_eq!(result.annual_revenue, 1_147_500);
    assert_eq!(result.total_investment, 0);
    assert_eq!(result.roi, 0.0);
    assert!(outcome.fallbacks.is_empty());
    assert_eq!(
        outcome.simulation_id.as_ref().map(ToString::to_string),
        Some("sim-000001".to_string())
    );
}

#[test]
fn purchase_payback_uses_overridden_region_rates() {
    let overrides = "key,name,nightly_rate,occupancy_percent,expense_percent\n\
                     testshire,テスト県,3125,22,\n";
    let rates = RateTable::standard()
        .with_region_overrides_from_reader(Cursor::new(overrides))
        .expect("overrides load");
    let (service, _) = sqlite_service();
    let service = service.with_rates(rates);

    let outcome = service
        .submit(&request(json!({
            "region": "testshire",
            "operationType": "purchase",
            "propertyType": "戸建て",
            "area": 90,
            "capacity": 6,
            "minpakuLaw": "ryokan",
            "purchasePrice": 500,
            "renovationCost": 0
        })))
        .expect("simulation succeeds");

    let result = &outcome.result;
    assert_eq!(result.actual_operating_days, 80);
    assert_eq!(result.annual_profit, 250_000);
    assert_eq!(result.total_investment, 5_000_000);
    assert_eq!(result.payback_period, PaybackPeriod::Years(20.0));
    assert_eq!(result.region, "テスト県");
}

#[test]
fn chat_result_request_relays_the_stored_projection() {
    let (service, relay) = sqlite_service();
    let service = service.with_formatter(ResultFormatter::new(
        "https://sim.example.test",
        "お問い合わせはサイトから",
    ));

    service
        .submit(&request(json!({
            "region": "kyoto",
            "operationType": "rental",
            "propertyType": "2LDK",
            "area": 60,
            "capacity": 6,
            "minpakuLaw": "tokku",
            "monthlyRent": 150000,
            "initialCosts": { "deposit": 300000 }
        })))
        .expect("simulation succeeds");

    let payload = serde_json::from_value(json!({
        "events": [{
            "type": "message",
            "source": { "type": "user", "userId": "U-owner" },
            "message": { "type": "text", "id": "1", "text": "最新結果" }
        }]
    }))
    .expect("payload deserializes");
    let summary = service.handle_webhook(&payload);

    assert_eq!(summary.replies, 1);
    let sent = relay.sent();
    assert_eq!(sent[0].0, DeliveryTarget::User("U-owner".to_string()));
    let message = &sent[0].1;
    assert!(message.contains("地域: 京都府\n"));
    assert!(message.contains("年間稼働日数: 248日\n"));
    assert!(message.contains("総投資額: ¥300,000\n"));
    assert!(message.ends_with("お問い合わせはサイトから"));
}

#[tokio::test]
async fn http_round_trip_persists_and_serves_results() {
    let (service, _) = sqlite_service();
    let router = simulation_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/simulation")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "region": "okinawa",
                        "operationType": "purchase",
                        "propertyType": "3LDK",
                        "area": 80,
                        "customArea": 85,
                        "capacity": 8,
                        "minpakuLaw": "shinpo",
                        "purchasePrice": 2500,
                        "renovationCost": 300
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let created = json_body(response).await;
    assert_eq!(created["area"], 85);
    assert_eq!(created["totalInvestment"], 28_000_000);

    let id = created["simulationId"].as_str().expect("id assigned").to_string();
    let fetched = router
        .oneshot(
            Request::get(format!("/api/results/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(fetched.status(), StatusCode::OK);
    let fetched = json_body(fetched).await;
    assert_eq!(fetched["simulationId"], id.as_str());
    assert_eq!(fetched["annualRevenue"], created["annualRevenue"]);
    assert_eq!(fetched["paybackPeriod"], created["paybackPeriod"]);
}
