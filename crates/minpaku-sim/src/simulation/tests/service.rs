use std::sync::Arc;

use serde_json::json;

use super::common::*;
use crate::simulation::domain::SimulationId;
use crate::simulation::error::{CalculationError, SimulationError, ValidationError};
use crate::simulation::format::{ResultFormatter, DEFAULT_SIGNATURE};
use crate::simulation::relay::DeliveryTarget;
use crate::simulation::repository::{RepositoryError, SimulationRepository};
use crate::simulation::service::SimulationService;
use crate::simulation::webhook::WebhookPayload;

fn payload(events: Vec<serde_json::Value>) -> WebhookPayload {
    serde_json::from_value(json!({ "events": events })).expect("payload deserializes")
}

#[test]
fn submit_stores_result_and_assigns_identifier() {
    let (service, repository, _) = build_service();

    let outcome = service
        .submit(&tokyo_rental_request())
        .expect("simulation succeeds");

    assert_eq!(
        outcome.simulation_id,
        Some(SimulationId("sim-000001".to_string()))
    );
    assert!(outcome.fallbacks.is_empty());
    assert_eq!(outcome.result.annual_revenue, 1_147_500);
    assert_eq!(repository.count().expect("count"), 1);

    let latest = service.latest().expect("latest").expect("record stored");
    assert_eq!(latest.simulation_id, SimulationId("sim-000001".to_string()));
    assert_eq!(latest.result, outcome.result);
}

#[test]
fn preview_does_not_touch_the_store() {
    let (service, repository, _) = build_service();

    let outcome = service
        .preview(&tokyo_rental_request())
        .expect("simulation succeeds");

    assert!(outcome.simulation_id.is_none());
    assert_eq!(repository.count().expect("count"), 0);
}

#[test]
fn capacity_above_the_property_maximum_is_rejected() {
    let (service, repository, _) = build_service();

    let err = service
        .submit(&request(json!({
            "region": "tokyo",
            "operationType": "rental",
            "propertyType": "1K",
            "capacity": 100,
            "minpakuLaw": "shinpo",
            "monthlyRent": 80000
        })))
        .expect_err("over capacity");

    match err {
        SimulationError::Validation(ValidationError::InvalidValue { field, reason }) => {
            assert_eq!(field, "capacity");
            assert!(reason.contains("at most 3"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(repository.count().expect("count"), 0);

    let unknown_type = service
        .preview(&request(json!({
            "region": "tokyo",
            "operationType": "rental",
            "propertyType": "castle",
            "capacity": 100,
            "minpakuLaw": "shinpo",
            "monthlyRent": 80000
        })))
        .expect("fallback property is priced, not rejected");
    assert_eq!(unknown_type.fallbacks, vec!["propertyType"]);
}

#[test]
fn latest_tracks_the_most_recent_submission() {
    let (service, _, _) = build_service();
    assert!(service.latest().expect("latest").is_none());

    service
        .submit(&tokyo_rental_request())
        .expect("first simulation");
    let second = service
        .submit(&request(json!({
            "region": "osaka",
            "operationType": "purchase",
            "propertyType": "2LDK",
            "area": 55,
            "capacity": 5,
            "minpakuLaw": "ryokan",
            "purchasePrice": 3000,
            "renovationCost": 200
        })))
        .expect("second simulation");

    let latest = service.latest().expect("latest").expect("record stored");
    assert_eq!(Some(latest.simulation_id.clone()), second.simulation_id);
    assert_eq!(latest.result.region, "大阪府");
    assert_eq!(latest.result.purchase_price, 30_000_000);
    assert_eq!(latest.result.renovation_cost, 2_000_000);
    assert_eq!(latest.result.total_investment, 32_000_000);
    assert_eq!(service.stored_count().expect("count"), 2);

    let first = service
        .get(&SimulationId("sim-000001".to_string()))
        .expect("first record");
    assert_eq!(first.result.region, "東京都");
}

#[test]
fn unknown_identifier_is_not_found() {
    let (service, _, _) = build_service();

    let err = service
        .get(&SimulationId("sim-424242".to_string()))
        .expect_err("nothing stored");
    assert!(matches!(
        err,
        SimulationError::Repository(RepositoryError::NotFound)
    ));
}

#[test]
fn validation_failures_are_not_stored() {
    let (service, repository, _) = build_service();

    let err = service
        .submit(&request(json!({
            "region": "tokyo",
            "operationType": "rental",
            "propertyType": "1K",
            "minpakuLaw": "shinpo",
            "monthlyRent": -5
        })))
        .expect_err("negative rent rejected");

    assert!(matches!(
        err,
        SimulationError::Validation(ValidationError::InvalidValue { .. })
    ));
    assert_eq!(repository.count().expect("count"), 0);
}

#[test]
fn non_numeric_amount_is_a_calculation_error() {
    let (service, repository, _) = build_service();

    let err = service
        .submit(&request(json!({
            "region": "tokyo",
            "operationType": "rental",
            "propertyType": "1K",
            "minpakuLaw": "shinpo",
            "monthlyRent": "abc"
        })))
        .expect_err("rent must be numeric");

    match err {
        SimulationError::Calculation(CalculationError::NonNumeric { field }) => {
            assert_eq!(field, "monthlyRent");
        }
        other => panic!("expected calculation error, got {other:?}"),
    }
    assert_eq!(repository.count().expect("count"), 0);
}

#[test]
fn persistence_failure_still_returns_the_projection() {
    let service = SimulationService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryRelay::default()),
    );

    let outcome = service
        .submit(&tokyo_rental_request())
        .expect("projection is still returned");

    assert!(outcome.simulation_id.is_none());
    assert_eq!(outcome.result.actual_operating_days, 135);

    let err = service.latest().expect_err("store offline");
    assert!(matches!(
        err,
        SimulationError::Repository(RepositoryError::Unavailable(_))
    ));
}

#[test]
fn unknown_lookups_are_reported_as_fallbacks() {
    let (service, _, _) = build_service();

    let outcome = service
        .submit(&request(json!({
            "region": "atlantis",
            "operationType": "rental",
            "propertyType": "castle",
            "minpakuLaw": "unknown-law",
            "monthlyRent": 50000
        })))
        .expect("defaults applied");

    assert_eq!(
        outcome.fallbacks,
        vec!["region", "propertyType", "minpakuLaw"]
    );
    assert_eq!(outcome.result.region, "その他地方");
    assert_eq!(outcome.result.daily_rate, 4000);
    assert_eq!(outcome.result.actual_operating_days, 146);
    assert!(outcome.simulation_id.is_some());
}

#[test]
fn outcome_serializes_with_identifier_and_camel_case_fields() {
    let (service, _, _) = build_service();
    let outcome = service
        .submit(&tokyo_rental_request())
        .expect("simulation succeeds");

    let body = serde_json::to_value(&outcome).expect("outcome serializes");
    assert_eq!(body["simulationId"], "sim-000001");
    assert_eq!(body["actualOperatingDays"], 135);
    assert_eq!(body["annualRevenue"], 1_147_500);
    assert_eq!(body["operationType"], "rental");
    assert!(body["paybackPeriod"].is_null());
    assert!(body.get("fallbacks").is_none());
}

#[test]
fn result_keyword_replies_with_latest_projection() {
    let (service, _, relay) = build_service();
    service
        .submit(&tokyo_rental_request())
        .expect("simulation succeeds");

    let summary = service.handle_webhook(&payload(vec![text_event("reply-1", "結果")]));

    assert_eq!(summary.replies, 1);
    assert_eq!(summary.failures, 0);
    let deliveries = relay.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(
        deliveries[0].0,
        DeliveryTarget::ReplyToken("reply-1".to_string())
    );
    assert!(deliveries[0].1.starts_with("🏠 民泊収益シミュレーション結果"));
    assert!(deliveries[0].1.contains("年間売上: ¥1,147,500"));
}

#[test]
fn result_keyword_without_results_sends_guidance() {
    let (service, _, relay) = build_service();
    let service = service.with_formatter(ResultFormatter::new(
        "https://sim.example.test",
        DEFAULT_SIGNATURE,
    ));

    service.handle_webhook(&payload(vec![text_event("reply-1", "kekka")]));

    let deliveries = relay.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert!(deliveries[0].1.starts_with("まだシミュレーション結果がありません。"));
    assert!(deliveries[0].1.ends_with("サイト: https://sim.example.test"));
}

#[test]
fn greetings_and_other_text_get_canned_replies() {
    let (service, _, relay) = build_service();

    let summary = service.handle_webhook(&payload(vec![
        text_event("reply-1", "こんにちは"),
        text_event("reply-2", "料金は？"),
        json!({ "type": "follow", "replyToken": "reply-3" }),
    ]));

    assert_eq!(summary.replies, 2);
    let deliveries = relay.deliveries();
    assert!(deliveries[0].1.starts_with("🏠 民泊収益シミュレーターへようこそ！"));
    assert!(deliveries[1].1.contains("「結果」と入力すると"));
}

#[test]
fn storage_outage_is_explained_to_the_chat_user() {
    let relay = Arc::new(MemoryRelay::default());
    let service = SimulationService::new(Arc::new(UnavailableRepository), relay.clone());

    let summary = service.handle_webhook(&payload(vec![text_event("reply-1", "結果")]));

    assert_eq!(summary.replies, 1);
    assert!(relay.deliveries()[0].1.contains("データベースエラーが発生しました。"));
}

#[test]
fn relay_failures_are_counted_not_raised() {
    let service = SimulationService::new(
        Arc::new(MemoryRepository::default()),
        Arc::new(FailingRelay),
    );

    let summary = service.handle_webhook(&payload(vec![
        text_event("reply-1", "結果"),
        text_event("reply-2", "ヘルプ"),
    ]));

    assert_eq!(summary.replies, 0);
    assert_eq!(summary.failures, 2);
}
