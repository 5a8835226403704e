use std::time::Duration;

use datascope_core::connector::AuthToken;
use datascope_core::{DssError, FieldDescriptor, ReportTemplateType};
use datascope_middleware::{CacheConfig, ConnectorBuilder};
use datascope_mock::{DynamicMockConnector, MockBehavior, MockCall};
use serde_json::json;

fn field(name: &str) -> FieldDescriptor {
    FieldDescriptor {
        code: String::new(),
        name: name.to_string(),
        description: String::new(),
        field_group: String::new(),
    }
}

fn field_lookups(c: &MockCall) -> bool {
    matches!(c, MockCall::ValidFieldNames(_))
}

#[tokio::test]
async fn field_names_are_served_from_cache_per_template() {
    let (raw, controller) = DynamicMockConnector::new_with_controller("P0");
    controller
        .set_fields_behavior(
            ReportTemplateType::Composite,
            MockBehavior::Return(vec![field("RIC")]),
        )
        .await;
    controller
        .set_fields_behavior(
            ReportTemplateType::PriceHistory,
            MockBehavior::Return(vec![field("Trade Date")]),
        )
        .await;
    let conn = ConnectorBuilder::new(raw)
        .with_cache(&CacheConfig::default())
        .build();
    let md = conn.as_metadata_provider().unwrap();
    let t = AuthToken::new("t");

    for _ in 0..3 {
        let f = md
            .valid_field_names(&t, ReportTemplateType::Composite)
            .await
            .unwrap();
        assert_eq!(f, vec![field("RIC")]);
    }
    let ph = md
        .valid_field_names(&t, ReportTemplateType::PriceHistory)
        .await
        .unwrap();
    assert_eq!(ph, vec![field("Trade Date")]);

    assert_eq!(controller.count_calls(field_lookups).await, 2);
}

#[tokio::test]
async fn errors_are_not_cached() {
    let (raw, controller) = DynamicMockConnector::new_with_controller("P0");
    controller
        .set_fields_behavior(
            ReportTemplateType::Ratings,
            MockBehavior::Fail(DssError::http(500, "busy")),
        )
        .await;
    let conn = ConnectorBuilder::new(raw)
        .with_cache(&CacheConfig::default())
        .build();
    let md = conn.as_metadata_provider().unwrap();
    let t = AuthToken::new("t");

    assert!(md.valid_field_names(&t, ReportTemplateType::Ratings).await.is_err());
    controller
        .set_fields_behavior(
            ReportTemplateType::Ratings,
            MockBehavior::Return(vec![field("Rating")]),
        )
        .await;
    let ok = md
        .valid_field_names(&t, ReportTemplateType::Ratings)
        .await
        .unwrap();
    assert_eq!(ok, vec![field("Rating")]);
    assert_eq!(controller.count_calls(field_lookups).await, 2);
}

#[tokio::test]
async fn zero_ttl_disables_the_cache() {
    let (raw, controller) = DynamicMockConnector::new_with_controller("P0");
    controller
        .set_bond_types_behavior(MockBehavior::Return(vec![json!({ "Code": "CALL" })]))
        .await;
    let conn = ConnectorBuilder::new(raw)
        .with_cache(&CacheConfig {
            ttl: Duration::ZERO,
            max_entries: 10,
        })
        .build();
    let md = conn.as_metadata_provider().unwrap();
    let t = AuthToken::new("t");
    md.bond_schedule_types(&t).await.unwrap();
    md.bond_schedule_types(&t).await.unwrap();
    let n = controller
        .count_calls(|c| matches!(c, MockCall::BondScheduleTypes))
        .await;
    assert_eq!(n, 2);
}

#[tokio::test]
async fn bond_schedule_types_are_cached() {
    let (raw, controller) = DynamicMockConnector::new_with_controller("P0");
    controller
        .set_bond_types_behavior(MockBehavior::Return(vec![json!({ "Code": "PUT" })]))
        .await;
    let conn = ConnectorBuilder::new(raw)
        .with_cache(&CacheConfig::default())
        .build();
    let md = conn.as_metadata_provider().unwrap();
    let t = AuthToken::new("t");
    let a = md.bond_schedule_types(&t).await.unwrap();
    let b = md.bond_schedule_types(&t).await.unwrap();
    assert_eq!(a, b);
    let n = controller
        .count_calls(|c| matches!(c, MockCall::BondScheduleTypes))
        .await;
    assert_eq!(n, 1);
}

#[tokio::test]
async fn other_capabilities_pass_through() {
    let (raw, controller) = DynamicMockConnector::new_with_controller("P0");
    controller
        .set_claims_behavior(MockBehavior::Return(vec![json!({ "ClaimValue": "X" })]))
        .await;
    let conn = ConnectorBuilder::new(raw)
        .with_cache(&CacheConfig::default())
        .build();
    assert_eq!(conn.name(), "P0");
    assert!(conn.as_extraction_provider().is_some());
    let t = AuthToken::new("t");
    let claims = conn.as_user_provider().unwrap().user_claims(&t).await.unwrap();
    assert_eq!(claims.len(), 1);
    let claims_again = conn.as_user_provider().unwrap().user_claims(&t).await.unwrap();
    assert_eq!(claims_again.len(), 1);
    assert_eq!(
        controller
            .count_calls(|c| matches!(c, MockCall::UserClaims))
            .await,
        2
    );
}
