use std::sync::Arc;
use std::time::Duration;

use datascope_core::connector::{AuthToken, DssConnector, ExtractionStatus};
use datascope_core::{
    DssError, ExtractEndpoint, IdentifierType, InstrumentList, RequestBody, RequestBuilder,
};
use datascope_middleware::{ConnectorBuilder, QuotaConfig, QuotaConnector};
use datascope_mock::{DynamicMockConnector, MockBehavior, MockCall, MockConnector, MockController};
use serde_json::json;

fn body() -> RequestBody {
    RequestBuilder::new(InstrumentList::single("IBM.N", IdentifierType::Ric, None))
        .fields(["RIC"])
        .composite()
        .into()
}

async fn scripted(n: usize) -> (Arc<dyn DssConnector>, MockController) {
    let (raw, controller) = DynamicMockConnector::new_with_controller("P0");
    for _ in 0..n {
        controller
            .push_submit(MockBehavior::Return(ExtractionStatus::Completed(
                json!({ "Contents": [] }),
            )))
            .await;
    }
    (raw, controller)
}

#[tokio::test(start_paused = true)]
async fn submissions_beyond_limit_are_refused_without_calling_vendor() {
    let (raw, controller) = scripted(5).await;
    let conn = ConnectorBuilder::new(raw)
        .with_quota(&QuotaConfig {
            limit: 2,
            window: Duration::from_secs(60),
        })
        .build();
    let x = conn.as_extraction_provider().unwrap();
    let t = AuthToken::new("t");

    x.submit(&t, &body(), ExtractEndpoint::WithNotes).await.unwrap();
    x.submit(&t, &body(), ExtractEndpoint::WithNotes).await.unwrap();
    let err = x
        .submit(&t, &body(), ExtractEndpoint::WithNotes)
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    match err {
        DssError::QuotaExceeded {
            remaining,
            reset_in_ms,
        } => {
            assert_eq!(remaining, 0);
            assert!(reset_in_ms <= 60_000);
        }
        other => panic!("expected QuotaExceeded, got {other:?}"),
    }
    let submits = controller
        .count_calls(|c| matches!(c, MockCall::Submit { .. }))
        .await;
    assert_eq!(submits, 2);
}

#[tokio::test(start_paused = true)]
async fn window_resets_after_elapsing() {
    let (raw, _controller) = scripted(3).await;
    let conn = ConnectorBuilder::new(raw)
        .with_quota(&QuotaConfig {
            limit: 1,
            window: Duration::from_secs(10),
        })
        .build();
    let x = conn.as_extraction_provider().unwrap();
    let t = AuthToken::new("t");

    x.submit(&t, &body(), ExtractEndpoint::Plain).await.unwrap();
    assert!(x.submit(&t, &body(), ExtractEndpoint::Plain).await.is_err());
    tokio::time::advance(Duration::from_secs(11)).await;
    x.submit(&t, &body(), ExtractEndpoint::Plain).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn polls_do_not_consume_budget() {
    let raw: Arc<dyn DssConnector> = Arc::new(MockConnector::with_polls(3));
    let quota = QuotaConnector::new(
        raw,
        &QuotaConfig {
            limit: 1,
            window: Duration::from_secs(3600),
        },
    );
    let x = quota.as_extraction_provider().unwrap();
    let t = AuthToken::new("t");
    let ExtractionStatus::InProgress {
        location: Some(loc),
        ..
    } = x.submit(&t, &body(), ExtractEndpoint::WithNotes).await.unwrap()
    else {
        panic!("expected a pending extraction");
    };
    for _ in 0..3 {
        x.poll(&t, &loc).await.unwrap();
    }
    let state = quota.quota_state();
    assert_eq!(state.limit, 1);
    assert_eq!(state.remaining, 0);
    assert!(state.reset_in <= Duration::from_secs(3600));
}

#[tokio::test]
async fn quota_state_reports_remaining_budget() {
    let raw: Arc<dyn DssConnector> = Arc::new(MockConnector::with_polls(0));
    let quota = QuotaConnector::new(
        raw,
        &QuotaConfig {
            limit: 3,
            window: Duration::from_secs(60),
        },
    );
    assert_eq!(quota.quota_state().remaining, 3);
    quota.should_allow_call().unwrap();
    assert_eq!(quota.quota_state().remaining, 2);
}
