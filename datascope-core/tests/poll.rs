use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use datascope_core::{
    AuthToken, DssError, ExtractEndpoint, ExtractionProvider, ExtractionStatus, PollConfig,
    RequestBody, await_completion,
};
use serde_json::{Value, json};

/// Answers polls from a script and records the URLs it was asked for.
struct Scripted {
    replies: Mutex<VecDeque<Result<ExtractionStatus, DssError>>>,
    polled: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(replies: Vec<Result<ExtractionStatus, DssError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            polled: Mutex::new(Vec::new()),
        }
    }

    fn polled(&self) -> Vec<String> {
        self.polled.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtractionProvider for Scripted {
    async fn submit(
        &self,
        _token: &AuthToken,
        _body: &RequestBody,
        _endpoint: ExtractEndpoint,
    ) -> Result<ExtractionStatus, DssError> {
        unreachable!("the poll loop never submits")
    }

    async fn poll(&self, _token: &AuthToken, location: &str) -> Result<ExtractionStatus, DssError> {
        self.polled.lock().unwrap().push(location.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(pending(None)))
    }
}

fn pending(location: Option<&str>) -> ExtractionStatus {
    ExtractionStatus::InProgress {
        location: location.map(str::to_string),
        progress: Some("InProgress".into()),
    }
}

fn done() -> Value {
    json!({"Contents": [], "Notes": ["ok"]})
}

fn token() -> AuthToken {
    AuthToken::new("tok")
}

#[tokio::test(start_paused = true)]
async fn completed_submission_returns_without_polling() {
    let p = Scripted::new(vec![]);
    let body = await_completion(
        &p,
        &token(),
        ExtractionStatus::Completed(done()),
        &PollConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(body, done());
    assert!(p.polled().is_empty());
}

#[tokio::test(start_paused = true)]
async fn polls_at_fixed_interval_until_done() {
    let p = Scripted::new(vec![
        Ok(pending(None)),
        Ok(pending(None)),
        Ok(ExtractionStatus::Completed(done())),
    ]);
    let start = tokio::time::Instant::now();
    let body = await_completion(&p, &token(), pending(Some("loc-1")), &PollConfig::default())
        .await
        .unwrap();
    assert_eq!(body, done());
    assert_eq!(p.polled(), vec!["loc-1", "loc-1", "loc-1"]);
    assert_eq!(start.elapsed(), Duration::from_secs(90));
}

#[tokio::test(start_paused = true)]
async fn later_location_replaces_earlier_one() {
    let p = Scripted::new(vec![
        Ok(pending(Some("loc-2"))),
        Ok(pending(None)),
        Ok(ExtractionStatus::Completed(done())),
    ]);
    await_completion(&p, &token(), pending(Some("loc-1")), &PollConfig::default())
        .await
        .unwrap();
    assert_eq!(p.polled(), vec!["loc-1", "loc-2", "loc-2"]);
}

#[tokio::test(start_paused = true)]
async fn accepted_without_location_is_data_error() {
    let p = Scripted::new(vec![]);
    let err = await_completion(&p, &token(), pending(None), &PollConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DssError::Data(_)));
}

#[tokio::test(start_paused = true)]
async fn provider_errors_end_the_loop() {
    let p = Scripted::new(vec![
        Ok(pending(None)),
        Err(DssError::http(500, "boom")),
        Ok(ExtractionStatus::Completed(done())),
    ]);
    let err = await_completion(&p, &token(), pending(Some("loc")), &PollConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err, DssError::http(500, "boom"));
    assert_eq!(p.polled().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn attempt_ceiling() {
    let p = Scripted::new(vec![]);
    let cfg = PollConfig {
        interval: Duration::from_secs(5),
        max_attempts: Some(3),
        timeout: None,
    };
    let err = await_completion(&p, &token(), pending(Some("loc")), &cfg)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DssError::PollExhausted {
            location: "loc".into(),
            attempts: 3
        }
    );
    assert_eq!(p.polled().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn deadline_stops_before_the_next_sleep() {
    let p = Scripted::new(vec![]);
    let cfg = PollConfig {
        interval: Duration::from_secs(30),
        max_attempts: None,
        timeout: Some(Duration::from_secs(100)),
    };
    let start = tokio::time::Instant::now();
    let err = await_completion(&p, &token(), pending(Some("loc")), &cfg)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DssError::PollTimeout {
            location: "loc".into()
        }
    );
    assert_eq!(p.polled().len(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(90));
}
