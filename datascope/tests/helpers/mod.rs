#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use datascope::{DssConnector, Session};
use datascope_mock::MockConnector;

pub const INSTRUMENTS_CSV: &str = "RIC,IBM.N\nISN,US0378331005,Apple\nRIC,BADX\n";

/// Session over a fixture connector that completes after `polls` polls.
pub async fn mock_session(polls: u32) -> Session {
    session_over(Arc::new(MockConnector::with_polls(polls))).await
}

pub async fn session_over(connector: Arc<dyn DssConnector>) -> Session {
    Session::builder()
        .with_connector(connector)
        .credentials("9009999", "secret")
        .poll_interval(Duration::from_secs(5))
        .build()
        .await
        .expect("mock session")
}

/// Write `contents` to a fresh temp file and keep it alive with the handle.
pub fn csv_file(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}
