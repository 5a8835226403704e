use std::time::Duration;

use datascope_core::connector::{AuthToken, Credentials, DssConnector, ExtractionStatus};
use datascope_core::{
    DssError, ExtractEndpoint, IdentifierType, InstrumentList, ReportTemplateType, RequestBody,
    RequestBuilder,
};
use datascope_http::{CONTENT_TYPE_JSON, HttpConnector};
use httpmock::prelude::*;
use serde_json::json;

const ROOT: &str = "/RestApi/v1";

fn connector(server: &MockServer) -> HttpConnector {
    HttpConnector::builder()
        .base_url(server.url(format!("{ROOT}/")))
        .request_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn token() -> AuthToken {
    AuthToken::new("abc123")
}

fn composite() -> RequestBody {
    RequestBuilder::new(InstrumentList::single("IBM.N", IdentifierType::Ric, None))
        .fields(["RIC", "Close Price"])
        .composite()
        .into()
}

#[test]
fn advertises_every_capability() {
    let c = HttpConnector::new_raw().unwrap();
    assert_eq!(c.name(), "datascope-http");
    assert_eq!(c.key(), HttpConnector::KEY);
    assert!(c.as_auth_provider().is_some());
    assert!(c.as_user_provider().is_some());
    assert!(c.as_metadata_provider().is_some());
    assert!(c.as_validation_provider().is_some());
    assert!(c.as_extraction_provider().is_some());
    assert_eq!(
        c.base_url(),
        "https://hosted.datascopeapi.reuters.com/RestApi/v1"
    );
}

#[test]
fn builder_rejects_malformed_base_urls() {
    let bad = HttpConnector::builder().base_url("not a url").build();
    assert!(matches!(bad, Err(DssError::InvalidArg(_))));
    let ftp = HttpConnector::builder()
        .base_url("ftp://example.com/api")
        .build();
    assert!(matches!(ftp, Err(DssError::InvalidArg(_))));
    let ok = HttpConnector::builder()
        .base_url("http://localhost:8080/api/")
        .build()
        .unwrap();
    assert_eq!(ok.base_url(), "http://localhost:8080/api");
}

#[tokio::test]
async fn request_token_posts_credentials_envelope() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{ROOT}/Authentication/RequestToken"))
                .header("Prefer", "respond-async")
                .header("Content-Type", CONTENT_TYPE_JSON)
                .json_body(json!({
                    "Credentials": { "Username": "9009999", "Password": "pw" }
                }));
            then.status(200).json_body(json!({
                "@odata.context": "x",
                "value": "tok-1"
            }));
        })
        .await;

    let c = connector(&server);
    let t = c
        .as_auth_provider()
        .unwrap()
        .request_token(&Credentials::new("9009999", "pw"))
        .await
        .unwrap();
    m.assert_async().await;
    assert_eq!(t.value(), "tok-1");
    assert!(!t.is_expired());
}

#[tokio::test]
async fn request_token_failure_is_auth_error_with_vendor_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{ROOT}/Authentication/RequestToken"));
            then.status(400).json_body(json!({
                "error": { "message": "Invalid username or password" }
            }));
        })
        .await;
    let err = connector(&server)
        .as_auth_provider()
        .unwrap()
        .request_token(&Credentials::new("u", "bad"))
        .await
        .unwrap_err();
    assert_eq!(err, DssError::Auth("Invalid username or password".into()));
}

#[tokio::test]
async fn wait_preference_is_sent_when_configured() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("{ROOT}/Users/UserClaims"))
                .header("Prefer", "respond-async, wait=5")
                .header("Authorization", "Token abc123");
            then.status(200).json_body(json!({ "value": [{ "ClaimValue": "A" }] }));
        })
        .await;
    let c = HttpConnector::builder()
        .base_url(server.url(ROOT))
        .respond_async_wait(Some(5))
        .build()
        .unwrap();
    let claims = c
        .as_user_provider()
        .unwrap()
        .user_claims(&token())
        .await
        .unwrap();
    m.assert_async().await;
    assert_eq!(claims, vec![json!({ "ClaimValue": "A" })]);
}

#[tokio::test]
async fn preferences_use_unquoted_username() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("{ROOT}/Users/Users(9009999)/Preferences"));
            then.status(200).json_body(json!({ "UserId": 9_009_999 }));
        })
        .await;
    let prefs = connector(&server)
        .as_user_provider()
        .unwrap()
        .preferences(&token(), "9009999")
        .await
        .unwrap();
    m.assert_async().await;
    assert_eq!(prefs["UserId"], 9_009_999);
}

#[tokio::test]
async fn field_names_use_qualified_template_name() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path(format!(
                "{ROOT}/Extractions/GetValidExtractionFieldNames(ReportTemplateType=ThomsonReuters.Dss.Api.Extractions.ReportTemplates.ReportTemplateTypes'Composite')"
            ));
            then.status(200).json_body(json!({
                "value": [
                    { "Code": "CO.1", "Name": "RIC", "Description": "Reuters code", "FieldGroup": "Ids" },
                    { "Name": "Close Price" }
                ]
            }));
        })
        .await;
    let fields = connector(&server)
        .as_metadata_provider()
        .unwrap()
        .valid_field_names(&token(), ReportTemplateType::Composite)
        .await
        .unwrap();
    m.assert_async().await;
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].code, "CO.1");
    assert_eq!(fields[1].name, "Close Price");
    assert_eq!(fields[1].field_group, "");
}

#[tokio::test]
async fn bond_schedule_types_without_value_array_is_data_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!(
                "{ROOT}/Extractions/BondScheduleReportTemplateGetBondScheduleTypes"
            ));
            then.status(200).json_body(json!({ "unexpected": true }));
        })
        .await;
    let err = connector(&server)
        .as_metadata_provider()
        .unwrap()
        .bond_schedule_types(&token())
        .await
        .unwrap_err();
    assert!(matches!(err, DssError::Data(_)));
}

#[tokio::test]
async fn validation_sends_keep_duplicates_as_string() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{ROOT}/Extractions/InstrumentListValidateIdentifiers"))
                .json_body(json!({
                    "InputsForValidation": [
                        { "Identifier": "IBM.N", "IdentifierType": "Ric" }
                    ],
                    "KeepDuplicates": "true"
                }));
            then.status(200).json_body(json!({
                "ValidatedInstruments": [
                    { "Identifier": "IBM.N", "IdentifierType": "Ric", "Status": "Valid", "Key": "k" }
                ],
                "ValidationResult": { "ValidInstrumentCount": 1 }
            }));
        })
        .await;
    let resp = connector(&server)
        .as_validation_provider()
        .unwrap()
        .validate_identifiers(
            &token(),
            &InstrumentList::single("IBM.N", IdentifierType::Ric, None),
            true,
        )
        .await
        .unwrap();
    m.assert_async().await;
    assert_eq!(resp.validation_result.valid_instrument_count, 1);
    assert_eq!(resp.valid_instruments().len(), 1);
    assert_eq!(resp.validated_instruments[0].extra["Key"], "k");
}

#[tokio::test]
async fn submit_200_is_completed() {
    let server = MockServer::start_async().await;
    let body = composite();
    let expected = body.to_value().unwrap();
    let m = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{ROOT}/Extractions/ExtractWithNotes"))
                .header("Authorization", "Token abc123")
                .json_body(expected);
            then.status(200).json_body(json!({ "Contents": [], "Notes": ["ok"] }));
        })
        .await;
    let status = connector(&server)
        .as_extraction_provider()
        .unwrap()
        .submit(&token(), &body, ExtractEndpoint::WithNotes)
        .await
        .unwrap();
    m.assert_async().await;
    assert_eq!(
        status,
        ExtractionStatus::Completed(json!({ "Contents": [], "Notes": ["ok"] }))
    );
}

#[tokio::test]
async fn submit_202_then_poll_location() {
    let server = MockServer::start_async().await;
    let monitor = server.url(format!("{ROOT}/monitor/42"));
    let submit = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{ROOT}/Extractions/Extract"));
            then.status(202)
                .header("Location", monitor.as_str())
                .header("Status", "InProgress");
        })
        .await;
    let poll = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("{ROOT}/monitor/42"))
                .header("Authorization", "Token abc123");
            then.status(200).json_body(json!({ "value": [{ "RIC": "IBM.N" }] }));
        })
        .await;

    let c = connector(&server);
    let x = c.as_extraction_provider().unwrap();
    let status = x
        .submit(&token(), &composite(), ExtractEndpoint::Plain)
        .await
        .unwrap();
    assert_eq!(
        status,
        ExtractionStatus::InProgress {
            location: Some(monitor.clone()),
            progress: Some("InProgress".into()),
        }
    );
    let done = x.poll(&token(), &monitor).await.unwrap();
    submit.assert_async().await;
    poll.assert_async().await;
    assert_eq!(
        done,
        ExtractionStatus::Completed(json!({ "value": [{ "RIC": "IBM.N" }] }))
    );
}

#[tokio::test]
async fn submit_202_without_location_is_data_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{ROOT}/Extractions/ExtractWithNotes"));
            then.status(202);
        })
        .await;
    let err = connector(&server)
        .as_extraction_provider()
        .unwrap()
        .submit(&token(), &composite(), ExtractEndpoint::WithNotes)
        .await
        .unwrap_err();
    assert!(matches!(err, DssError::Data(_)));
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{ROOT}/monitor/401"));
            then.status(401)
                .json_body(json!({ "error": { "message": "Authorization has been denied" } }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{ROOT}/monitor/404"));
            then.status(404);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{ROOT}/monitor/500"));
            then.status(500)
                .json_body(json!({ "error": { "message": "boom" } }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{ROOT}/monitor/503"));
            then.status(503).body("Service Unavailable");
        })
        .await;

    let c = connector(&server);
    let x = c.as_extraction_provider().unwrap();
    let t = token();

    let e401 = x.poll(&t, "monitor/401").await.unwrap_err();
    assert_eq!(e401, DssError::Auth("Authorization has been denied".into()));

    let e404 = x.poll(&t, "monitor/404").await.unwrap_err();
    assert!(matches!(e404, DssError::NotFound { .. }));

    let e500 = x.poll(&t, "monitor/500").await.unwrap_err();
    assert_eq!(e500, DssError::http(500, "boom"));
    assert!(e500.is_retryable());

    let e503 = x.poll(&t, "monitor/503").await.unwrap_err();
    assert_eq!(e503, DssError::http(503, "Service Unavailable"));
}

#[tokio::test]
async fn layered_connector_caches_field_names() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path(format!(
                "{ROOT}/Extractions/GetValidExtractionFieldNames(ReportTemplateType=ThomsonReuters.Dss.Api.Extractions.ReportTemplates.ReportTemplateTypes'Ratings')"
            ));
            then.status(200)
                .json_body(json!({ "value": [{ "Name": "Rating" }] }));
        })
        .await;
    let cfg = datascope_core::DssConfig {
        base_url: server.url(ROOT),
        ..datascope_core::DssConfig::default()
    };
    let conn = HttpConnector::layered(&cfg).unwrap().build();
    let md = conn.as_metadata_provider().unwrap();
    for _ in 0..3 {
        let f = md
            .valid_field_names(&token(), ReportTemplateType::Ratings)
            .await
            .unwrap();
        assert_eq!(f[0].name, "Rating");
    }
    m.assert_hits_async(1).await;
}
