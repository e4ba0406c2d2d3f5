//! End-to-end tests for the acquisition engine against a mocked court portal.
//!
//! Every test starts its own wiremock server and its own client, so rate
//! limits and caches never leak between tests.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::Instant;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use court_records::*;

const CASE_MINIMAL: &str = include_str!("fixtures/case_minimal.html");
const CASE_FULL: &str = include_str!("fixtures/case_full.html");
const NO_RESULTS: &str = include_str!("fixtures/no_results.html");
const PARTY_RESULTS: &str = include_str!("fixtures/party_results.html");

// ─────────────────────── helpers ───────────────────────

fn config_for(server: &MockServer) -> EngineConfig {
    EngineConfig {
        base_url: server.uri(),
        request_timeout_ms: 2_000,
        ..EngineConfig::default()
    }
}

fn client_for(server: &MockServer) -> CourtRecordsClient {
    CourtRecordsClient::new(config_for(server)).expect("valid test config")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

fn detail_page(number: &str) -> String {
    format!(
        "<html><body><div>Case Number: {number}</div>\
         <div>Case Title: Doe v. Roe</div><div>Status: Active</div></body></html>"
    )
}

/// Serve `number`'s detail page on the case-index endpoint.
async fn mount_case(server: &MockServer, number: &str) {
    Mock::given(method("GET"))
        .and(path("/CaseIndex/Search"))
        .and(query_param("caseNumber", number))
        .respond_with(html(&detail_page(number)))
        .mount(server)
        .await;
}

// ─────────────────────── case-number lookups ───────────────────────

#[tokio::test]
async fn test_case_number_lookup_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CaseIndex/Search"))
        .and(query_param("caseNumber", "22FL001581C"))
        .respond_with(html(CASE_MINIMAL))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = client
        .search_cases("22FL001581C", QueryKind::CaseNumber, None)
        .await
        .expect("lookup should succeed")
        .found()
        .expect("case should be found");

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.case_number, "22FL001581C");
    assert_eq!(record.parties, vec!["Smith", "Jones"]);
    assert_eq!(record.department, "702");
    assert_eq!(record.date_filed, NaiveDate::from_ymd_opt(2022, 2, 10));
    assert_eq!(record.judge, UNKNOWN);
    assert_eq!(record.last_activity, record.date_filed);
    assert_eq!(record.source, "case_index");
}

#[tokio::test]
async fn test_full_register_of_actions_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CaseIndex/Search"))
        .respond_with(html(CASE_FULL))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let record = client
        .get_case_details("22-fl-001581c", None)
        .await
        .unwrap()
        .found()
        .unwrap();

    assert_eq!(record.case_type, "Family Law - Dissolution");
    assert_eq!(record.status, "Active");
    assert_eq!(record.judge, "Hon. C. Park");
    assert_eq!(record.parties, vec!["Anna Smith", "Mark Jones"]);

    let actions: Vec<_> = record
        .register_of_actions
        .iter()
        .map(|a| a.action.as_str())
        .collect();
    assert_eq!(actions, vec!["Petition Filed", "Response"]);

    let events: Vec<_> = record
        .upcoming_events
        .iter()
        .map(|e| e.event_type.as_str())
        .collect();
    assert_eq!(events, vec!["RFO Hearing", "Status Conference"]);
    assert_eq!(record.upcoming_events[0].time, "8:30 AM");

    assert_eq!(record.last_activity, NaiveDate::from_ymd_opt(2022, 9, 20));
    assert_eq!(
        record.upgrade_options,
        Some(UpgradeOptions {
            withheld: vec!["document images".to_string()]
        })
    );
}

#[tokio::test]
async fn test_unknown_case_number_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(NO_RESULTS))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .search_cases("99ZZ999999Z", QueryKind::CaseNumber, None)
        .await;
    assert_eq!(result, Ok(Lookup::NotFound));

    let details = client.get_case_details("99ZZ999999Z", None).await;
    assert_eq!(details, Ok(Lookup::NotFound));
}

#[tokio::test]
async fn test_falls_back_to_roa_when_index_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CaseIndex/Search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ROA/CaseSearch"))
        .and(query_param("caseNumber", "22FL001581C"))
        .respond_with(html(CASE_FULL))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/OdysseyROA/Search"))
        .respond_with(html(CASE_FULL))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let record = client
        .get_case_details("22FL001581C", None)
        .await
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(record.source, "roa_search");
}

#[tokio::test]
async fn test_unreachable_portal_reports_last_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .get_case_details("22FL001581C", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CourtError::UpstreamHttp { status: 500, .. }));
    assert!(err.is_transient());
}

// ─────────────────────── caching ───────────────────────

#[tokio::test]
async fn test_repeat_lookup_within_ttl_fetches_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CaseIndex/Search"))
        .respond_with(html(CASE_MINIMAL))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client
        .search_cases("22FL001581C", QueryKind::CaseNumber, None)
        .await
        .unwrap();
    let second = client
        .search_cases("22-FL-001581C", QueryKind::CaseNumber, None)
        .await
        .unwrap();

    assert_eq!(first, second);
    let stats = client.cache_stats();
    assert_eq!(stats.entries, 1);
    assert!(stats.hits >= 1);
}

#[tokio::test]
async fn test_expired_entry_triggers_new_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CaseIndex/Search"))
        .respond_with(html(CASE_MINIMAL))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.cache_ttl_secs = 0;
    let client = CourtRecordsClient::new(config).unwrap();

    for _ in 0..2 {
        client.get_case_details("22FL001581C", None).await.unwrap();
    }
}

// ─────────────────────── name search ───────────────────────

#[tokio::test]
async fn test_name_search_returns_every_listed_case() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CaseIndex/PartySearch"))
        .and(query_param("partyName", "Anna Smith"))
        .respond_with(html(PARTY_RESULTS))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = client
        .search_cases("  Anna   Smith ", QueryKind::Name, None)
        .await
        .unwrap()
        .found()
        .unwrap();

    let numbers: Vec<_> = records.iter().map(|r| r.case_number.as_str()).collect();
    assert_eq!(numbers, vec!["22FL001581C", "21CV000123A"]);
    assert_eq!(records[0].parties, vec!["Smith", "Jones"]);
    assert_eq!(records[1].status, "Closed");
    assert!(records.iter().all(|r| r.source == "party_name"));
}

#[tokio::test]
async fn test_name_search_with_no_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(NO_RESULTS))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.search_cases("Nobody", QueryKind::Name, None).await;
    assert_eq!(result, Ok(Lookup::NotFound));
}

// ─────────────────────── tracked-case refresh ───────────────────────

#[tokio::test]
async fn test_refresh_isolates_failing_case() {
    let server = MockServer::start().await;
    mount_case(&server, "A100").await;
    mount_case(&server, "C300").await;
    Mock::given(method("GET"))
        .and(query_param("caseNumber", "B200"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let report = client
        .update_tracked_cases(["A100", "B200", "C300"], None)
        .await;

    let updated: Vec<_> = report
        .updated
        .iter()
        .map(|r| r.case_number.as_str())
        .collect();
    assert_eq!(updated, vec!["A100", "C300"]);
    assert_eq!(report.failures.len(), 1);
    match &report.failures["B200"] {
        RefreshFailure::Failed(reason) => assert!(reason.contains("500"), "{reason}"),
        other => panic!("expected a failure reason, got {other:?}"),
    }
}

#[tokio::test]
async fn test_refresh_reports_missing_case_as_not_found() {
    let server = MockServer::start().await;
    mount_case(&server, "A100").await;
    Mock::given(method("GET"))
        .and(query_param("caseNumber", "Z999"))
        .respond_with(html(NO_RESULTS))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let report = client.update_tracked_cases(["A100", "Z999"], None).await;

    assert_eq!(report.updated.len(), 1);
    let mut expected = BTreeMap::new();
    expected.insert("Z999".to_string(), RefreshFailure::NotFound);
    assert_eq!(report.failures, expected);
}

#[tokio::test]
async fn test_refresh_waits_out_tight_rate_limit() {
    let server = MockServer::start().await;
    let numbers = ["A1", "A2", "A3", "A4", "A5"];
    for number in numbers {
        mount_case(&server, number).await;
    }

    let mut config = config_for(&server);
    for budget in config.sources.values_mut() {
        *budget = SourceBudget::new(3, Duration::from_millis(300));
    }
    // Default policy: each request waits out at most one full window.
    assert_eq!(config.admission_retries, 1);
    assert_eq!(config.refresh_width(), 3);
    let client = CourtRecordsClient::new(config).unwrap();

    let started = std::time::Instant::now();
    let report = client.update_tracked_cases(numbers, None).await;

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.updated.len(), 5);
    // Two of the five had to wait for the next window.
    assert!(started.elapsed() >= Duration::from_millis(250));

    let RateLimitReport::Single(state) = client.rate_limit_status(Some("courtindex")).unwrap()
    else {
        panic!("expected a single source");
    };
    assert!(state.current <= state.limit);
    assert_eq!(server.received_requests().await.unwrap().len(), 5);
}

// ─────────────────────── deadlines ───────────────────────

#[tokio::test]
async fn test_deadline_cuts_off_slow_portal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(CASE_MINIMAL).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let started = std::time::Instant::now();
    let deadline = Instant::now() + Duration::from_millis(200);
    let result = client.get_case_details("22FL001581C", Some(deadline)).await;

    assert_eq!(result, Err(CourtError::Timeout));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_deadline_timeout_in_batch_does_not_cancel_siblings() {
    let server = MockServer::start().await;
    mount_case(&server, "FAST1").await;
    Mock::given(method("GET"))
        .and(query_param("caseNumber", "SLOW1"))
        .respond_with(html(&detail_page("SLOW1")).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let deadline = Instant::now() + Duration::from_millis(500);
    let report = client
        .update_tracked_cases(["FAST1", "SLOW1"], Some(deadline))
        .await;

    assert_eq!(report.updated.len(), 1);
    assert_eq!(report.updated[0].case_number, "FAST1");
    assert_eq!(
        report.failures["SLOW1"],
        RefreshFailure::Failed(CourtError::Timeout.to_string())
    );
}

// ─────────────────────── rate-limit status ───────────────────────

#[tokio::test]
async fn test_rate_limit_status_tracks_admissions() {
    let server = MockServer::start().await;
    mount_case(&server, "A1").await;

    let client = client_for(&server);
    client.get_case_details("A1", None).await.unwrap();

    let RateLimitReport::All(all) = client.rate_limit_status(None).unwrap() else {
        panic!("expected every source");
    };
    assert_eq!(all["courtindex"].current, 1);
    assert!(all["courtindex"].resets_in_ms.is_some());
    assert_eq!(all["roasearch"].current, 0);
    assert_eq!(all["odyroa"].resets_in_ms, None);

    let json = serde_json::to_value(&all["courtindex"]).unwrap();
    assert_eq!(json["limit"], 60);
    assert_eq!(json["windowMs"], 60_000);
}
