use super::*;
use crate::loader::load_feed_from_str;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn feed_yaml(extra: &str) -> String {
    format!(
        r#"
name: asset_feed
required_params: [base_url]
http:
  base_url: "{{{{ params.base_url }}}}"
  max_retries: 1
  retry_interval_ms: 10
request:
  url: /api/assets
records_path: records
pagination:
  offset_param: offset
  size_param: pageSize
  page_size: 50
  total_path: totalCount
{extra}
"#
    )
}

fn runner_for(server_uri: &str, yaml: &str) -> FeedRunner {
    let def = load_feed_from_str(yaml).expect("parse feed");
    let ctx = RunContext::from_params(json!({ "base_url": server_uri })).expect("context");
    FeedRunner::new(def, ctx)
}

fn page_body(total: u64, ids: std::ops::Range<u64>) -> serde_json::Value {
    let records: Vec<_> = ids.map(|i| json!({ "id": i })).collect();
    json!({ "totalCount": total, "records": records })
}

#[tokio::test]
async fn test_missing_param_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let def = load_feed_from_str(&feed_yaml("")).expect("parse feed");
    let ctx = RunContext::from_params(json!({})).expect("context");

    let completion = FeedRunner::new(def, ctx).run_to_completion().await;
    match completion {
        FeedCompletion::Failure { message } => {
            assert!(message.contains("Missing required parameter"));
            assert!(message.contains("base_url"));
        }
        FeedCompletion::Success { .. } => panic!("expected failure"),
    }
}

#[tokio::test]
async fn test_paginates_offsets_for_total_120() {
    let server = MockServer::start().await;
    for (offset, ids) in [(0u64, 0..50u64), (50, 50..100), (100, 100..120)] {
        Mock::given(method("GET"))
            .and(path("/api/assets"))
            .and(query_param("offset", offset.to_string()))
            .and(query_param("pageSize", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(120, ids)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut runner = runner_for(&server.uri(), &feed_yaml(""));
    let output = runner.run().await.expect("run");

    assert_eq!(runner.state(), RunState::Done);
    assert_eq!(output.stats.pages_fetched, 3);
    assert_eq!(output.stats.records_emitted, 120);
}

#[tokio::test]
async fn test_short_first_page_stops_pagination() {
    let server = MockServer::start().await;
    // Endpoint claims 500 records but returns only 3
    Mock::given(method("GET"))
        .and(path("/api/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(500, 0..3)))
        .expect(1)
        .mount(&server)
        .await;

    let mut runner = runner_for(&server.uri(), &feed_yaml(""));
    let output = runner.run().await.expect("run");

    assert_eq!(output.stats.pages_fetched, 1);
    assert_eq!(output.stats.records_emitted, 3);
}

#[tokio::test]
async fn test_end_to_end_document_shape() {
    let server = MockServer::start().await;
    let yaml = format!(
        r#"
name: asset_feed
required_params: [base_url]
http:
  base_url: "{{{{ params.base_url }}}}"
request:
  url: /api/assets
records_path: records
pagination:
  page_size: 2
  total_path: totalCount
transforms:
  - type: epoch_dates
    fields: [seen]
  - type: yes_no_flags
    fields: [active]
"#
    );

    Mock::given(method("GET"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCount": 4,
            "records": [
                { "id": 1, "seen": 1700000000, "active": 1 },
                { "id": 2, "seen": 0, "active": 0 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCount": 4,
            "records": [
                { "id": 3, "seen": 1700000000, "active": 1 },
                { "id": 4, "seen": 1700000000, "active": 0 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let completion = runner_for(&server.uri(), &yaml).run_to_completion().await;
    let output = match completion {
        FeedCompletion::Success { output, .. } => output,
        FeedCompletion::Failure { message } => panic!("run failed: {message}"),
    };
    let text = String::from_utf8(output.to_vec()).expect("utf8");

    assert_eq!(text.matches("<DATA>").count(), 1);
    assert_eq!(text.matches("</DATA>").count(), 1);
    assert_eq!(text.matches("<RECORD>").count(), 4);
    assert!(text.contains("<seen>2023-11-14T22:13:20Z</seen>"));
    assert!(text.contains("<seen/>"));
    assert!(text.contains("<active>Yes</active>"));
    assert!(text.contains("<active>No</active>"));

    // Records appear in endpoint order
    let positions: Vec<usize> = (1..=4)
        .map(|i| text.find(&format!("<id>{i}</id>")).expect("record present"))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_retries_failed_page_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/assets"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(2, 0..2)))
        .mount(&server)
        .await;

    let mut runner = runner_for(&server.uri(), &feed_yaml(""));
    let output = runner.run().await.expect("run");
    assert_eq!(output.stats.records_emitted, 2);
}

#[tokio::test]
async fn test_exhausted_retries_settle_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/assets"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        // First attempt plus one retry
        .expect(2)
        .mount(&server)
        .await;

    let completion = runner_for(&server.uri(), &feed_yaml("")).run_to_completion().await;
    match completion {
        FeedCompletion::Failure { message } => {
            assert!(message.contains("2 attempts"));
            assert!(message.contains("HTTP 500"));
        }
        FeedCompletion::Success { .. } => panic!("expected failure"),
    }
}

#[tokio::test]
async fn test_run_with_caller_writer_receives_fragments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(2, 0..2)))
        .mount(&server)
        .await;

    let mut runner = runner_for(&server.uri(), &feed_yaml(""));
    let mut writer = BufferWriter::default();
    let stats = runner.run_with_writer(&mut writer).await.expect("run");

    assert_eq!(stats.records_emitted, 2);
    assert_eq!(writer.fragments_written(), 2);
    assert_eq!(runner.state(), RunState::Done);
}

#[tokio::test]
async fn test_previous_run_context_echoed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 0..1)))
        .mount(&server)
        .await;

    let yaml = feed_yaml("run_context_param: LastRunTime");
    let def = load_feed_from_str(&yaml).expect("parse feed");
    let ctx = RunContext::new(
        json!({ "base_url": server.uri() }),
        json!({ "LastRunTime": "2026-08-01T00:00:00Z" }),
    )
    .expect("context");

    match FeedRunner::new(def, ctx).run_to_completion().await {
        FeedCompletion::Success {
            previous_run_context,
            ..
        } => assert_eq!(previous_run_context.as_deref(), Some("2026-08-01T00:00:00Z")),
        FeedCompletion::Failure { message } => panic!("run failed: {message}"),
    }
}

#[tokio::test]
async fn test_empty_result_is_wellformed_empty_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0, 0..0)))
        .expect(1)
        .mount(&server)
        .await;

    let mut runner = runner_for(&server.uri(), &feed_yaml(""));
    let output = runner.run().await.expect("run");

    assert_eq!(output.stats.records_emitted, 0);
    assert_eq!(&output.payload[..], b"<DATA>\n</DATA>");
}

#[tokio::test]
async fn test_non_array_records_path_fails_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "totalCount": 1, "records": "oops" })),
        )
        .mount(&server)
        .await;

    let mut runner = runner_for(&server.uri(), &feed_yaml(""));
    let err = runner.run().await.unwrap_err();
    assert!(matches!(err, Error::RecordExtraction { .. }));
}

#[test]
fn test_extract_records_root_array() {
    let body = json!([{ "id": 1 }, "skipped", { "id": 2 }]);
    let records = extract_records(&body, "").expect("extract");
    assert_eq!(records.len(), 2);
}

#[test]
fn test_extract_records_missing_path() {
    let body = json!({ "data": [] });
    assert!(extract_records(&body, "nope").is_err());
}

#[test]
fn test_run_state_transitions_are_terminal() {
    assert!(RunState::Done.is_terminal());
    assert!(RunState::Failed.is_terminal());
    assert!(!RunState::Paginating.is_terminal());
    assert_eq!(RunState::default(), RunState::Idle);
    assert_eq!(RunState::ValidatingParams.to_string(), "validating_params");
}
