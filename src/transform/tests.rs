use super::*;
use crate::http::{HttpClient, HttpClientConfig};
use crate::types::{JsonObject, StringMap};
use serde_json::json;
use test_case::test_case;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn record(value: serde_json::Value) -> JsonObject {
    value.as_object().cloned().expect("object literal")
}

#[test_case(json!(1700000000), json!("2023-11-14T22:13:20Z") ; "epoch number")]
#[test_case(json!("1700000000"), json!("2023-11-14T22:13:20Z") ; "epoch string")]
#[test_case(json!(1), json!("1970-01-01T00:00:01Z") ; "smallest valid epoch")]
#[test_case(json!(0), json!(null) ; "zero is never")]
#[test_case(json!(-5), json!(null) ; "negative is never")]
#[test_case(json!("not a date"), json!("not a date") ; "non numeric passes through")]
#[test_case(json!(null), json!(null) ; "null passes through")]
fn test_epoch_to_iso(input: serde_json::Value, expected: serde_json::Value) {
    assert_eq!(epoch_to_iso(&input), expected);
}

#[test_case(json!(0), json!("No") ; "zero")]
#[test_case(json!(1), json!("Yes") ; "one")]
#[test_case(json!(42), json!("Yes") ; "any nonzero")]
#[test_case(json!(-1), json!("Yes") ; "negative nonzero")]
#[test_case(json!("0"), json!("No") ; "string zero")]
#[test_case(json!(true), json!("Yes") ; "bool true")]
#[test_case(json!(false), json!("No") ; "bool false")]
#[test_case(json!("maybe"), json!("maybe") ; "non numeric passes through")]
fn test_flag_to_yes_no(input: serde_json::Value, expected: serde_json::Value) {
    assert_eq!(flag_to_yes_no(&input), expected);
}

#[test]
fn test_epoch_rule_only_touches_listed_fields() {
    let rule = TransformRule::EpochDates {
        fields: vec!["first_seen".into()],
    };
    let mut rec = record(json!({ "first_seen": 86400, "last_seen": 86400 }));
    rule.apply(&mut rec);

    assert_eq!(rec["first_seen"], json!("1970-01-02T00:00:00Z"));
    assert_eq!(rec["last_seen"], json!(86400));
}

#[test]
fn test_rename_preserves_field_order() {
    let mut rec = record(json!({ "a": 1, "b": 2, "c": 3 }));
    let mut mapping = StringMap::new();
    mapping.insert("b".into(), "beta".into());
    rename_fields(&mut rec, &mapping);

    let keys: Vec<&str> = rec.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["a", "beta", "c"]);
    assert_eq!(rec["beta"], json!(2));
}

#[test]
fn test_rename_missing_field_is_noop() {
    let mut rec = record(json!({ "a": 1 }));
    let mut mapping = StringMap::new();
    mapping.insert("zzz".into(), "never".into());
    rename_fields(&mut rec, &mapping);

    assert_eq!(rec, record(json!({ "a": 1 })));
}

#[test]
fn test_chain_applies_in_order() {
    // Rename first, then convert under the new name
    let mut mapping = StringMap::new();
    mapping.insert("raw_ts".into(), "Seen At".into());
    let chain = TransformChain::new(vec![
        TransformRule::RenameFields { mapping },
        TransformRule::EpochDates {
            fields: vec!["Seen At".into()],
        },
        TransformRule::YesNoFlags {
            fields: vec!["active".into()],
        },
    ]);

    let mut rec = record(json!({ "raw_ts": 1700000000, "active": 1 }));
    chain.apply(&mut rec);

    assert_eq!(rec["Seen At"], json!("2023-11-14T22:13:20Z"));
    assert_eq!(rec["active"], json!("Yes"));
    assert!(!rec.contains_key("raw_ts"));
}

#[test]
fn test_empty_chain_is_noop() {
    let chain = TransformChain::default();
    assert!(chain.is_empty());

    let mut rec = record(json!({ "a": 1 }));
    chain.apply(&mut rec);
    assert_eq!(rec, record(json!({ "a": 1 })));
}

#[test]
fn test_rule_deserializes_from_yaml() {
    let yaml = r#"
- type: epoch_dates
  fields: [first_seen, last_seen]
- type: yes_no_flags
  fields: [has_agent]
- type: rename_fields
  mapping:
    dns: "DNS Name"
"#;
    let chain: TransformChain = serde_yaml::from_str(yaml).expect("parse chain");
    assert_eq!(chain.len(), 3);
}

fn dictionary_source() -> DictionarySource {
    DictionarySource {
        url: "/api/fields".into(),
        records_path: "fields".into(),
        key_field: "name".into(),
        label_field: "label".into(),
    }
}

#[test]
fn test_parse_dictionary() {
    let body = json!({
        "fields": [
            { "name": "ip", "label": "IP Address" },
            { "name": "os", "label": "Operating System" },
            { "name": "broken" }
        ]
    });

    let dict = parse_dictionary(&body, &dictionary_source()).expect("parse");
    assert_eq!(dict.len(), 2);
    assert_eq!(dict.label("ip"), Some("IP Address"));
    assert_eq!(dict.label("broken"), None);
}

#[test]
fn test_parse_dictionary_missing_array() {
    let body = json!({ "fields": { "not": "an array" } });
    let err = parse_dictionary(&body, &dictionary_source()).unwrap_err();
    assert!(err.to_string().contains("fields"));
}

#[tokio::test]
async fn test_fetch_dictionary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/fields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fields": [
                { "name": "ip", "label": "IP Address" }
            ]
        })))
        .mount(&server)
        .await;

    let client = HttpClient::with_config(HttpClientConfig::builder().base_url(server.uri()).build());
    let dict = FieldDictionary::fetch(&client, &dictionary_source())
        .await
        .expect("fetch");

    let rule = dict.into_rename_rule();
    let mut rec = record(json!({ "ip": "10.0.0.1" }));
    rule.apply(&mut rec);
    assert!(rec.contains_key("IP Address"));
}

#[tokio::test]
async fn test_fetch_dictionary_empty_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/fields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "fields": [] })))
        .mount(&server)
        .await;

    let client = HttpClient::with_config(HttpClientConfig::builder().base_url(server.uri()).build());
    let result = FieldDictionary::fetch(&client, &dictionary_source()).await;
    assert!(result.is_err());
}
