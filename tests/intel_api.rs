//! Integration tests for the Intelligence client using HTTP stubbing.

mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::intel_client;
use falcon_client::{ActorQuery, Error, IndicatorQuery, SortField};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Actors queries carry the custom auth headers, default paging and field
/// selection, and the typed reply gets its timestamps normalized.
#[tokio::test]
async fn test_actors_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor/v1/queries/actors"))
        .and(header("X-CSIX-CUSTID", "id"))
        .and(header("X-CSIX-CUSTKEY", "key"))
        .and(query_param("q", "panda"))
        .and(query_param("fields", "__basic__"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"paging": {"total": 1, "offset": 0, "limit": 10}},
            "query_time": 0.031,
            "resources": [{
                "id": 42,
                "name": "WICKED SPIDER",
                "short_description": "eCrime actor",
                "created_date": 0,
                "last_modified_date": 1700000000.9,
                "first_activity_date": 1500000000,
                "last_activity_date": 1650000000,
                "slug": "wicked-spider"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = intel_client(&server);
    let reply = client
        .actors(ActorQuery {
            q: "panda".to_string(),
            ..Default::default()
        })
        .await
        .expect("should succeed");

    assert_eq!(reply.meta.paging.total, 1);
    let actor = &reply.resources[0];
    assert_eq!(actor.name, "WICKED SPIDER");
    assert_eq!(actor.created_date, DateTime::<Utc>::UNIX_EPOCH);
    // Fractional epoch truncated, not rounded.
    assert_eq!(
        actor.last_modified_date,
        Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
    );
}

/// Sort fields are encoded as `<name>.<direction>` entries.
#[tokio::test]
async fn test_actors_sort_encoding() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor/v1/queries/actors"))
        .and(query_param("sort", "last_modified_date.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"paging": {"total": 0, "offset": 0, "limit": 10}},
            "resources": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = intel_client(&server);
    let reply = client
        .actors(ActorQuery {
            sort_fields: vec![SortField::descending("last_modified_date")],
            ..Default::default()
        })
        .await
        .expect("should succeed");

    assert!(reply.resources.is_empty());
}

/// The raw variant copies the exact response bytes without parsing them,
/// even when the body is not valid JSON.
#[tokio::test]
async fn test_actors_raw_copies_bytes_unmodified() {
    let server = MockServer::start().await;

    let body = "{\"resources\": [this is not json";
    Mock::given(method("GET"))
        .and(path("/actor/v1/queries/actors"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let client = intel_client(&server);
    let mut sink = Vec::new();
    client
        .actors_raw(ActorQuery::default(), &mut sink)
        .await
        .expect("raw copy should succeed");

    assert_eq!(sink, body.as_bytes());
}

/// Non-2xx statuses are classified as API errors carrying the status code.
#[tokio::test]
async fn test_actors_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor/v1/queries/actors"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = intel_client(&server);
    let result = client.actors(ActorQuery::default()).await;

    match result {
        Err(err @ Error::Api { status: 404, .. }) => {
            assert_eq!(err.code(), "http_error");
        }
        other => panic!("expected 404 API error, got {:?}", other),
    }
}

/// A reply that does not match the expected shape surfaces a decode error.
#[tokio::test]
async fn test_actors_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor/v1/queries/actors"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[1, 2, 3]"))
        .expect(1)
        .mount(&server)
        .await;

    let client = intel_client(&server);
    let result = client.actors(ActorQuery::default()).await;

    assert!(matches!(result, Err(Error::Decode(_))));
}

/// Indicator searches without the required parameters fail before any HTTP
/// request is made.
#[tokio::test]
async fn test_indicators_missing_params_makes_no_request() {
    let server = MockServer::start().await;
    let client = intel_client(&server);

    let result = client
        .indicators(IndicatorQuery {
            parameter: "domain".to_string(),
            // filter and value left empty
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(Error::MissingParameters)));

    let mut sink = Vec::new();
    let result = client.indicators_raw(IndicatorQuery::default(), &mut sink).await;
    assert!(matches!(result, Err(Error::MissingParameters)));
    assert!(sink.is_empty());

    let received = server.received_requests().await.expect("recording enabled");
    assert!(received.is_empty());
}

/// Indicator searches hit the parameter-specific route, seed the filter
/// pair, default the paging and normalize nested timestamps.
#[tokio::test]
async fn test_indicators_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/indicator/v1/search/domain"))
        .and(header("X-CSIX-CUSTID", "id"))
        .and(query_param("domain", "bad.example.com"))
        .and(query_param("page", "1"))
        .and(query_param("perPage", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "indicator": "bad.example.com",
            "type": "domain",
            "last_updated": 1700000000.5,
            "published_date": 1600000000,
            "malicious_confidence": "high",
            "relations": [{
                "indicator": "198.51.100.1",
                "type": "ip_address",
                "created_date": 1650000000.7,
                "last_valid_date": 1660000000
            }],
            "labels": [{
                "name": "MaliciousConfidence/High",
                "created_on": 1650000000,
                "last_valid_on": 1660000000
            }]
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let client = intel_client(&server);
    let indicators = client
        .indicators(IndicatorQuery {
            parameter: "domain".to_string(),
            filter: "domain".to_string(),
            value: "bad.example.com".to_string(),
            ..Default::default()
        })
        .await
        .expect("should succeed");

    assert_eq!(indicators.len(), 1);
    let indicator = &indicators[0];
    assert_eq!(indicator.kind, "domain");
    assert_eq!(
        indicator.last_updated,
        Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
    );
    assert_eq!(
        indicator.relations[0].created_date,
        Utc.with_ymd_and_hms(2022, 4, 15, 5, 20, 0).unwrap()
    );
}
