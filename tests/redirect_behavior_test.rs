//! Redirect and timeout behavior across real sockets.
//!
//! Each redirect hop must reissue the identical logical request against
//! the location's protocol/host/port, and the hop counter must terminate
//! misbehaving servers.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use collective::{ClientConfig, ClientError, Protocol, Query};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new("127.0.0.1")
        .with_protocol(Protocol::Http)
        .with_port(server.address().port())
}

#[tokio::test]
async fn a_302_reissues_the_same_request_against_the_new_target() {
    let target = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/category/uuid/abc/subcategories"))
        .and(query_param("count", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"moved": true})))
        .expect(1)
        .mount(&target)
        .await;

    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/category/uuid/abc/subcategories"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", target.uri().as_str()))
        .expect(1)
        .mount(&origin)
        .await;

    let query = Query::fields(json!({"uuid": "abc", "count": "2"})).unwrap();
    let res = collective::json(
        "GET",
        "/category/uuid/:uuid/subcategories",
        &query,
        &config_for(&origin),
    )
    .await
    .unwrap();

    assert_eq!(res.status, 200);
    assert_eq!(res.body.json(), Some(&json!({"moved": true})));
}

#[tokio::test]
async fn a_307_replays_the_request_body() {
    let target = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rest/address/saved"))
        .and(body_json(json!({"name": "Jane"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&target)
        .await;

    let origin = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rest/address/saved"))
        .respond_with(ResponseTemplate::new(307).insert_header("location", target.uri().as_str()))
        .expect(1)
        .mount(&origin)
        .await;

    let query = Query::fields(json!({"name": "Jane"})).unwrap();
    collective::request("POST", "/address/saved", &query, &config_for(&origin))
        .await
        .unwrap();
}

#[tokio::test]
async fn non_redirect_statuses_are_not_reissued() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/see-other"))
        .respond_with(ResponseTemplate::new(303).insert_header("location", "http://example.invalid"))
        .expect(1)
        .mount(&server)
        .await;

    let res = collective::request("GET", "/see-other", &Query::None, &config_for(&server))
        .await
        .unwrap();
    assert_eq!(res.status, 303);
}

#[tokio::test]
async fn redirect_loops_stop_at_the_configured_hop_limit() {
    let server = MockServer::start().await;
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/api/rest/loop"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", uri.as_str()))
        .mount(&server)
        .await;

    let config = config_for(&server).with_max_redirects(2);
    let err = collective::request("GET", "/loop", &Query::None, &config)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::TooManyRedirects { hops: 2 }));
}

#[tokio::test]
async fn redirects_can_be_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/here"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "http://example.invalid"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server).with_follow_redirects(false);
    let res = collective::request("GET", "/here", &Query::None, &config)
        .await
        .unwrap();
    assert_eq!(res.status, 302);
}

#[tokio::test]
async fn a_missing_location_header_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/nowhere"))
        .respond_with(ResponseTemplate::new(301))
        .mount(&server)
        .await;

    let err = collective::request("GET", "/nowhere", &Query::None, &config_for(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn a_configured_timeout_surfaces_as_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = config_for(&server).with_timeout(Duration::from_millis(50));
    let err = collective::request("GET", "/slow", &Query::None, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}
