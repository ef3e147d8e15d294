#![allow(clippy::unwrap_used)]
// Integration tests for `RestClient` using wiremock.

use serde_json::json;
use tokio_test::assert_ok;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dashstyle_api::{Error, RestClient};

// ── Helpers ─────────────────────────────────────────────────────────

const TOKEN: &str = "long-lived-token";

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = RestClient::with_client(reqwest::Client::new(), base_url, TOKEN.to_string().into());
    (server, client)
}

fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

// ── States ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_states() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states"))
        .and(header("authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "entity_id": "light.kitchen_main",
                "state": "on",
                "attributes": { "friendly_name": "Kitchen Main" },
                "last_changed": "2024-05-01T10:00:00+00:00"
            },
            {
                "entity_id": "sensor.outdoor_temp",
                "state": "18.5",
                "attributes": { "unit_of_measurement": "°C" }
            }
        ])))
        .mount(&server)
        .await;

    let states = assert_ok!(client.states().await);
    assert_eq!(states.len(), 2);
    assert_eq!(states[0].entity_id, "light.kitchen_main");
    assert_eq!(states[0].attributes["friendly_name"], "Kitchen Main");
    assert_eq!(states[1].last_changed, None);
}

#[tokio::test]
async fn test_single_state_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states/light.nowhere"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Entity not found." })),
        )
        .mount(&server)
        .await;

    let state = assert_ok!(client.state("light.nowhere").await);
    assert!(state.is_none());
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(401).set_body_string("401: Unauthorized"))
        .mount(&server)
        .await;

    let result = client.states().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = client.states().await.unwrap_err();
    assert!(err.is_decode(), "expected decode error, got: {err:?}");
}

// ── Services ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_call_service_posts_entity_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/services/light/toggle"))
        .and(header("authorization", bearer().as_str()))
        .and(body_json(json!({ "entity_id": "light.kitchen_main" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "entity_id": "light.kitchen_main", "state": "off", "attributes": {} }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let changed = assert_ok!(
        client
            .call_service("light", "toggle", "light.kitchen_main")
            .await
    );
    assert_eq!(changed[0].state, "off");
}

#[tokio::test]
async fn test_call_service_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/services/cover/open_cover"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = client
        .call_service("cover", "open_cover", "cover.garage")
        .await;
    assert!(
        matches!(result, Err(Error::Http { status: 500, ref message }) if message == "boom"),
        "expected Http 500, got: {result:?}"
    );
}
