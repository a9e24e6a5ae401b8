use lotodraws_render::{Capabilities, Client, ElementRef, Error, ErrorKind, Locator};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": { "sessionId": "s-1", "capabilities": {} }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn new_session_success() {
    let mock_server = MockServer::start().await;
    mount_session(&mock_server).await;

    let client = Client::with_base_url(&mock_server.uri()).unwrap();
    let session = client.new_session(&Capabilities::default()).await.unwrap();
    assert_eq!(session.id(), "s-1");
}

#[tokio::test]
async fn new_session_refused() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "value": { "error": "session not created", "message": "no browser" }
        })))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri()).unwrap();
    let result = client.new_session(&Capabilities::default()).await;
    match result {
        Err(Error::WebDriver { kind, message }) => {
            assert_eq!(kind, ErrorKind::SessionNotCreated);
            assert_eq!(message, "no browser");
        }
        _ => panic!("expected WebDriver error"),
    }
}

#[tokio::test]
async fn plain_http_error_is_http_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri()).unwrap();
    let result = client.new_session(&Capabilities::default()).await;
    assert!(matches!(result, Err(Error::HttpStatus { status: 502, .. })));
}

#[tokio::test]
async fn find_element_and_read_property() {
    let mock_server = MockServer::start().await;
    mount_session(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/session/s-1/element"))
        .and(body_partial_json(json!({ "using": "css selector", "value": "#month" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": { "element-6066-11e4-a52e-4f735466cecf": "el-7" }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/session/s-1/element/el-7/property/value"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "value": "mars 2025" })),
        )
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri()).unwrap();
    let session = client.new_session(&Capabilities::default()).await.unwrap();
    let el = session.find_element(&Locator::id("month")).await.unwrap();
    assert_eq!(el, ElementRef("el-7".to_string()));

    let value = session.element_property(&el, "value").await.unwrap();
    assert_eq!(value.as_deref(), Some("mars 2025"));
}

#[tokio::test]
async fn stale_element_is_reported() {
    let mock_server = MockServer::start().await;
    mount_session(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/session/s-1/element/el-1/property/innerHTML"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "value": {
                "error": "stale element reference",
                "message": "element is not attached to the page document",
                "stacktrace": ""
            }
        })))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri()).unwrap();
    let session = client.new_session(&Capabilities::default()).await.unwrap();
    let err = session
        .element_property(&ElementRef("el-1".to_string()), "innerHTML")
        .await
        .unwrap_err();
    assert!(err.is_stale());
    assert!(!err.is_transport());
}

#[tokio::test]
async fn execute_page_source_and_delete() {
    let mock_server = MockServer::start().await;
    mount_session(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/session/s-1/url"))
        .and(body_partial_json(json!({ "url": "https://example.test/resultats" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/session/s-1/execute/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": true })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/session/s-1/source"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "value": "<html><body><p>ok</p></body></html>" })),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/session/s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri()).unwrap();
    let session = client.new_session(&Capabilities::default()).await.unwrap();
    session.navigate("https://example.test/resultats").await.unwrap();

    let ready = session
        .execute("return document.readyState === 'complete';", vec![])
        .await
        .unwrap();
    assert_eq!(ready, json!(true));

    let html = session.page_source().await.unwrap();
    assert!(html.contains("<p>ok</p>"));

    session.delete().await.unwrap();
}

#[tokio::test]
async fn malformed_reply_is_unexpected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not valid json}"))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri()).unwrap();
    let result = client.new_session(&Capabilities::default()).await;
    assert!(matches!(result, Err(Error::UnexpectedReply(_))));
}
