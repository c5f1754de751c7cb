/// Integration tests with a mocked Entrata leads API
/// Exercises the full resolve → validate → build → send path without
/// hitting the real service
use entrata_lead_webhook::config::{ApiKeyPlacement, Config, UpstreamMethod};
use entrata_lead_webhook::entrata_client::UpstreamResponse;
use entrata_lead_webhook::errors::AppError;
use entrata_lead_webhook::forwarder::LeadForwarder;
use entrata_lead_webhook::lead_models::IncomingLead;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create test config
fn create_test_config(server_uri: &str) -> Config {
    Config {
        port: 3000,
        leads_url: format!("{}/ext/leads", server_uri),
        api_key: Some("secret-key".to_string()),
        api_key_placement: ApiKeyPlacement::Header,
        username: None,
        password: None,
        basic_auth_in_body: false,
        method: UpstreamMethod::SendLeads,
        default_property_id: None,
        default_lead_source: None,
        timeout_secs: 15,
    }
}

fn jane_doe() -> IncomingLead {
    IncomingLead::from_body(json!({
        "firstName": "Jane",
        "lastName": "Doe",
        "email": "j@x.com",
        "phone": "555-1234",
        "propertyId": "100016881"
    }))
    .unwrap()
}

#[tokio::test]
async fn test_api_key_header_lead_accepted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ext/leads"))
        .and(header("X-Api-Key", "secret-key"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({
            "auth": { "type": "apikey" },
            "method": {
                "name": "sendLeads",
                "params": {
                    "propertyId": 100016881u64,
                    "prospects": {
                        "prospect": [{
                            "customers": {
                                "customer": [{
                                    "name": { "firstName": "Jane", "lastName": "Doe" }
                                }]
                            }
                        }]
                    }
                }
            }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "response": { "code": 200 } })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let forwarder = LeadForwarder::from_config(&create_test_config(&mock_server.uri())).unwrap();
    let result = forwarder.forward(jane_doe()).await.unwrap();

    assert_eq!(
        result,
        UpstreamResponse::Json(json!({ "response": { "code": 200 } }))
    );

    // Key travels in the header only
    let requests = mock_server.received_requests().await.unwrap();
    let sent: serde_json::Value = requests[0].body_json().unwrap();
    assert!(sent["auth"].get("key").is_none());
}

#[tokio::test]
async fn test_missing_phone_makes_no_upstream_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let forwarder = LeadForwarder::from_config(&create_test_config(&mock_server.uri())).unwrap();
    let incoming = IncomingLead::from_body(json!({
        "firstName": "Jane",
        "lastName": "Doe",
        "email": "j@x.com",
        "propertyId": "100016881"
    }))
    .unwrap();

    let err = forwarder.forward(incoming).await.unwrap_err();
    assert_eq!(err, AppError::missing_fields(["phone"]));
    assert_eq!(err.to_string(), "Missing: phone");
}

#[tokio::test]
async fn test_upstream_rejection_preserves_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ext/leads"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad org"))
        .mount(&mock_server)
        .await;

    let forwarder = LeadForwarder::from_config(&create_test_config(&mock_server.uri())).unwrap();
    let err = forwarder.forward(jane_doe()).await.unwrap_err();

    assert_eq!(
        err,
        AppError::UpstreamRejected {
            status: 502,
            body: "bad org".to_string(),
        }
    );
}

#[tokio::test]
async fn test_plain_text_success_is_returned_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_string("Lead queued"))
        .mount(&mock_server)
        .await;

    let forwarder = LeadForwarder::from_config(&create_test_config(&mock_server.uri())).unwrap();
    let result = forwarder.forward(jane_doe()).await.unwrap();

    assert_eq!(result, UpstreamResponse::Text("Lead queued".to_string()));
}

#[tokio::test]
async fn test_inline_api_key_sends_no_key_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "auth": { "type": "apikey", "key": "secret-key" }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.api_key_placement = ApiKeyPlacement::Inline;

    let forwarder = LeadForwarder::from_config(&config).unwrap();
    forwarder.forward(jane_doe()).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key("x-api-key"));
}

#[tokio::test]
async fn test_basic_auth_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .and(body_partial_json(json!({
            "auth": { "type": "basic", "username": "user", "password": "pass" },
            "method": {
                "name": "createLead",
                "version": "r1",
                "params": { "propertyId": 100016881u64, "name": "Jane Doe", "telephone": "555-1234" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.api_key = None;
    config.username = Some("user".to_string());
    config.password = Some("pass".to_string());
    config.basic_auth_in_body = true;
    config.method = UpstreamMethod::CreateLead;

    let forwarder = LeadForwarder::from_config(&config).unwrap();
    let result = forwarder.forward(jane_doe()).await.unwrap();

    assert_eq!(result, UpstreamResponse::Json(json!({ "ok": true })));
}

#[tokio::test]
async fn test_timeout_is_unreachable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.timeout_secs = 1;

    let forwarder = LeadForwarder::from_config(&config).unwrap();
    let err = forwarder.forward(jane_doe()).await.unwrap_err();

    assert!(matches!(err, AppError::UpstreamUnreachable(_)));
}

#[tokio::test]
async fn test_connection_refused_is_unreachable() {
    // Bind then drop a listener to get a port nobody is serving on
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let forwarder = LeadForwarder::from_config(&create_test_config(&uri)).unwrap();
    let err = forwarder.forward(jane_doe()).await.unwrap_err();

    assert!(matches!(err, AppError::UpstreamUnreachable(_)));
}

#[tokio::test]
async fn test_concurrent_leads_are_independent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(10)
        .mount(&mock_server)
        .await;

    let forwarder = LeadForwarder::from_config(&create_test_config(&mock_server.uri())).unwrap();

    let mut handles = vec![];
    for i in 0..10 {
        let forwarder = forwarder.clone();
        handles.push(tokio::spawn(async move {
            let incoming = IncomingLead::from_body(json!({
                "firstName": format!("Lead{}", i),
                "lastName": "Doe",
                "email": format!("lead{}@x.com", i),
                "phone": "555-1234",
                "propertyId": 100016881
            }))
            .unwrap();
            forwarder.forward(incoming).await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
}
