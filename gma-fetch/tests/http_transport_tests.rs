//! `ReqwestTransport` tests against a local mock server.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gma_fetch::{
    ClientConfig, GmaClient, Method, RequestBody, ResponseBody, ResponseKind, ReqwestTransport,
    SessionController, Transport, TransportErrorKind, TransportRequest,
};

#[tokio::test]
async fn test_json_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gma/"))
        .and(query_param("q", "ping"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new();
    let url = format!("{}/gma/?q=ping", server.uri());
    let response = transport
        .call(TransportRequest::new(Method::Get, url, ResponseKind::Json))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, ResponseBody::Json(json!({"success": true, "data": 1})));
}

#[tokio::test]
async fn test_login_page_is_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<!DOCTYPE html><html><form id=\"login\"/></html>"),
        )
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new();
    let err = transport
        .call(TransportRequest::new(
            Method::Get,
            format!("{}/gma/?q=ping", server.uri()),
            ResponseKind::Json,
        ))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), TransportErrorKind::Decode);
    assert!(err.is_parse_failure());
}

#[tokio::test]
async fn test_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new();
    let err = transport
        .call(
            TransportRequest::new(Method::Post, format!("{}/cas/v1/tickets", server.uri()), ResponseKind::Text)
                .with_body(RequestBody::Form(vec![("username".into(), "sam".into())])),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), TransportErrorKind::Status);
    assert_eq!(err.status_code(), Some(400));
    assert!(!err.is_parse_failure());
}

#[tokio::test]
async fn test_form_body_and_location() {
    let server = MockServer::start().await;
    let location = format!("{}/cas/v1/tickets/TGT-9", server.uri());
    Mock::given(method("POST"))
        .and(path("/cas/v1/tickets"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("username=sam%40example.com"))
        .and(body_string_contains("password=p%26ss"))
        .respond_with(ResponseTemplate::new(201).insert_header("Location", location.as_str()))
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new();
    let response = transport
        .call(
            TransportRequest::new(Method::Post, format!("{}/cas/v1/tickets", server.uri()), ResponseKind::Text)
                .with_body(RequestBody::Form(vec![
                    ("username".into(), "sam@example.com".into()),
                    ("password".into(), "p&ss".into()),
                ])),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.location.as_deref(), Some(location.as_str()));
}

#[tokio::test]
async fn test_disallowed_domain_is_not_contacted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().with_allowed_domains(vec!["example.org".to_string()]);
    let err = transport
        .call(TransportRequest::new(Method::Get, server.uri(), ResponseKind::Text))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), TransportErrorKind::DomainNotAllowed);
}

#[tokio::test]
async fn test_login_end_to_end() {
    let server = MockServer::start().await;
    let base = format!("{}/gma/", server.uri());
    let tgt = format!("{}/cas/v1/tickets/TGT-1", server.uri());

    Mock::given(method("POST"))
        .and(path("/cas/v1/tickets"))
        .respond_with(ResponseTemplate::new(201).insert_header("Location", tgt.as_str()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cas/v1/tickets/TGT-1"))
        .and(body_string(format!("service={base}?q=node")))
        .respond_with(ResponseTemplate::new(200).set_body_string("ST-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gma/"))
        .and(query_param("q", "node"))
        .and(query_param("ticket", "ST-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Welcome</html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gma/"))
        .and(query_param("q", "gmaservices/gma_user"))
        .and(query_param("type", "current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{ "renId": 42, "preferredName": "Sam", "GUID": "F00D-42" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::builder(base.as_str(), format!("{}/cas", server.uri()))
        .build()
        .unwrap();
    let session = Arc::new(SessionController::new(config, Arc::new(ReqwestTransport::new())));
    let client = GmaClient::new(session);

    let identity = client.login("sam@example.com", "secret").await.unwrap();

    assert_eq!(identity.user_id, 42);
    assert!(client.session().is_authenticated());
}
