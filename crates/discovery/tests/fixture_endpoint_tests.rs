//! End-to-end runs against a local fixture endpoint over real HTTP

mod common;

use common::{modify, scripted_provider, target};
use mockito::Matcher;
use schemaprobe_discovery::{Discoverer, HttpTransport};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

async fn users_fixture(server: &mut mockito::ServerGuard) -> Vec<mockito::Mock> {
    let empty = server
        .mock("POST", "/api/users")
        .match_body(Matcher::Json(json!({})))
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"email is required"}"#)
        .create_async()
        .await;

    let complete = server
        .mock("POST", "/api/users")
        .match_body(Matcher::Json(json!({"email": "a@b.com", "password": "x"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":1,"email":"a@b.com","isActive":true}"#)
        .create_async()
        .await;

    vec![empty, complete]
}

#[tokio::test]
async fn test_converges_on_user_signup_schema() {
    let mut server = mockito::Server::new_async().await;
    let mocks = users_fixture(&mut server).await;

    let (provider, transcript) = scripted_provider(vec![
        modify(json!({})),
        modify(json!({"email": "a@b.com", "password": "x"})),
    ]);
    let transport = HttpTransport::from_secs(10).unwrap();
    let discoverer = Discoverer::new(Arc::new(provider), Arc::new(transport));

    let schema = discoverer
        .run(target(format!("{}/api/users", server.url()), 10))
        .await
        .unwrap();

    for mock in &mocks {
        mock.assert_async().await;
    }
    assert_eq!(transcript.lock().unwrap().len(), 2);

    let email = schema.field("email").unwrap();
    assert!(email.required);
    assert_eq!(email.field_type.to_string(), "email");

    let password = schema.field("password").unwrap();
    assert!(password.required);
    assert_eq!(password.field_type.to_string(), "string");

    let id = schema.field("id").unwrap();
    assert!(!id.required);
    assert!(id.server_generated);

    let active = schema.field("isActive").unwrap();
    assert!(!active.required);
    assert_eq!(active.field_type.to_string(), "boolean");

    let mut required = schema.required_fields();
    required.sort();
    assert_eq!(required, vec!["email", "password"]);

    assert_eq!(
        schema.minimal_request_body,
        json!({"email": "a@b.com", "password": "x"})
    );
}

#[tokio::test]
async fn test_schema_serializes_for_clients() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = users_fixture(&mut server).await;

    let (provider, _) = scripted_provider(vec![
        modify(json!({})),
        modify(json!({"email": "a@b.com", "password": "x"})),
    ]);
    let transport = HttpTransport::from_secs(10).unwrap();
    let discoverer = Discoverer::new(Arc::new(provider), Arc::new(transport));

    let schema = discoverer
        .run(target(format!("{}/api/users", server.url()), 10))
        .await
        .unwrap();

    let value = serde_json::to_value(&schema).unwrap();
    let names: Vec<&str> = value["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["email", "id", "isActive", "password"]);
    assert_eq!(value["fields"][0]["type"], "email");
    assert_eq!(value["fields"][0]["sampleValue"], "a@b.com");
    assert_eq!(value["fields"][0]["required"], true);
    assert_eq!(value["fields"][1]["required"], false);
    assert_eq!(value["fields"][2]["required"], false);
    assert_eq!(value["fields"][3]["required"], true);
}

#[tokio::test]
async fn test_unmatched_body_keeps_iterating() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = users_fixture(&mut server).await;

    // the fixture only knows two bodies; anything else is a 501 from the server
    let (provider, transcript) = scripted_provider(vec![
        modify(json!({})),
        modify(json!({"email": "a@b.com"})),
        modify(json!({"email": "a@b.com", "password": "x"})),
    ]);
    let transport = HttpTransport::from_secs(10).unwrap();
    let discoverer = Discoverer::new(Arc::new(provider), Arc::new(transport));

    let schema = discoverer
        .run(target(format!("{}/api/users", server.url()), 10))
        .await
        .unwrap();

    assert_eq!(transcript.lock().unwrap().len(), 3);
    let mut required = schema.required_fields();
    required.sort();
    assert_eq!(required, vec!["email", "password"]);
}

#[tokio::test]
async fn test_custom_headers_reach_target() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/api/profile")
        .match_header("authorization", "Bearer secret")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_body(r#"{"displayName":"Ada"}"#)
        .create_async()
        .await;

    let (provider, _) = scripted_provider(vec![modify(json!({"displayName": "Ada"}))]);
    let transport = HttpTransport::from_secs(10).unwrap();
    let discoverer = Discoverer::new(Arc::new(provider), Arc::new(transport));

    let mut headers = HashMap::new();
    headers.insert("Authorization".to_string(), "Bearer secret".to_string());
    let mut probe_target = target(format!("{}/api/profile", server.url()), 3);
    probe_target.method = "PUT".to_string();
    probe_target.headers = headers;

    let schema = discoverer.run(probe_target).await.unwrap();

    mock.assert_async().await;
    assert_eq!(schema.fields.len(), 1);
    assert_eq!(schema.fields[0].name, "displayName");
}
