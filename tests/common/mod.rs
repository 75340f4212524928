//! Shared helpers for tests that run against a mocked backend.

#![allow(dead_code)]

use std::sync::Arc;

use erp_dashboard_lib::api::{Backend, BackendClient};
use erp_dashboard_lib::config::BackendSettings;
use serde_json::{json, Value};
use wiremock::{MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";

pub fn settings(server: &MockServer) -> BackendSettings {
    BackendSettings {
        base_url: server.uri(),
        token: Some(TOKEN.to_string()),
        timeout_secs: 5,
    }
}

pub fn client(server: &MockServer) -> BackendClient {
    BackendClient::new(&settings(server)).expect("client builds")
}

pub fn backend(server: &MockServer) -> Arc<dyn Backend> {
    Arc::new(client(server))
}

/// `{success: true, <key>: payload}`
pub fn ok(key: &str, payload: Value) -> ResponseTemplate {
    let mut body = json!({ "success": true });
    body[key] = payload;
    ResponseTemplate::new(200).set_body_json(body)
}

pub fn ok_message(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "message": message }))
}

pub fn failure(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "success": false, "message": message }))
}

pub fn product(id: &str, name: &str, category: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "category": "Hardware",
        "inventoryCategory": category,
        "uom": "pcs",
        "stock": { "currentStock": 25, "minStock": 5 },
        "prices": { "mrp": 120.0 },
        "store": { "_id": "s1", "name": "Main store" }
    })
}
