//! End-to-end mock server scenario over a real socket.

use resonance_mock::collection::Collection;
use resonance_mock::mock::{
    save_settings, EngineOptions, InMemoryStore, MockServerEngine, MockServerSettings,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

const MOCK_PORT: u16 = 4010;

fn widgets() -> Collection {
    serde_json::from_value(json!({
        "id": "c1",
        "endpoints": [{
            "id": "e1",
            "method": "POST",
            "path": "/widgets",
            "requestBody": {"example": "{\"name\":\"a\"}"}
        }]
    }))
    .unwrap()
}

#[tokio::test]
async fn test_post_widgets_on_started_server() {
    let store = Arc::new(InMemoryStore::new());
    let settings = MockServerSettings {
        port: MOCK_PORT,
        ..Default::default()
    };
    save_settings(store.as_ref(), &settings).unwrap();
    let engine = MockServerEngine::new(store, vec![widgets()], EngineOptions::default());

    let enabled = engine.handle_toggle_collection("c1");
    assert!(enabled.success, "{:?}", enabled.message);
    let started = engine.handle_start().await;
    assert!(started.success, "{:?}", started.message);
    assert!(engine.get_status().running);

    let begin = Instant::now();
    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{MOCK_PORT}/widgets"))
        .json(&json!({"name": "a"}))
        .send()
        .await
        .unwrap();
    let elapsed = begin.elapsed();

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"message": "Success", "data": {}}));
    assert!(elapsed < Duration::from_secs(2));

    let logs = engine.get_request_logs(20);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].response_status, 201);
    assert_eq!(logs[0].method, "POST");
    assert_eq!(logs[0].path, "/widgets");

    assert!(engine.handle_stop().await.success);
    assert!(!engine.get_status().running);
}
