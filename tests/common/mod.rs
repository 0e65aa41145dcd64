//! Scripted in-memory transport shared by the integration tests.
#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use dbx_exec::{ConnectionInfo, ContextRegistry, Executor, HttpResponse, Result, Transport};
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

/// Responds per URL path: queued one-shot responses first, then a sticky
/// fallback, then 404.
#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    sticky: Mutex<HashMap<String, HttpResponse>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, path: &str, status: u16, body: Value) {
        self.queued
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response(status, body));
    }

    pub fn always(&self, path: &str, status: u16, body: Value) {
        self.sticky
            .lock()
            .unwrap()
            .insert(path.to_string(), response(status, body));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls().iter().filter(|c| c.path == path).count()
    }

    /// Command texts submitted to the execute endpoint, in order.
    pub fn commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.path == EXECUTE)
            .filter_map(|c| c.body?.get("command")?.as_str().map(str::to_string))
            .collect()
    }

    fn respond(&self, method: &'static str, url: &Url, body: Option<Value>) -> HttpResponse {
        let path = url.path().to_string();
        self.calls.lock().unwrap().push(Call { method, path: path.clone(), body });

        if let Some(resp) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&path)
            .and_then(VecDeque::pop_front)
        {
            return resp;
        }
        self.sticky
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .unwrap_or_else(|| HttpResponse::new(StatusCode::NOT_FOUND, "no route"))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: Url, _token: &str) -> Result<HttpResponse> {
        Ok(self.respond("GET", &url, None))
    }

    async fn post_json(&self, url: Url, _token: &str, body: &Value) -> Result<HttpResponse> {
        Ok(self.respond("POST", &url, Some(body.clone())))
    }
}

pub const CREATE: &str = "/api/1.2/contexts/create";
pub const DESTROY: &str = "/api/1.2/contexts/destroy";
pub const EXECUTE: &str = "/api/1.2/commands/execute";
pub const STATUS: &str = "/api/1.2/commands/status";

pub fn response(status: u16, body: Value) -> HttpResponse {
    let text = match body {
        Value::String(s) => s,
        other => other.to_string(),
    };
    HttpResponse::new(StatusCode::from_u16(status).unwrap(), text)
}

pub fn conn() -> ConnectionInfo {
    ConnectionInfo::new("https://adb-42.cloud.example", "0101-cluster", "dapi-test")
}

pub fn executor(transport: Arc<ScriptedTransport>) -> Executor {
    Executor::new(transport, Arc::new(ContextRegistry::new())).with_poll_interval(Duration::ZERO)
}

pub fn finished(data: Value) -> Value {
    serde_json::json!({ "status": "Finished", "results": { "resultType": "table", "data": data } })
}

/// Context creation and command submission always succeed.
pub fn happy_submit(transport: &ScriptedTransport) {
    transport.always(CREATE, 200, serde_json::json!({ "id": "ctx-1" }));
    transport.always(EXECUTE, 200, serde_json::json!({ "id": "cmd-1" }));
    transport.always(DESTROY, 200, serde_json::json!({ "id": "ctx-1" }));
}
