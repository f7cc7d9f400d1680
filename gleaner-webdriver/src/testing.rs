//! An in-memory backend that replays canned responses and records requests.

use anyhow::{anyhow, Result};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use crate::{Response, WebDriverBackend};

#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: http::Method,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

#[derive(Default)]
struct Script {
    responses: VecDeque<Response>,
    requests: Vec<Request>,
}

/// Cloning shares the same script, so a test can keep a handle after moving
/// the backend into a driver.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_raw(&self, status: http::StatusCode, body: Vec<u8>) -> &Self {
        self.lock().responses.push_back(Response { status, body });
        self
    }

    pub fn respond_ok(&self, value: serde_json::Value) -> &Self {
        let body = serde_json::to_vec(&serde_json::json!({ "value": value }))
            .expect("serializing response");
        self.respond_raw(http::StatusCode::OK, body)
    }

    pub fn respond_error(&self, status: http::StatusCode, error: &str, message: &str) -> &Self {
        let body = serde_json::to_vec(&serde_json::json!({
            "value": { "error": error, "message": message, "stacktrace": "" }
        }))
        .expect("serializing response");
        self.respond_raw(status, body)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().expect("script lock poisoned")
    }

    fn handle(
        &self,
        method: http::Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let mut script = self.lock();
        script.requests.push(Request {
            method: method.clone(),
            url: url.to_owned(),
            body,
        });

        script
            .responses
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted response for {method} {url}"))
    }
}

#[async_trait::async_trait]
impl WebDriverBackend for ScriptedBackend {
    async fn get(&mut self, url: &str) -> Result<Response> {
        self.handle(http::Method::GET, url, None)
    }

    async fn post(&mut self, url: &str, body: serde_json::Value) -> Result<Response> {
        self.handle(http::Method::POST, url, Some(body))
    }

    async fn delete(&mut self, url: &str) -> Result<Response> {
        self.handle(http::Method::DELETE, url, None)
    }
}
