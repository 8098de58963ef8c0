//! In-memory transport with scripted replies
//!
//! Replies are queued per `(method, path)`. The last queued reply for a route
//! repeats, so a single `reply` answers every call to that path. Every call is
//! recorded for later inspection. Unscripted routes answer 404.

use super::transport::{classify_response, Query, Transport};
use crate::domain::{RemoteError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// HTTP method of a recorded call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

/// One scripted outcome
#[derive(Debug, Clone)]
pub enum Reply {
    /// 2xx with this body
    Ok(Value),
    /// This status and body, classified like a real response
    Status(u16, Value),
    /// The server could not be reached
    Unreachable,
}

impl Reply {
    fn into_result(self) -> Result<Value> {
        match self {
            Reply::Ok(body) => Ok(body),
            Reply::Status(status, body) => classify_response(status, &body.to_string()),
            Reply::Unreachable => {
                Err(RemoteError::ConnectionFailed("scripted connection failure".to_string()).into())
            }
        }
    }
}

/// A call the transport received
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RecordedCall {
    /// Value of a query parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Transport answering from a script
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `method path`
    pub fn reply(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    /// Queue a 2xx reply for `GET path`
    pub fn on_get(&self, path: &str, body: Value) -> &Self {
        self.reply(Method::Get, path, Reply::Ok(body))
    }

    /// Queue a 2xx reply for `POST path`
    pub fn on_post(&self, path: &str, body: Value) -> &Self {
        self.reply(Method::Post, path, Reply::Ok(body))
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Calls received for `method path`
    pub fn calls_to(&self, method: Method, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    /// Number of calls received for `method path`
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls_to(method, path).len()
    }

    fn answer(&self, call: RecordedCall) -> Result<Value> {
        let key = (call.method, call.path.clone());
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);

        let mut routes = self
            .routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let reply = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        reply
            .unwrap_or_else(|| {
                Reply::Status(
                    404,
                    json!({"error": {"message": format!("no scripted reply for {}", key.1)}}),
                )
            })
            .into_result()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, path: &str, query: &Query) -> Result<Value> {
        self.answer(RecordedCall {
            method: Method::Get,
            path: path.to_string(),
            query: query.to_vec(),
            body: None,
        })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.answer(RecordedCall {
            method: Method::Post,
            path: path.to_string(),
            query: Vec::new(),
            body: Some(body.clone()),
        })
    }

    fn base_url(&self) -> &str {
        "memory://registry"
    }
}
