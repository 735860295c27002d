//! ScriptedNetwork: a [`Network`] that answers from a script.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::net::{Envelope, Network, NetworkError, Upload};

/// Request verb, for scripting and inspecting calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Upload,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Upload => "UPLOAD",
        })
    }
}

/// One call received by a [`ScriptedNetwork`].
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub endpoint: String,
    /// Query params for GET, the body for POST/PUT, extra fields for uploads.
    pub body: Value,
}

type Reply = Result<Envelope, NetworkError>;

/// A headless network collaborator.
///
/// Replies are scripted per `(method, endpoint)` and consumed in order; the
/// last scripted reply for a route repeats. Unscripted routes fail with a
/// 404 [`NetworkError::Status`]. Every call is recorded, and routes can be
/// given an artificial latency to exercise interleaving.
#[derive(Debug, Default)]
pub struct ScriptedNetwork {
    replies: RefCell<HashMap<(Method, String), VecDeque<Reply>>>,
    delays: RefCell<HashMap<String, Duration>>,
    requests: RefCell<Vec<Request>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `method` on `endpoint`.
    pub fn script(&self, method: Method, endpoint: &str, reply: Reply) -> &Self {
        self.replies
            .borrow_mut()
            .entry((method, endpoint.to_owned()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn on_get(&self, endpoint: &str, envelope: Envelope) -> &Self {
        self.script(Method::Get, endpoint, Ok(envelope))
    }

    pub fn on_post(&self, endpoint: &str, envelope: Envelope) -> &Self {
        self.script(Method::Post, endpoint, Ok(envelope))
    }

    /// Script a transport failure.
    pub fn fail(&self, method: Method, endpoint: &str, error: NetworkError) -> &Self {
        self.script(method, endpoint, Err(error))
    }

    /// Delay every reply on `endpoint` by `latency`.
    pub fn delay(&self, endpoint: &str, latency: Duration) -> &Self {
        self.delays.borrow_mut().insert(endpoint.to_owned(), latency);
        self
    }

    /// Every call received so far, in arrival order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    /// Calls received for one route.
    pub fn requests_to(&self, method: Method, endpoint: &str) -> Vec<Request> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == method && r.endpoint == endpoint)
            .cloned()
            .collect()
    }

    pub fn request_count(&self, method: Method, endpoint: &str) -> usize {
        self.requests_to(method, endpoint).len()
    }

    async fn answer(&self, method: Method, endpoint: &str, body: Value) -> Reply {
        self.requests.borrow_mut().push(Request {
            method,
            endpoint: endpoint.to_owned(),
            body,
        });
        let latency = self.delays.borrow().get(endpoint).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let mut replies = self.replies.borrow_mut();
        match replies.get_mut(&(method, endpoint.to_owned())) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Err(not_found(endpoint))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(not_found(endpoint))),
            None => Err(not_found(endpoint)),
        }
    }
}

fn not_found(endpoint: &str) -> NetworkError {
    NetworkError::Status {
        endpoint: endpoint.to_owned(),
        status: 404,
    }
}

#[async_trait(?Send)]
impl Network for ScriptedNetwork {
    async fn get(&self, endpoint: &str, params: &Map<String, Value>) -> Result<Envelope, NetworkError> {
        self.answer(Method::Get, endpoint, Value::Object(params.clone()))
            .await
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<Envelope, NetworkError> {
        self.answer(Method::Post, endpoint, body.clone()).await
    }

    async fn put(&self, endpoint: &str, body: &Value) -> Result<Envelope, NetworkError> {
        self.answer(Method::Put, endpoint, body.clone()).await
    }

    async fn delete(&self, endpoint: &str) -> Result<Envelope, NetworkError> {
        self.answer(Method::Delete, endpoint, Value::Null).await
    }

    async fn upload_file(
        &self,
        endpoint: &str,
        file: &Upload,
        extra: &Map<String, Value>,
    ) -> Result<Envelope, NetworkError> {
        let mut body = extra.clone();
        body.insert("file".into(), Value::String(file.file_name.clone()));
        self.answer(Method::Upload, endpoint, Value::Object(body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replies_in_order_then_repeat_last() {
        let network = ScriptedNetwork::new();
        network
            .on_get("/a", Envelope::ok(json!(1)))
            .on_get("/a", Envelope::ok(json!(2)));
        let params = Map::new();
        assert_eq!(network.get("/a", &params).await.unwrap().payload, json!(1));
        assert_eq!(network.get("/a", &params).await.unwrap().payload, json!(2));
        assert_eq!(network.get("/a", &params).await.unwrap().payload, json!(2));
        assert_eq!(network.request_count(Method::Get, "/a"), 3);
    }

    #[tokio::test]
    async fn unscripted_routes_fail() {
        let network = ScriptedNetwork::new();
        network.on_post("/a", Envelope::ok(json!(1)));
        let err = network.get("/a", &Map::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "/a answered with status 404");
    }

    #[tokio::test]
    async fn records_bodies() {
        let network = ScriptedNetwork::new();
        network.fail(Method::Put, "/x", NetworkError::Transport("down".into()));
        let _ = network.put("/x", &json!({"a": 1})).await;
        let upload = Upload {
            file_name: "a.txt".into(),
            content_type: "text/plain".into(),
            bytes: b"hi".to_vec(),
        };
        let extra = json!({"folder": "docs"});
        let _ = network
            .upload_file("/files", &upload, extra.as_object().unwrap())
            .await;
        let requests = network.requests();
        assert_eq!(requests[0].body, json!({"a": 1}));
        assert_eq!(requests[1].method, Method::Upload);
        assert_eq!(requests[1].body, json!({"folder": "docs", "file": "a.txt"}));
    }
}
