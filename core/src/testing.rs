//! Scripted transport shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Answers requests from a FIFO script. A request whose path has a gate
/// waits for the gate's sender instead.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, status: u16, body: &str) {
        self.script.lock().unwrap().push_back(Ok(response(status, body)));
    }

    pub(crate) fn fail(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(ApiError::Network(message.to_string())));
    }

    /// Hold requests to `path` until the returned sender fires.
    pub(crate) fn gate(&self, path: &str) -> oneshot::Sender<HttpResponse> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(path.to_string(), rx);
        tx
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub(crate) fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        let gate = self.gates.lock().unwrap().remove(&request.path);
        if let Some(gate) = gate {
            return gate
                .await
                .map_err(|_| ApiError::Network("gate dropped".to_string()));
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response for {}", request.path))
    }
}
