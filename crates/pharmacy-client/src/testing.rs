//! Scripted transport for unit tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::TransportError;
use crate::transport::{Method, Transport};

type Reply = Result<Value, TransportError>;

enum Scripted {
    Ready(Reply),
    Gated(oneshot::Receiver<Reply>),
}

/// A request as the transport saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub credential: Option<String>,
}

/// Replays queued replies in order and records every request.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
    credential: RwLock<Option<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, body: Value) {
        self.replies.lock().push_back(Scripted::Ready(Ok(body)));
    }

    pub fn push_err(&self, err: TransportError) {
        self.replies.lock().push_back(Scripted::Ready(Err(err)));
    }

    pub fn push_status(&self, status: u16, message: Option<&str>) {
        self.push_err(TransportError::Api {
            status,
            message: message.map(str::to_string),
        });
    }

    /// Queues a reply that resolves only when the returned sender fires.
    pub fn push_gated(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().push_back(Scripted::Gated(rx));
        tx
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Reply {
        self.requests.lock().push(RecordedRequest {
            method,
            path: path.to_string(),
            body,
            credential: self.credential(),
        });

        let scripted = self.replies.lock().pop_front();
        match scripted {
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::Network("gate dropped".into()))),
            None => Err(TransportError::Network("no scripted reply".into())),
        }
    }

    fn set_credential(&self, token: Option<String>) {
        *self.credential.write() = token;
    }

    fn credential(&self) -> Option<String> {
        self.credential.read().clone()
    }
}
