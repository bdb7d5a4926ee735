//! The request executor boundary.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use spacekit_protocol::{Request, ResponsePage, SYNC_PATH};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Executes one request against the service.
///
/// This is the only point where client operations suspend. Requests are
/// GETs and may be repeated safely.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Sends the request and decodes the response page.
    async fn execute(&self, request: &Request) -> ClientResult<ResponsePage>;
}

#[async_trait]
impl<E: RequestExecutor + ?Sized> RequestExecutor for Arc<E> {
    async fn execute(&self, request: &Request) -> ClientResult<ResponsePage> {
        (**self).execute(request).await
    }
}

/// A scripted executor for testing.
///
/// Responses are queued per path and handed out in order. Every request is
/// recorded, including those that found an empty queue.
#[derive(Debug, Default)]
pub struct MockExecutor {
    responses: Mutex<HashMap<String, VecDeque<ClientResult<ResponsePage>>>>,
    requests: Mutex<Vec<Request>>,
}

impl MockExecutor {
    /// Creates an executor with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a page for `path`.
    pub fn push_page(&self, path: &str, page: ResponsePage) {
        self.push(path, Ok(page));
    }

    /// Queues an error for `path`.
    pub fn push_error(&self, path: &str, error: ClientError) {
        self.push(path, Err(error));
    }

    /// Queues a sync page.
    pub fn push_sync_page(&self, page: ResponsePage) {
        self.push_page(SYNC_PATH, page);
    }

    fn push(&self, path: &str, response: ClientResult<ResponsePage>) {
        self.responses
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    /// All requests seen so far, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// Number of requests seen so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of responses still queued across all paths.
    pub fn pending(&self) -> usize {
        self.responses.lock().values().map(VecDeque::len).sum()
    }
}

#[async_trait]
impl RequestExecutor for MockExecutor {
    async fn execute(&self, request: &Request) -> ClientResult<ResponsePage> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(ClientError::transport_fatal(format!(
                    "no scripted response for {}",
                    request.path
                )))
            })
    }
}
