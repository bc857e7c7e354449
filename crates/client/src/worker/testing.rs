//! In-memory network for worker tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use porchlight_core::{Error, SiteRequest, SiteResponse};

use crate::fetch::Network;

/// Serves canned responses by URL; unknown URLs get a 404.
pub(crate) struct FakeNetwork {
    responses: Mutex<HashMap<String, SiteResponse>>,
    online: AtomicBool,
    calls: AtomicUsize,
}

impl FakeNetwork {
    pub(crate) fn new() -> Self {
        Self { responses: Mutex::new(HashMap::new()), online: AtomicBool::new(true), calls: AtomicUsize::new(0) }
    }

    pub(crate) fn serve(&self, url: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), SiteResponse::new(status, body));
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &SiteRequest) -> Result<SiteResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.online.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        let responses = self.responses.lock().unwrap();
        Ok(responses
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| SiteResponse::new(404, "Not Found")))
    }
}
