//! Mock transports shared by the integration tests.
#![allow(dead_code)]

use parking_lot::Mutex;
use reqcache::{
    response_future, transformer, AsyncClient, Client, HttpRequest, HttpResponse, RawResponse,
    ResponseBody, ResponseCallback, ResponseFuture, ResponseType, Transformer, TransportError,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Decodes the body as UTF-8 text.
pub fn as_text() -> Transformer<String> {
    transformer(|raw| HttpResponse::from_raw(raw, |bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

/// Keeps the body as raw bytes.
pub fn as_bytes() -> Transformer<Vec<u8>> {
    transformer(|raw| HttpResponse::from_raw(raw, |bytes| bytes))
}

/// Blocking transport answering `"response #n"`, `n` being the call number.
pub struct MockClient {
    pub calls: AtomicUsize,
    pub shutdown_hooks: AtomicUsize,
    pub fail: AtomicBool,
    pub delay: Duration,
    pub seen_types: Mutex<Vec<ResponseType>>,
    native: String,
}

impl MockClient {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            shutdown_hooks: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay,
            seen_types: Mutex::new(Vec::new()),
            native: "mock-native".to_string(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Client for MockClient {
    type Native = String;

    fn native_client(&self) -> &String {
        &self.native
    }

    fn request_as<T: ResponseBody>(
        &self,
        _request: &dyn HttpRequest,
        transformer: &Transformer<T>,
        response_type: ResponseType,
    ) -> Result<HttpResponse<T>, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen_types.lock().push(response_type);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Connection(format!("call #{n} refused")));
        }
        Ok(transformer(RawResponse::new(200, format!("response #{n}"))))
    }

    fn close(&self) -> Vec<TransportError> {
        vec![TransportError::Other("socket already closed".to_string())]
    }

    fn register_shutdown_hook(&self) {
        self.shutdown_hooks.fetch_add(1, Ordering::SeqCst);
    }
}

/// Async transport answering `"async response #n"` after `delay`.
pub struct MockAsyncClient {
    pub calls: AtomicUsize,
    pub shutdown_hooks: AtomicUsize,
    pub fail: AtomicBool,
    pub running: AtomicBool,
    pub delay: Duration,
    native: u16,
}

impl MockAsyncClient {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            shutdown_hooks: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            running: AtomicBool::new(true),
            delay,
            native: 8080,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AsyncClient for MockAsyncClient {
    type Native = u16;

    fn native_client(&self) -> &u16 {
        &self.native
    }

    fn request_as<T: ResponseBody>(
        &self,
        _request: &dyn HttpRequest,
        transformer: &Transformer<T>,
        callback: Option<ResponseCallback<T>>,
        _response_type: ResponseType,
    ) -> ResponseFuture<T> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let fail = self.fail.load(Ordering::SeqCst);
        let delay = self.delay;
        let transformer = transformer.clone();

        response_future(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let result = if fail {
                Err(TransportError::Timeout(delay))
            } else {
                Ok(transformer(RawResponse::new(200, format!("async response #{n}"))))
            };
            if let Some(callback) = callback {
                callback(&result);
            }
            result
        })
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn register_shutdown_hook(&self) {
        self.shutdown_hooks.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self) -> Vec<TransportError> {
        self.running.store(false, Ordering::SeqCst);
        Vec::new()
    }
}
