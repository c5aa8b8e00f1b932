//! Common test utilities for pusher-bridge integration tests
//!
//! Builds managers wired to the loopback client and mounts a mock HTTP
//! endpoint standing in for an application's auth server.

#![allow(dead_code)]

use crossbeam_channel::Receiver;
use pusher_bridge::{Diagnostic, InstanceManager, LoopbackFactory, OutboundMessage};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// A manager on the loopback client with both streams attached
pub struct Harness {
    pub manager: Arc<InstanceManager>,
    pub factory: Arc<LoopbackFactory>,
    pub events: Receiver<String>,
    pub diagnostics: Receiver<Diagnostic>,
}

impl Harness {
    pub fn new() -> Self {
        let factory = Arc::new(LoopbackFactory::new());
        let manager = Arc::new(InstanceManager::new(factory.clone()));
        let events = manager.multiplexer().attach_channel();
        let diagnostics = manager.multiplexer().attach_diagnostics();
        Self {
            manager,
            factory,
            events,
            diagnostics,
        }
    }

    /// Dispatch a command that must be acknowledged
    pub fn send(&self, id: &str, method: &str, args: &str) {
        self.manager
            .dispatch(id, method, args)
            .unwrap_or_else(|e| panic!("{} on '{}' failed: {}", method, id, e));
    }

    /// `init` with just an app key
    pub fn init(&self, id: &str, app_key: &str) {
        self.send(id, "init", &format!(r#"{{"appKey":"{}"}}"#, app_key));
    }

    pub fn subscribe(&self, id: &str, channel: &str) {
        self.send(id, "subscribe", &format!(r#"{{"channelName":"{}"}}"#, channel));
    }

    pub fn bind(&self, id: &str, channel: &str, event: &str) {
        self.send(
            id,
            "bind",
            &format!(r#"{{"channelName":"{}","eventName":"{}"}}"#, channel, event),
        );
    }

    pub fn unbind(&self, id: &str, channel: &str, event: &str) {
        self.send(
            id,
            "unbind",
            &format!(r#"{{"channelName":"{}","eventName":"{}"}}"#, channel, event),
        );
    }

    /// Decode everything published so far
    pub fn drain(&self) -> Vec<OutboundMessage> {
        drain_messages(&self.events)
    }

    pub fn drain_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.try_iter().collect()
    }
}

pub fn drain_messages(rx: &Receiver<String>) -> Vec<OutboundMessage> {
    rx.try_iter()
        .map(|json| OutboundMessage::from_json(&json).expect("outbound message decodes"))
        .collect()
}

pub const AUTH_PATH: &str = "/pusher/auth";

/// Mock auth endpoint answering `POST /pusher/auth` with a fixed reply
pub async fn auth_server(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(AUTH_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body.to_string()))
        .mount(&server)
        .await;
    server
}

pub fn auth_endpoint(server: &MockServer) -> String {
    format!("{}{}", server.uri(), AUTH_PATH)
}

/// Requests received so far by the mock endpoint
pub async fn auth_requests(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
}

/// Header value of a received request
pub fn header(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
