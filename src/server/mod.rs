//! JSON API over HTTP
//!
//! A `tiny_http` server on a background thread. Each request is
//! authenticated (when a shared token is configured), its body read up to
//! [`MAX_BODY_BYTES`], and then handed to [`router::dispatch`].

mod handlers;
mod router;
mod types;

pub use router::dispatch;
pub use types::{ApiError, ApiResponse, ApiState, status_for};

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{error, info, warn};

pub const AUTH_HEADER: &str = "X-Trailquest-Token";
pub const MAX_BODY_BYTES: usize = 1024 * 1024; // 1 MiB

/// A running server; dropping the handle does not stop it
pub struct ServerHandle {
    server: Arc<Server>,
    addr: Option<SocketAddr>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Bound address (useful when started on port 0)
    pub fn addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    /// Stop accepting requests and wait for the worker thread
    pub fn shutdown(mut self) {
        self.server.unblock();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("[trailquest:http] Server thread panicked");
            }
        }
    }
}

/// Bind and start serving in a background thread
pub fn start_http_server(
    state: ApiState,
    bind: &str,
    port: u16,
    auth_token: Option<String>,
) -> Result<ServerHandle> {
    let bind_addr = format!("{}:{}", bind, port);
    let server = Server::http(&bind_addr)
        .map_err(|e| anyhow!("Failed to start server on {}: {}", bind_addr, e))?;
    let server = Arc::new(server);
    let addr = server.server_addr().to_ip();

    let auth_token = auth_token.filter(|t| !t.trim().is_empty());
    info!(
        "[trailquest:http] Server listening on http://{} (auth: {})",
        addr.map(|a| a.to_string()).unwrap_or(bind_addr),
        if auth_token.is_some() { "enabled" } else { "disabled" }
    );

    let worker = Arc::clone(&server);
    let thread = thread::Builder::new()
        .name("trailquest-http".to_string())
        .spawn(move || {
            for request in worker.incoming_requests() {
                handle_request(&state, auth_token.as_deref(), request);
            }
            info!("[trailquest:http] Server stopped");
        })?;

    Ok(ServerHandle {
        server,
        addr,
        thread: Some(thread),
    })
}

fn handle_request(state: &ApiState, auth_token: Option<&str>, mut request: Request) {
    let method = request.method().to_string();
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));

    if !is_authorized(&request, auth_token) {
        warn!("[trailquest:http] Unauthorized {} {}", method, path);
        respond(request, ApiResponse::error(401, "unauthorized", "missing or invalid token"));
        return;
    }

    let body = if matches!(request.method(), Method::Post | Method::Patch | Method::Put) {
        match read_request_body(&mut request) {
            Ok(body) => body,
            Err(response) => {
                respond(request, response);
                return;
            }
        }
    } else {
        String::new()
    };

    let response = dispatch(state, &method, path, query, &body);
    respond(request, response);
}

fn is_authorized(request: &Request, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };

    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(AUTH_HEADER))
        .map(|h| h.value.as_str() == expected)
        .unwrap_or(false)
}

fn read_request_body(request: &mut Request) -> Result<String, ApiResponse> {
    let mut body = String::new();
    let mut reader = request.as_reader().take((MAX_BODY_BYTES + 1) as u64);
    if let Err(e) = reader.read_to_string(&mut body) {
        error!("[trailquest:http] Failed to read body: {}", e);
        return Err(ApiResponse::error(400, "bad_request", e.to_string()));
    }

    if body.len() > MAX_BODY_BYTES {
        return Err(ApiResponse::error(
            413,
            "payload_too_large",
            format!("body exceeds {} bytes", MAX_BODY_BYTES),
        ));
    }

    Ok(body)
}

fn respond(request: Request, response: ApiResponse) {
    let body = serde_json::to_string(&response.body)
        .unwrap_or_else(|_| "{\"error\":\"serialize\"}".to_string());
    let mut reply = Response::from_string(body).with_status_code(response.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        reply = reply.with_header(header);
    }
    if let Err(e) = request.respond(reply) {
        warn!("[trailquest:http] Failed to send response: {}", e);
    }
}
