use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use serde::Serialize;
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::answer::AnswerClient;
use crate::core::VisualMemory;

pub mod ask;
pub mod control;
pub mod status;

/// What the HTTP handlers share with the rest of the process.
pub struct ApiState {
    pub memory: Arc<Mutex<VisualMemory>>,
    pub answer: Arc<dyn AnswerClient>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    pub json: bool,
}

impl ApiResponse {
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, body, json: true },
            Err(err) => Self::text(500, &format!("serialization error: {}", err)),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            json: false,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self::text(status, "")
    }
}

pub fn start_api_server(bind: &str, state: Arc<ApiState>) -> anyhow::Result<thread::JoinHandle<()>> {
    let server = Server::http(bind).map_err(|e| anyhow::anyhow!("binding {}: {}", bind, e))?;
    log::info!("[api] server on {}", bind);

    let handle = thread::spawn(move || {
        for mut req in server.incoming_requests() {
            let url = req.url().to_string();
            let path = url.split_once('?').map(|(p, _)| p).unwrap_or(&url).to_string();
            let method = req.method().clone();

            let mut body = String::new();
            if let Err(err) = req.as_reader().read_to_string(&mut body) {
                let _ = req.respond(Response::from_string(err.to_string()).with_status_code(400));
                continue;
            }

            let response = route(&state, &method, &path, &body);
            log::debug!("[api] {} {} -> {}", method, path, response.status);

            let mut reply =
                Response::from_string(response.body).with_status_code(StatusCode(response.status));
            if response.json {
                if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
                    reply = reply.with_header(header);
                }
            }
            let _ = req.respond(reply);
        }
    });

    Ok(handle)
}

/// Dispatches one request. Kept free of I/O so it can be driven directly.
pub fn route(state: &ApiState, method: &Method, path: &str, body: &str) -> ApiResponse {
    let allowed = match path {
        "/health" | "/api/status" => Method::Get,
        "/api/control" | "/api/ask" => Method::Post,
        _ => return ApiResponse::empty(404),
    };
    if *method != allowed {
        return ApiResponse::empty(405);
    }

    match path {
        "/health" => ApiResponse::text(200, "ok"),
        "/api/status" => status::handle_status(state),
        "/api/control" => control::handle_control(state, body),
        "/api/ask" => ask::handle_ask(state, body),
        _ => ApiResponse::empty(404),
    }
}
