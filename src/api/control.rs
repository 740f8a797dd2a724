use serde::{Deserialize, Serialize};

use super::{ApiResponse, ApiState};
use crate::core::lock::lock_mutex;
use crate::core::{AcquireFailure, SessionError, SessionState, VisualMemory};

#[derive(Deserialize)]
pub struct ControlRequest {
    pub action: String,
}

#[derive(Serialize)]
pub struct ControlResponse {
    pub ok: bool,
    pub message: String,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<AcquireFailure>,
}

pub fn handle_control(state: &ApiState, body: &str) -> ApiResponse {
    let payload: ControlRequest = match serde_json::from_str(body) {
        Ok(payload) => payload,
        Err(err) => return ApiResponse::text(400, &err.to_string()),
    };

    let mut memory = lock_mutex(&state.memory, "api::control");
    let outcome = dispatch_control(&mut memory, &payload.action);
    let (ok, message, reason) = match outcome {
        Ok(message) => (true, message, None),
        Err(ControlFailure::Unknown) => (false, "unknown action".to_string(), None),
        Err(ControlFailure::Session(err)) => (false, err.to_string(), err.acquire_reason()),
    };

    ApiResponse::json(
        200,
        &ControlResponse {
            ok,
            message,
            state: memory.state(),
            reason,
        },
    )
}

enum ControlFailure {
    Unknown,
    Session(SessionError),
}

fn dispatch_control(memory: &mut VisualMemory, action: &str) -> Result<String, ControlFailure> {
    match action {
        "start" => memory
            .start()
            .map(|()| format!("recording ({})", memory.mode()))
            .map_err(ControlFailure::Session),
        "stop" => {
            memory.stop();
            Ok("recording stopped".to_string())
        }
        "switch_camera" => memory
            .switch_mode()
            .map(|mode| format!("camera switched to {}", mode))
            .map_err(ControlFailure::Session),
        _ => Err(ControlFailure::Unknown),
    }
}
