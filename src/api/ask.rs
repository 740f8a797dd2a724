use serde::{Deserialize, Serialize};

use super::{ApiResponse, ApiState};
use crate::answer::ask;
use crate::core::lock::lock_mutex;

#[derive(Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub ok: bool,
    pub text: String,
    pub frames: usize,
}

pub fn handle_ask(state: &ApiState, body: &str) -> ApiResponse {
    let payload: AskRequest = match serde_json::from_str(body) {
        Ok(payload) => payload,
        Err(err) => return ApiResponse::text(400, &err.to_string()),
    };

    // Lock nur für den Snapshot halten, der Remote-Call läuft ohne
    let frames = lock_mutex(&state.memory, "api::ask").recent_frames();
    let answer = ask(state.answer.as_ref(), &payload.question, &frames);

    ApiResponse::json(
        200,
        &AskResponse {
            ok: answer.ok,
            text: answer.text,
            frames: frames.len(),
        },
    )
}
