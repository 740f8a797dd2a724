use super::{ApiResponse, ApiState};
use crate::core::lock::lock_mutex;

pub fn handle_status(state: &ApiState) -> ApiResponse {
    let status = lock_mutex(&state.memory, "api::status").status();
    ApiResponse::json(200, &status)
}
