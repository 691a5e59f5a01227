//! Welcome handler.

use crate::response::success_one_ok;
use crate::service::WelcomeService;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};

pub async fn show(State(state): State<AppState>) -> impl IntoResponse {
    success_one_ok(WelcomeService::new(&state.app).find_one())
}
