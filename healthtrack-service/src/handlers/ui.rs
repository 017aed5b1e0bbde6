use crate::startup::AppState;
use askama::Template;
use axum::{extract::State, response::IntoResponse};

#[derive(Template)]
#[template(path = "ui.html")]
pub struct UiTemplate {
    pub auth_enabled: bool,
    pub version: &'static str,
}

pub async fn ui_page(State(state): State<AppState>) -> impl IntoResponse {
    UiTemplate {
        auth_enabled: state.auth.is_enabled(),
        version: env!("CARGO_PKG_VERSION"),
    }
}
