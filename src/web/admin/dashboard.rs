use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::web::{
    AppState,
    auth::{ensure_session, require_token},
    session::TOKEN_KEY,
    templates::render_admin_dashboard,
};

/// GET /admin
pub async fn dashboard(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;
    let time_left = match require_token(&state, session).await {
        Ok(time_left) => time_left,
        Err(redirect) => return (jar, redirect).into_response(),
    };

    let token_present = state.sessions().value(session, TOKEN_KEY).await.is_some();
    let flashes = state.sessions().take_flashes(session).await;
    (
        jar,
        Html(render_admin_dashboard(token_present, &time_left, &flashes)),
    )
        .into_response()
}
