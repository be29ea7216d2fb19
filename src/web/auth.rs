use axum::{
    extract::{Form, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use cookie::time::Duration as CookieDuration;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    api::LoginOutcome,
    web::{
        AppState,
        flash::Flash,
        session::{EXPIRES_AT_KEY, SessionAccess, TOKEN_KEY, TimeLeft, TokenStatus},
        templates::render_login_page,
    },
};

/// Cookie holding the server-side session id.
pub const SESSION_COOKIE: &str = "comics_session";

/// Browser-side lifetime of the session cookie. The token's own expiry is
/// what actually gates the admin pages.
const SESSION_COOKIE_TTL_DAYS: i64 = 1;

/// Session entry remembering the last email typed into the login form.
const LAST_EMAIL_KEY: &str = "login_last_email";

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Extracts the session id from the cookie, if the cookie parses.
pub fn session_id(jar: &CookieJar) -> Option<Uuid> {
    let cookie = jar.get(SESSION_COOKIE)?;
    Uuid::parse_str(cookie.value()).ok()
}

fn session_cookie(id: Uuid) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(CookieDuration::days(SESSION_COOKIE_TTL_DAYS));
    cookie
}

/// Resolves the visitor's session, creating one when the cookie is missing,
/// malformed, or points at a session this process no longer knows.
pub async fn ensure_session(state: &AppState, jar: CookieJar) -> (CookieJar, Uuid) {
    if let Some(id) = session_id(&jar) {
        if state.sessions().contains(id).await {
            return (jar, id);
        }
    }

    let id = state.sessions().create().await;
    let jar = jar.add(session_cookie(id));
    (jar, id)
}

/// Gate for protected pages: checks the stored token, and on `Absent` or
/// `Expired` flashes the reason and redirects to the login form.
pub async fn require_token(state: &AppState, session: Uuid) -> Result<TimeLeft, Redirect> {
    match state.sessions().check_token(session, Utc::now()).await {
        TokenStatus::Valid(time_left) => Ok(time_left),
        TokenStatus::Absent => {
            state
                .sessions()
                .push_flash(session, Flash::danger("You must sign in to access this page."))
                .await;
            Err(Redirect::to("/login"))
        }
        TokenStatus::Expired => {
            state
                .sessions()
                .push_flash(
                    session,
                    Flash::danger("Your session has expired, please sign in again."),
                )
                .await;
            Err(Redirect::to("/login"))
        }
    }
}

/// GET /login — already-authenticated visitors go straight to the admin
/// dashboard.
pub async fn login_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;

    let status = state.sessions().check_token(session, Utc::now()).await;
    if let TokenStatus::Valid(_) = status {
        return (jar, Redirect::to("/admin")).into_response();
    }

    let flashes = state.sessions().take_flashes(session).await;
    let last_email = state
        .sessions()
        .value(session, LAST_EMAIL_KEY)
        .await
        .unwrap_or_default();
    (jar, Html(render_login_page(&flashes, &last_email))).into_response()
}

/// POST /login_check — relays the credentials to the backend and stores the
/// issued token plus its expiry in the session.
pub async fn process_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;
    let email = form.email.trim().to_string();

    let outcome = match state.api().login(&email, &form.password).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(%err, "login relay failed");
            state
                .sessions()
                .push_flash(
                    session,
                    Flash::danger("Could not reach the backend API. Please try again later."),
                )
                .await;
            return (jar, Redirect::to("/login")).into_response();
        }
    };

    match outcome {
        LoginOutcome::Success(response) => {
            let message = response
                .message
                .unwrap_or_else(|| "Signed in successfully.".to_string());
            state
                .sessions()
                .with_session(session, |data| {
                    data.insert(TOKEN_KEY, response.token);
                    // The expiry stays the RFC 3339 string the backend sent;
                    // the token checker parses it on every protected request.
                    if let Some(expires_at) = response.expires_at {
                        data.insert(EXPIRES_AT_KEY, expires_at);
                    }
                    data.remove(LAST_EMAIL_KEY);
                    data.push_flash(Flash::success(message));
                })
                .await;
            info!("backend accepted login");
            (jar, Redirect::to("/admin")).into_response()
        }
        LoginOutcome::InvalidCredentials => {
            state
                .sessions()
                .with_session(session, |data| {
                    data.insert(LAST_EMAIL_KEY, email);
                    data.push_flash(Flash::danger("Incorrect email or password."));
                })
                .await;
            (jar, Redirect::to("/login")).into_response()
        }
        LoginOutcome::ServerError => {
            state
                .sessions()
                .push_flash(
                    session,
                    Flash::danger("The backend API reported an internal error (500)."),
                )
                .await;
            (jar, Redirect::to("/login")).into_response()
        }
        LoginOutcome::Unexpected(status) => {
            state
                .sessions()
                .push_flash(
                    session,
                    Flash::danger(format!("Unexpected backend response: HTTP {status}.")),
                )
                .await;
            (jar, Redirect::to("/login")).into_response()
        }
    }
}

/// POST /logout — drops the server-side session entirely and hands the
/// browser a fresh, unauthenticated one carrying the goodbye notice.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(old) = session_id(&jar) {
        state.sessions().destroy(old).await;
    }

    let fresh = state.sessions().create().await;
    state
        .sessions()
        .push_flash(fresh, Flash::success("You have been signed out."))
        .await;

    let jar = jar.add(session_cookie(fresh));
    (jar, Redirect::to("/login")).into_response()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{config::AppConfig, web::flash::FlashLevel};

    fn test_state() -> AppState {
        let config = AppConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            port: 0,
        };
        AppState::new(&config).unwrap()
    }

    #[tokio::test]
    async fn guard_bounces_visitors_without_a_token_to_the_login_form() {
        let state = test_state();
        let session = state.sessions().create().await;

        let result = require_token(&state, session).await;
        assert!(result.is_err());

        let flashes = state.sessions().take_flashes(session).await;
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].level, FlashLevel::Danger);
        assert_eq!(flashes[0].message, "You must sign in to access this page.");
    }

    #[tokio::test]
    async fn guard_bounces_expired_tokens_and_clears_the_credentials() {
        let state = test_state();
        let session = state.sessions().create().await;
        state
            .sessions()
            .with_session(session, |data| {
                data.insert(TOKEN_KEY, "stale-jwt");
                data.insert(
                    EXPIRES_AT_KEY,
                    (Utc::now() - Duration::hours(1)).to_rfc3339(),
                );
            })
            .await;

        let result = require_token(&state, session).await;
        assert!(result.is_err());

        let flashes = state.sessions().take_flashes(session).await;
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].level, FlashLevel::Danger);
        assert_eq!(
            flashes[0].message,
            "Your session has expired, please sign in again."
        );
        assert_eq!(state.sessions().value(session, TOKEN_KEY).await, None);
        assert_eq!(state.sessions().value(session, EXPIRES_AT_KEY).await, None);
    }

    #[tokio::test]
    async fn guard_passes_valid_tokens_through_without_flashing() {
        let state = test_state();
        let session = state.sessions().create().await;
        state
            .sessions()
            .with_session(session, |data| {
                data.insert(TOKEN_KEY, "live-jwt");
                data.insert(
                    EXPIRES_AT_KEY,
                    (Utc::now() + Duration::hours(2)).to_rfc3339(),
                );
            })
            .await;

        let time_left = require_token(&state, session)
            .await
            .expect("a live token must pass the guard");
        assert!(time_left.hours_left >= 1);
        assert!(state.sessions().take_flashes(session).await.is_empty());
    }
}
