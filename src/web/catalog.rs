use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::error;

use crate::{
    api::PAGE_SIZE,
    web::{
        AppState,
        auth::ensure_session,
        flash::Flash,
        templates::{
            render_author_show, render_authors_index, render_comic_show, render_comics_index,
            render_error_page, render_home,
        },
    },
};

#[derive(Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

impl PageQuery {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// GET / — latest comics plus the author list; the one public page that
/// degrades to an error page when the backend is unreachable.
pub async fn home_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;

    let comics = state.api().comics(1, PAGE_SIZE).await;
    let authors = state.api().all_authors().await;

    match (comics, authors) {
        (Ok(comics), Ok(authors)) => {
            // Flashes are drained only once a page renders them; an outage
            // must not swallow pending notices.
            let flashes = state.sessions().take_flashes(session).await;
            (
                jar,
                Html(render_home(&comics.comics, &authors.authors, &flashes)),
            )
                .into_response()
        }
        (Err(err), _) | (_, Err(err)) => {
            error!(%err, "failed to fetch home page data");
            (
                jar,
                Html(render_error_page(
                    "The comics catalog could not be loaded. Please try again later.",
                )),
            )
                .into_response()
        }
    }
}

/// GET /comics
pub async fn comics_index(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<PageQuery>,
) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;

    match state.api().comics(params.page(), PAGE_SIZE).await {
        Ok(page) => {
            let flashes = state.sessions().take_flashes(session).await;
            (
                jar,
                Html(render_comics_index(&page, params.page(), &flashes)),
            )
                .into_response()
        }
        Err(err) => {
            error!(%err, "failed to fetch comics list");
            (
                jar,
                Html(render_error_page(
                    "The comics list could not be loaded. Please try again later.",
                )),
            )
                .into_response()
        }
    }
}

/// GET /comics/{slug} — backend errors flash and bounce back to the list.
pub async fn comic_show(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(slug): Path<String>,
) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;

    match state.api().comic_by_slug(&slug).await {
        Ok(comic) => {
            let flashes = state.sessions().take_flashes(session).await;
            (jar, Html(render_comic_show(&comic, &flashes))).into_response()
        }
        Err(err) => {
            error!(%err, %slug, "failed to fetch comic");
            state
                .sessions()
                .push_flash(session, Flash::danger(err.to_string()))
                .await;
            (jar, Redirect::to("/comics")).into_response()
        }
    }
}

/// GET /authors
pub async fn authors_index(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<PageQuery>,
) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;

    match state.api().authors(params.page(), PAGE_SIZE).await {
        Ok(page) => {
            let flashes = state.sessions().take_flashes(session).await;
            (
                jar,
                Html(render_authors_index(&page, params.page(), &flashes)),
            )
                .into_response()
        }
        Err(err) => {
            error!(%err, "failed to fetch authors list");
            (
                jar,
                Html(render_error_page(
                    "The author list could not be loaded. Please try again later.",
                )),
            )
                .into_response()
        }
    }
}

/// GET /authors/{slug}
pub async fn author_show(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(slug): Path<String>,
) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;

    match state.api().author_by_slug(&slug).await {
        Ok(author) => {
            let flashes = state.sessions().take_flashes(session).await;
            (jar, Html(render_author_show(&author, &flashes))).into_response()
        }
        Err(err) => {
            error!(%err, %slug, "failed to fetch author");
            state
                .sessions()
                .push_flash(session, Flash::danger(err.to_string()))
                .await;
            (jar, Redirect::to("/authors")).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum_extra::extract::cookie::Cookie;

    use super::*;
    use crate::{config::AppConfig, web::auth::SESSION_COOKIE};

    fn state_with_unreachable_backend() -> AppState {
        let config = AppConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            port: 0,
        };
        AppState::new(&config).unwrap()
    }

    #[tokio::test]
    async fn backend_outage_keeps_pending_notices_for_the_next_render() {
        let state = state_with_unreachable_backend();
        let session = state.sessions().create().await;
        state
            .sessions()
            .push_flash(session, Flash::success("Comic \"Watchmen\" added successfully."))
            .await;
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, session.to_string()));

        let response = comics_index(State(state.clone()), jar, Query(PageQuery::default())).await;
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let flashes = state.sessions().take_flashes(session).await;
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].message, "Comic \"Watchmen\" added successfully.");
    }
}
