use axum::{
    extract::{Multipart, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info};

use super::flash_and_redirect;
use crate::{
    api::{NewComic, PAGE_SIZE},
    web::{
        AppState,
        auth::{ensure_session, require_token},
        catalog::PageQuery,
        flash::Flash,
        session::TOKEN_KEY,
        slug::slugify,
        templates::{render_admin_comic_show, render_admin_comics, render_comic_form},
        uploads::{read_form, strip_html_tags},
    },
};

/// GET /admin/comics
pub async fn comics_index(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<PageQuery>,
) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;
    let time_left = match require_token(&state, session).await {
        Ok(time_left) => time_left,
        Err(redirect) => return (jar, redirect).into_response(),
    };

    let page_number = params.page.unwrap_or(1).max(1);
    match state.api().comics(page_number, PAGE_SIZE).await {
        Ok(page) => {
            let flashes = state.sessions().take_flashes(session).await;
            (
                jar,
                Html(render_admin_comics(&page, page_number, &time_left, &flashes)),
            )
                .into_response()
        }
        Err(err) => {
            error!(%err, "failed to fetch comics for admin list");
            state
                .sessions()
                .push_flash(session, Flash::danger(err.to_string()))
                .await;
            (jar, Redirect::to("/admin")).into_response()
        }
    }
}

/// GET /admin/comics/{slug}
pub async fn comic_show(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(slug): Path<String>,
) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;
    let time_left = match require_token(&state, session).await {
        Ok(time_left) => time_left,
        Err(redirect) => return (jar, redirect).into_response(),
    };

    match state.api().comic_by_slug(&slug).await {
        Ok(comic) => {
            let flashes = state.sessions().take_flashes(session).await;
            (
                jar,
                Html(render_admin_comic_show(&comic, &time_left, &flashes)),
            )
                .into_response()
        }
        Err(err) => {
            error!(%err, %slug, "failed to fetch comic for admin view");
            state
                .sessions()
                .push_flash(session, Flash::danger(err.to_string()))
                .await;
            (jar, Redirect::to("/admin/comics")).into_response()
        }
    }
}

/// GET /admin/comics/new — the form needs the author list for its select.
pub async fn new_comic_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;
    let time_left = match require_token(&state, session).await {
        Ok(time_left) => time_left,
        Err(redirect) => return (jar, redirect).into_response(),
    };

    match state.api().all_authors().await {
        Ok(authors) => {
            let flashes = state.sessions().take_flashes(session).await;
            (
                jar,
                Html(render_comic_form(&authors.authors, &time_left, &flashes)),
            )
                .into_response()
        }
        Err(err) => {
            error!(%err, "failed to fetch authors for comic form");
            state
                .sessions()
                .push_flash(session, Flash::danger(err.to_string()))
                .await;
            (jar, Redirect::to("/admin/comics")).into_response()
        }
    }
}

/// POST /admin/comics — validates the form and relays the creation to the
/// backend with the session's bearer token.
pub async fn create_comic(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;
    if let Err(redirect) = require_token(&state, session).await {
        return (jar, redirect).into_response();
    }

    let mut form = match read_form(multipart, "frontCover").await {
        Ok(form) => form,
        Err(err) => {
            return flash_and_redirect(&state, jar, session, err.message(), "/admin/comics/new")
                .await;
        }
    };

    let title = strip_html_tags(form.text("title").trim());
    if title.is_empty() {
        return flash_and_redirect(&state, jar, session, "A title is required.", "/admin/comics/new")
            .await;
    }

    let Some(front_cover) = form.image.take() else {
        return flash_and_redirect(
            &state,
            jar,
            session,
            "A front cover image is required.",
            "/admin/comics/new",
        )
        .await;
    };

    // The slug always derives from the title; whatever was typed into the
    // slug field is ignored.
    let slug = slugify(&title);
    let comic = NewComic {
        slug,
        collection: strip_html_tags(form.text("collection")),
        tome: strip_html_tags(form.text("tome")),
        description: strip_html_tags(form.text("description")),
        author_id: form.text("authorId").trim().parse().unwrap_or(0),
        front_cover,
        title: title.clone(),
    };

    let token = state
        .sessions()
        .value(session, TOKEN_KEY)
        .await
        .unwrap_or_default();

    match state.api().create_comic(&token, comic).await {
        Ok(()) => {
            info!(%title, "comic created");
            state
                .sessions()
                .push_flash(
                    session,
                    Flash::success(format!("Comic \"{title}\" added successfully.")),
                )
                .await;
        }
        Err(err) => {
            error!(%err, %title, "failed to create comic");
            state
                .sessions()
                .push_flash(session, Flash::danger(err.to_string()))
                .await;
        }
    }

    (jar, Redirect::to("/admin/comics")).into_response()
}
