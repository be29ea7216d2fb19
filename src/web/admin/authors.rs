use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info};

use super::flash_and_redirect;
use crate::{
    api::NewAuthor,
    web::{
        AppState,
        auth::{ensure_session, require_token},
        flash::Flash,
        session::TOKEN_KEY,
        slug::slugify,
        templates::{render_admin_authors, render_author_form},
        uploads::{read_form, strip_html_tags},
    },
};

/// GET /admin/authors
pub async fn authors_index(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;
    let time_left = match require_token(&state, session).await {
        Ok(time_left) => time_left,
        Err(redirect) => return (jar, redirect).into_response(),
    };

    match state.api().all_authors().await {
        Ok(page) => {
            let flashes = state.sessions().take_flashes(session).await;
            (
                jar,
                Html(render_admin_authors(&page, &time_left, &flashes)),
            )
                .into_response()
        }
        Err(err) => {
            error!(%err, "failed to fetch authors for admin list");
            state
                .sessions()
                .push_flash(session, Flash::danger(err.to_string()))
                .await;
            (jar, Redirect::to("/admin")).into_response()
        }
    }
}

/// GET /admin/authors/new
pub async fn new_author_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;
    let time_left = match require_token(&state, session).await {
        Ok(time_left) => time_left,
        Err(redirect) => return (jar, redirect).into_response(),
    };

    let flashes = state.sessions().take_flashes(session).await;
    (jar, Html(render_author_form(&time_left, &flashes))).into_response()
}

/// POST /admin/authors — validates the form and relays the creation to the
/// backend with the session's bearer token.
pub async fn create_author(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Response {
    let (jar, session) = ensure_session(&state, jar).await;
    if let Err(redirect) = require_token(&state, session).await {
        return (jar, redirect).into_response();
    }

    let mut form = match read_form(multipart, "profileImage").await {
        Ok(form) => form,
        Err(err) => {
            return flash_and_redirect(&state, jar, session, err.message(), "/admin/authors/new")
                .await;
        }
    };

    let Some(image) = form.image.take() else {
        return flash_and_redirect(
            &state,
            jar,
            session,
            "No portrait image was provided.",
            "/admin/authors/new",
        )
        .await;
    };

    let firstname = strip_html_tags(form.text("firstname").trim());
    let lastname = strip_html_tags(form.text("lastname").trim());
    if firstname.is_empty() || lastname.is_empty() {
        return flash_and_redirect(
            &state,
            jar,
            session,
            "Please provide both a first and a last name.",
            "/admin/authors/new",
        )
        .await;
    }

    let fullname = format!("{firstname} {lastname}");
    let author = NewAuthor {
        slug: slugify(&fullname),
        birthdate: strip_html_tags(form.text("birthdate")),
        bio: strip_html_tags(form.text("biography")),
        website: strip_html_tags(form.text("website")),
        image,
        name: fullname.clone(),
    };

    let token = state
        .sessions()
        .value(session, TOKEN_KEY)
        .await
        .unwrap_or_default();

    match state.api().create_author(&token, author).await {
        Ok(()) => {
            info!(%fullname, "author created");
            state
                .sessions()
                .push_flash(
                    session,
                    Flash::success(format!("Author \"{fullname}\" added successfully.")),
                )
                .await;
        }
        Err(err) => {
            error!(%err, %fullname, "failed to create author");
            state
                .sessions()
                .push_flash(session, Flash::danger(err.to_string()))
                .await;
        }
    }

    (jar, Redirect::to("/admin/authors/new")).into_response()
}
