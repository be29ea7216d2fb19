use axum::{
    Router,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

use crate::web::{AppState, admin, auth, catalog};

const ROBOTS_TXT_BODY: &str = include_str!("../../robots.txt");

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(catalog::home_page))
        .route("/comics", get(catalog::comics_index))
        .route("/comics/:slug", get(catalog::comic_show))
        .route("/authors", get(catalog::authors_index))
        .route("/authors/:slug", get(catalog::author_show))
        .route("/login", get(auth::login_page))
        .route("/login_check", post(auth::process_login))
        .route("/logout", post(auth::logout))
        .route("/admin", get(admin::dashboard))
        .route(
            "/admin/comics",
            get(admin::comics_index).post(admin::create_comic),
        )
        .route("/admin/comics/new", get(admin::new_comic_form))
        .route("/admin/comics/:slug", get(admin::comic_show))
        .route(
            "/admin/authors",
            get(admin::authors_index).post(admin::create_author),
        )
        .route("/admin/authors/new", get(admin::new_author_form))
        .route("/healthz", get(healthz))
        .route("/robots.txt", get(robots_txt))
        .with_state(state)
}

async fn robots_txt() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ROBOTS_TXT_BODY,
    )
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
