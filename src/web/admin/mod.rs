mod authors;
mod comics;
mod dashboard;

pub use authors::{authors_index, create_author, new_author_form};
pub use comics::{comic_show, comics_index, create_comic, new_comic_form};
pub use dashboard::dashboard;

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::web::{AppState, flash::Flash};

/// Shared failure path for the admin forms: flash the reason and bounce.
async fn flash_and_redirect(
    state: &AppState,
    jar: CookieJar,
    session: Uuid,
    message: &str,
    target: &str,
) -> Response {
    state
        .sessions()
        .push_flash(session, Flash::danger(message))
        .await;
    (jar, Redirect::to(target)).into_response()
}
