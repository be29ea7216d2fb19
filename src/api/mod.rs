use std::{fmt, time::Duration};

use reqwest::{Client, StatusCode, multipart};
use serde::Deserialize;

/// Page size used by every paginated catalog listing.
pub const PAGE_SIZE: u32 = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure surface of the backend catalog API.
#[derive(Debug)]
pub enum ApiError {
    /// The backend answered with a non-success status.
    Status { status: StatusCode, body: String },
    /// The backend could not be reached, or its payload did not decode.
    Transport(reqwest::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Status { status, body } => {
                write!(f, "backend API returned HTTP {status}: {body}")
            }
            ApiError::Transport(err) => write!(f, "could not reach the backend API: {err}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comic {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub tome: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "authorId", default)]
    pub author_id: Option<i64>,
    #[serde(rename = "frontCover", default)]
    pub front_cover: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub birthdate: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Paginated envelope returned by `GET /comics`.
#[derive(Debug, Clone, Deserialize)]
pub struct ComicsPage {
    #[serde(default)]
    pub comics: Vec<Comic>,
    #[serde(default = "default_page_count")]
    pub pages: u32,
}

/// Envelope returned by `GET /authors`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorsPage {
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default = "default_page_count")]
    pub pages: u32,
}

fn default_page_count() -> u32 {
    1
}

/// Success payload of `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "expiresAt", default)]
    pub expires_at: Option<String>,
}

/// Exhaustive outcome of a credential check against the backend.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Success(LoginResponse),
    InvalidCredentials,
    ServerError,
    Unexpected(StatusCode),
}

/// In-memory image relayed from a browser upload to the backend.
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Fields of a comic creation request.
#[derive(Debug, Clone)]
pub struct NewComic {
    pub title: String,
    pub slug: String,
    pub collection: String,
    pub tome: String,
    pub description: String,
    pub author_id: i64,
    pub front_cover: ImagePart,
}

/// Fields of an author creation request.
#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub name: String,
    pub slug: String,
    pub birthdate: String,
    pub bio: String,
    pub website: String,
    pub image: ImagePart,
}

/// Typed client for the backend catalog API. Every page this service renders
/// is assembled from these calls; nothing is persisted locally.
#[derive(Clone)]
pub struct CatalogApi {
    http: Client,
    base_url: String,
}

impl CatalogApi {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Relays a credential check to `POST /login`.
    ///
    /// Status handling mirrors what the login page tells the user: 401 means
    /// bad credentials, 500 means the backend fell over, anything else
    /// surfaces its status code.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginOutcome> {
        let response = self
            .http
            .post(self.url("/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(LoginOutcome::Success(response.json().await?)),
            StatusCode::UNAUTHORIZED => Ok(LoginOutcome::InvalidCredentials),
            StatusCode::INTERNAL_SERVER_ERROR => Ok(LoginOutcome::ServerError),
            other => Ok(LoginOutcome::Unexpected(other)),
        }
    }

    pub async fn comics(&self, page: u32, limit: u32) -> ApiResult<ComicsPage> {
        let response = self
            .http
            .get(self.url("/comics"))
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;
        decode(response).await
    }

    pub async fn comic_by_slug(&self, slug: &str) -> ApiResult<Comic> {
        let response = self
            .http
            .get(self.url(&format!("/comics/title/{slug}")))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn authors(&self, page: u32, limit: u32) -> ApiResult<AuthorsPage> {
        let response = self
            .http
            .get(self.url("/authors"))
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;
        decode(response).await
    }

    /// Unpaginated author list, used to fill the comic form's author select.
    pub async fn all_authors(&self) -> ApiResult<AuthorsPage> {
        let response = self.http.get(self.url("/authors")).send().await?;
        decode(response).await
    }

    pub async fn author_by_slug(&self, slug: &str) -> ApiResult<Author> {
        let response = self
            .http
            .get(self.url(&format!("/authors/name/{slug}")))
            .send()
            .await?;
        decode(response).await
    }

    /// Relays a comic creation as `multipart/form-data` with the session's
    /// bearer token.
    pub async fn create_comic(&self, token: &str, comic: NewComic) -> ApiResult<()> {
        let form = multipart::Form::new()
            .text("title", comic.title)
            .text("slug", comic.slug)
            .text("collection", comic.collection)
            .text("tome", comic.tome)
            .text("description", comic.description)
            .text("authorId", comic.author_id.to_string())
            .part("frontCover", image_part(comic.front_cover)?);

        let response = self
            .http
            .post(self.url("/comics"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        expect_success(response).await
    }

    /// Relays an author creation as `multipart/form-data` with the session's
    /// bearer token.
    pub async fn create_author(&self, token: &str, author: NewAuthor) -> ApiResult<()> {
        let form = multipart::Form::new()
            .text("name", author.name)
            .text("slug", author.slug)
            .text("birthdate", author.birthdate)
            .text("bio", author.bio)
            .text("website", author.website)
            .part("image", image_part(author.image)?);

        let response = self
            .http
            .post(self.url("/authors"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        expect_success(response).await
    }
}

fn image_part(image: ImagePart) -> ApiResult<multipart::Part> {
    let part = multipart::Part::bytes(image.bytes)
        .file_name(image.filename)
        .mime_str(&image.content_type)?;
    Ok(part)
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status { status, body });
    }
    Ok(response.json().await?)
}

async fn expect_success(response: reqwest::Response) -> ApiResult<()> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status { status, body });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comics_page_decodes_backend_payload() {
        let payload = serde_json::json!({
            "comics": [{
                "title": "Watchmen",
                "slug": "watchmen",
                "collection": "DC",
                "tome": 1,
                "description": "Who watches the watchmen?",
                "authorId": 7,
                "frontCover": "/uploads/watchmen.jpg"
            }],
            "page": 1,
            "pages": 4
        });

        let page: ComicsPage = serde_json::from_value(payload).unwrap();
        assert_eq!(page.pages, 4);
        assert_eq!(page.comics[0].slug, "watchmen");
        assert_eq!(page.comics[0].author_id, Some(7));
    }

    #[test]
    fn page_count_defaults_to_one_when_missing() {
        let page: ComicsPage = serde_json::from_value(serde_json::json!({
            "comics": []
        }))
        .unwrap();
        assert_eq!(page.pages, 1);
    }

    #[test]
    fn login_response_tolerates_missing_optional_fields() {
        let response: LoginResponse = serde_json::from_value(serde_json::json!({
            "token": "jwt"
        }))
        .unwrap();
        assert_eq!(response.token, "jwt");
        assert!(response.message.is_none());
        assert!(response.expires_at.is_none());
    }

    #[test]
    fn author_decodes_iso_birthdate_as_string() {
        let author: Author = serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "Alan Moore",
            "slug": "alan-moore",
            "birthdate": "1953-11-18",
            "website": "https://example.org"
        }))
        .unwrap();
        assert_eq!(author.birthdate.as_deref(), Some("1953-11-18"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = CatalogApi::new("http://localhost:8989/").unwrap();
        assert_eq!(api.url("/comics"), "http://localhost:8989/comics");
    }
}
