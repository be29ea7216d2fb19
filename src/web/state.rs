use anyhow::{Context, Result};

use crate::{api::CatalogApi, config::AppConfig, web::session::SessionStore};

/// Shared application state: the backend API client and the session store.
/// This service has no database; every page is assembled from backend calls.
#[derive(Clone)]
pub struct AppState {
    api: CatalogApi,
    sessions: SessionStore,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let api = CatalogApi::new(config.api_base_url.clone())
            .context("failed to initialize backend API client")?;

        Ok(Self {
            api,
            sessions: SessionStore::new(),
        })
    }

    pub fn api(&self) -> &CatalogApi {
        &self.api
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}
