//! Stateless request builder and response parser for amoCRM listings.
//!
//! # Design
//! `CrmClient` holds only a `base_url` and an optional bearer token and
//! carries no mutable state between calls. Each listing is split into
//! `build_list`, which produces an `HttpRequest`, and `parse_list`, which
//! consumes an `HttpResponse`. The host executes the round trip, so rate
//! limiting and token refresh stay with whoever owns the connection.

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::pagination::adapter::PageProbe;
use crate::types::{EntityKind, ListFilter, ListPage, RawListPage};

/// Synchronous, stateless client for the amoCRM v4 listing API.
#[derive(Debug, Clone)]
pub struct CrmClient {
    base_url: String,
    token: Option<String>,
}

impl CrmClient {
    /// `base_url` is everything up to and including `/api/v4`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let client = Self::new(&config.base_url());
        match &config.token {
            Some(token) => client.with_token(token),
            None => client,
        }
    }

    /// Attach `Authorization: Bearer <token>` to every request.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list(&self, kind: EntityKind, filter: &ListFilter) -> HttpRequest {
        let query = filter.to_query();
        let path = if query.is_empty() {
            format!("{}/{}", self.base_url, kind.as_str())
        } else {
            format!("{}/{}?{query}", self.base_url, kind.as_str())
        };
        HttpRequest {
            method: HttpMethod::Get,
            path,
            headers: self.headers(),
            body: None,
        }
    }

    /// Parse one listing page. A 204 is the server's way of saying the page
    /// is past the end and becomes an empty `ListPage`.
    pub fn parse_list(&self, kind: EntityKind, response: HttpResponse) -> Result<ListPage, ApiError> {
        if response.status == 204 {
            debug!(kind = kind.as_str(), "empty page");
            return Ok(ListPage::default());
        }
        check_status(&response, 200)?;
        let raw: RawListPage = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        Ok(raw.into_page(kind))
    }

    /// Build a probe over `kind` filtered by `filter`, executing requests
    /// through `execute`.
    pub fn page_probe<X>(&self, kind: EntityKind, filter: ListFilter, execute: X) -> PageProbe<'_, X>
    where
        X: Fn(HttpRequest) -> Result<HttpResponse, ApiError> + Sync,
    {
        PageProbe::new(self, kind, filter, execute)
    }

    pub fn contacts_probe<X>(&self, filter: ListFilter, execute: X) -> PageProbe<'_, X>
    where
        X: Fn(HttpRequest) -> Result<HttpResponse, ApiError> + Sync,
    {
        self.page_probe(EntityKind::Contacts, filter, execute)
    }

    pub fn leads_probe<X>(&self, filter: ListFilter, execute: X) -> PageProbe<'_, X>
    where
        X: Fn(HttpRequest) -> Result<HttpResponse, ApiError> + Sync,
    {
        self.page_probe(EntityKind::Leads, filter, execute)
    }

    pub fn companies_probe<X>(&self, filter: ListFilter, execute: X) -> PageProbe<'_, X>
    where
        X: Fn(HttpRequest) -> Result<HttpResponse, ApiError> + Sync,
    {
        self.page_probe(EntityKind::Companies, filter, execute)
    }

    pub fn tasks_probe<X>(&self, filter: ListFilter, execute: X) -> PageProbe<'_, X>
    where
        X: Fn(HttpRequest) -> Result<HttpResponse, ApiError> + Sync,
    {
        self.page_probe(EntityKind::Tasks, filter, execute)
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if let Some(token) = &self.token {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    match response.status {
        s if s == expected => Ok(()),
        401 => Err(ApiError::Unauthorized(response.body.clone())),
        404 => Err(ApiError::NotFound),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}
