use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Collections served under `/api/v4/{entity}`.
pub const ENTITIES: [&str; 4] = ["contacts", "leads", "companies", "tasks"];

/// amoCRM caps `limit` at 250 and uses it as the default too.
pub const MAX_LIMIT: u32 = 250;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: Link,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Link>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "_page")]
    pub page: u32,
    #[serde(rename = "_links")]
    pub links: Links,
    #[serde(rename = "_embedded")]
    pub embedded: HashMap<String, Vec<Item>>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Shared server state: item counts per collection, a request counter and
/// an optional bearer token every request must carry.
#[derive(Clone, Default)]
pub struct AppState {
    counts: Arc<RwLock<HashMap<String, u32>>>,
    hits: Arc<AtomicU64>,
    token: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `entity` with `count` items.
    pub fn with_count(self, entity: &str, count: u32) -> Self {
        self.set_count(entity, count);
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Number of listing requests served so far, including rejected ones.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }

    /// Change a collection's size, also while the server is running.
    pub fn set_count(&self, entity: &str, count: u32) {
        self.counts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity.to_string(), count);
    }

    fn count(&self, entity: &str) -> u32 {
        self.counts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity)
            .copied()
            .unwrap_or(0)
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/v4/{entity}", get(list_entities))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

async fn list_entities(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    if let Some(token) = &state.token {
        let expected = format!("Bearer {token}");
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
        }
    }

    if !ENTITIES.contains(&entity.as_str()) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let total = state.count(&entity);
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(MAX_LIMIT).clamp(1, MAX_LIMIT);

    match listing(&entity, total, page, limit) {
        Some(body) => {
            tracing::debug!(%entity, page, limit, items = body.embedded[&entity].len(), "page served");
            Json(body).into_response()
        }
        None => {
            tracing::debug!(%entity, page, limit, "past the end");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

/// Build page `page` of a `total`-item collection, or `None` when the page
/// is past the end.
pub fn listing(entity: &str, total: u32, page: u32, limit: u32) -> Option<Listing> {
    let first = u64::from(page.saturating_sub(1)) * u64::from(limit) + 1;
    if first > u64::from(total) {
        return None;
    }
    let last = (first + u64::from(limit) - 1).min(u64::from(total));
    let items: Vec<Item> = (first..=last)
        .map(|id| Item {
            id,
            name: format!("{entity} #{id}"),
        })
        .collect();

    let href = |p: u32| Link {
        href: format!("/api/v4/{entity}?page={p}&limit={limit}"),
    };
    let links = Links {
        self_link: href(page),
        next: (last < u64::from(total)).then(|| href(page + 1)),
        prev: (page > 1).then(|| href(page - 1)),
    };

    Some(Listing {
        page,
        links,
        embedded: HashMap::from([(entity.to_string(), items)]),
    })
}
