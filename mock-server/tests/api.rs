use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, AppState, Listing};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- listing ---

#[tokio::test]
async fn empty_collection_returns_204() {
    let resp = app(AppState::new()).oneshot(get("/api/v4/contacts")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn first_page_uses_default_limit() {
    let state = AppState::new().with_count("leads", 300);
    let resp = app(state).oneshot(get("/api/v4/leads")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Listing = body_json(resp).await;
    assert_eq!(body.page, 1);
    assert_eq!(body.embedded["leads"].len(), 250);
    assert!(body.links.next.is_some());
    assert!(body.links.prev.is_none());
}

#[tokio::test]
async fn explicit_page_and_limit() {
    let state = AppState::new().with_count("companies", 45);
    let resp = app(state)
        .oneshot(get("/api/v4/companies?page=5&limit=10"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Listing = body_json(resp).await;
    assert_eq!(body.embedded["companies"].len(), 5);
    assert!(body.links.next.is_none());
}

#[tokio::test]
async fn page_past_the_end_returns_204() {
    let state = AppState::new().with_count("companies", 45);
    let resp = app(state)
        .oneshot(get("/api/v4/companies?page=6&limit=10"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn limit_is_capped() {
    let state = AppState::new().with_count("tasks", 1000);
    let resp = app(state)
        .oneshot(get("/api/v4/tasks?limit=999"))
        .await
        .unwrap();
    let body: Listing = body_json(resp).await;
    assert_eq!(body.embedded["tasks"].len(), 250);
}

#[tokio::test]
async fn encoded_filters_are_ignored() {
    let state = AppState::new().with_count("tasks", 3);
    let resp = app(state)
        .oneshot(get("/api/v4/tasks?limit=1&page=3&filter%5Bis_completed%5D=0"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Listing = body_json(resp).await;
    assert_eq!(body.embedded["tasks"][0].id, 3);
}

#[tokio::test]
async fn unknown_entity_returns_404() {
    let resp = app(AppState::new()).oneshot(get("/api/v4/webhooks")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_page_returns_400() {
    let resp = app(AppState::new())
        .oneshot(get("/api/v4/leads?page=abc"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- auth ---

#[tokio::test]
async fn missing_token_returns_401() {
    let state = AppState::new().with_count("leads", 1).with_token("secret");
    let resp = app(state).oneshot(get("/api/v4/leads")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn matching_token_is_accepted() {
    let state = AppState::new().with_count("leads", 1).with_token("secret");
    let req = Request::builder()
        .uri("/api/v4/leads")
        .header(http::header::AUTHORIZATION, "Bearer secret")
        .body(String::new())
        .unwrap();
    let resp = app(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- bookkeeping ---

#[tokio::test]
async fn hits_and_resizing_are_shared_across_clones() {
    use tower::Service;

    let state = AppState::new().with_count("contacts", 1);
    let mut svc = app(state.clone()).into_service();

    let resp = ServiceExt::ready(&mut svc)
        .await
        .unwrap()
        .call(get("/api/v4/contacts?page=2&limit=1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    state.set_count("contacts", 2);

    let resp = ServiceExt::ready(&mut svc)
        .await
        .unwrap()
        .call(get("/api/v4/contacts?page=2&limit=1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(state.hits(), 2);
}
