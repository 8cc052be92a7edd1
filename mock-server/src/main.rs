use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let mut state = mock_server::AppState::new();
    for entity in mock_server::ENTITIES {
        let key = format!("SEED_{}", entity.to_uppercase());
        let count = std::env::var(&key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);
        state = state.with_count(entity, count);
    }
    if let Ok(token) = std::env::var("MOCK_TOKEN") {
        state = state.with_token(&token);
    }

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    mock_server::run(listener, state).await
}
