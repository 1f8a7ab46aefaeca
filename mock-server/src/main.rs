use tokio::net::TcpListener;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEFAULT_ANON_KEY: &str = "anon-key";

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "54321".to_string());
    let anon_key = mock_postgrest::resolve_anon_key(|name| std::env::var(name).ok())
        .unwrap_or_else(|| {
            warn!(key = DEFAULT_ANON_KEY, "no anon key configured, using default");
            DEFAULT_ANON_KEY.to_string()
        });
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    mock_postgrest::run(listener, &anon_key).await
}
