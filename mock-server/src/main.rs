use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let app_id = std::env::var("MOCK_APP_ID").unwrap_or_else(|_| mock_server::DEFAULT_APP_ID.to_string());
    let app_token =
        std::env::var("MOCK_APP_TOKEN").unwrap_or_else(|_| mock_server::DEFAULT_APP_TOKEN.to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on http://{addr}/v1");
    mock_server::run_with_credentials(listener, &app_id, &app_token).await
}
