use inkrelay_server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "inkrelay_server=info,inkrelay_core=info,tower_http=info".into()
            }),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::debug!(?config, "Loaded configuration");
    inkrelay_server::run(config).await
}
