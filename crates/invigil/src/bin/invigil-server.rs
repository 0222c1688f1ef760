use invigil::prelude::*;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), InvigilError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,invigil=debug".into()),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;
    info!(
        bind = %config.bind_addr,
        round_secs = config.room.countdown.seconds,
        results = ?config.results_path,
        "starting invigil"
    );

    let server = InvigilServer::builder().config(config).build().await?;
    server.run().await
}
