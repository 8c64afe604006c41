use std::sync::Arc;
use reel_app::config::AppConfig;
use reel_app::generator::backend::GenBackend;
use reel_app::{JobManager, LogListener, LumaClient};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let conf = AppConfig::load()?;

    let client = LumaClient::new(conf.luma.clone())?;
    if !client.is_configured() {
        warn!("LUMAAI_API_KEY is not defined, generation requests will be rejected");
    }

    let manager = Arc::new(JobManager::new(Arc::new(client), conf.manager));
    manager.subscribe_all(Arc::new(LogListener));

    GenBackend::new(conf.port, manager.clone()).run().await?;

    manager.shutdown();
    Ok(())
}
