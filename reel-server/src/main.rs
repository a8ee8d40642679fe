use anyhow::Result;
use reel_core::ReelConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = ReelConfig::new();
    reel_server::apply_defaults(&mut config);
    config.load_env(reel_server::ENV_PREFIX);

    let server = reel_server::build(&config).await?;
    let addr = server.settings.addr();
    server.app.listen(addr).await?;

    Ok(())
}
