use anyhow::Result;
use snipe_agent::{
    app::SnipeAgentApp,
    config,
    infrastructure::{directories, logging, shutdown},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let logs_dir = directories::ensure_log_dir(&config.logging)?;
    logging::init_tracing(&config.logging, logs_dir.as_deref())?;

    let (shutdown, _) = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = SnipeAgentApp::initialize(&config, shutdown)?;
    app.run().await
}
