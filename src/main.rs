use coinwatch::CoinwatchError;
use coinwatch::alert::Aggregator;
use coinwatch::config::fetch_config;
use coinwatch::market::CoinGeckoClient;
use coinwatch::notify::DiscordWebhook;
use coinwatch::poller::Poller;
use coinwatch::signals::RuleSet;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), CoinwatchError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let app_config = fetch_config()?;
    let timeout = app_config.poller.request_timeout;

    info!(
        url = %app_config.coingecko.api_url,
        interval_secs = app_config.poller.interval.as_secs(),
        policy = ?app_config.policy,
        format = ?app_config.format,
        "Starting coinwatch"
    );
    info!("{}", app_config.rules.describe());

    let source = CoinGeckoClient::new(&app_config.coingecko.api_url, timeout)?;
    let sink = DiscordWebhook::new(&app_config.discord.webhook_url, timeout)?;
    let poller = Poller::new(
        source,
        sink,
        RuleSet::new(app_config.rules),
        Aggregator::new(app_config.policy).with_format(app_config.format),
        app_config.coingecko.request,
        app_config.poller,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                error!("Failed to listen for Ctrl-C: {e}");
                // keep the sender alive so the poller is not stopped
                std::future::pending::<()>().await;
            }
        }
    });

    poller.run(shutdown_rx).await;

    Ok(())
}
