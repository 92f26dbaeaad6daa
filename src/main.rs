use std::sync::Arc;
use std::time::Duration;

use engage::services::transport::{AnonymousIdentity, HttpTransport};
use engage::{EventDraft, LifecycleDriver, ProcessLifecycle, TelemetryClient, TelemetryConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = TelemetryConfig::from_env()?;
    tracing::info!("Engage telemetry booting. Ingest: {}", config.ingest_url);

    let transport = HttpTransport::new(&config, Arc::new(AnonymousIdentity))?;
    let client = TelemetryClient::new(&config, Arc::new(transport))?;

    let session = client.session_id();
    client.init(&session, None);

    // Simulated visitor: page view, a zone dwell, a funnel click.
    let visitor = client.clone();
    tokio::spawn(async move {
        visitor.track(EventDraft::new("page_view", "/promo"));
        visitor.start_timer("hero");
        tokio::time::sleep(Duration::from_secs(3)).await;
        visitor.stop_zone("/promo", "hero");
        visitor.track(EventDraft::new("cta_click", "/promo").component("signup_button").meta("step", 1));
    });

    tracing::info!("Engage telemetry active. Press Ctrl+C to stop.");
    let driver = LifecycleDriver::new(client.clone(), Duration::from_secs(config.flush_interval_secs));
    driver.run(ProcessLifecycle).await;

    tracing::info!("Delivery stats: {:?}", client.stats());
    Ok(())
}
