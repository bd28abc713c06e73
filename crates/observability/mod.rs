use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn init_observability(component: &str) -> Result<()> {
    // EnvFilter (RUST_LOG) with a safe default so production never runs TRACE.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Default `SystemTime` formatter prints RFC3339 in UTC (`...Z`).
    // Use local time so `TZ=America/Argentina/Buenos_Aires` shows `-03:00`.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()?;

    info!(component, "observability initialized");

    Ok(())
}
