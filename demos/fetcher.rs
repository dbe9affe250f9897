use tracing_subscriber::EnvFilter;
use webcal_week::{feed, Config};

fn main() -> webcal_week::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    feed::run_fetcher(&config)
}
