use chrono::Utc;
use keylevels_data::{
    deribit::DeribitClient,
    error::DataError,
    source::{MarketDataSource, fetch_snapshot},
};
use keylevels_engine::{EngineConfig, EngineError, EngineInputs, analyze};
use thiserror::Error;
use tracing::{error, info};

mod report;
mod settings;

use report::ReportError;
use settings::Settings;

#[derive(Debug, Error)]
enum RunError {
    #[error("data: {0}")]
    Data(#[from] DataError),

    #[error("engine: {0}")]
    Engine(#[from] EngineError),

    #[error("report: {0}")]
    Report(#[from] ReportError),
}

#[tokio::main]
async fn main() {
    let settings = Settings::from_env();

    // Initialise INFO Tracing log subscriber
    init_logging(settings.log_json);

    info!(
        currencies = ?settings.currencies,
        hours_back = settings.hours_back,
        chunk_hours = settings.chunk_hours,
        "starting key level analysis"
    );

    let client = DeribitClient::new(settings.fetch_config());
    let config = EngineConfig::default();

    for currency in &settings.currencies {
        if let Err(error) = run_currency(&client, &config, &settings, currency).await {
            error!(%currency, %error, "key level analysis failed");
        }
    }
}

async fn run_currency<Source>(
    source: &Source,
    config: &EngineConfig,
    settings: &Settings,
    currency: &str,
) -> Result<(), RunError>
where
    Source: MarketDataSource + ?Sized,
{
    let snapshot = fetch_snapshot(source, currency).await?;
    let analysis = analyze(&EngineInputs::from(&snapshot), config, Utc::now())?;

    println!("{}", report::render_table(&analysis));

    if let Some(dir) = &settings.json_out {
        let path = report::write_json(dir, &analysis, snapshot.fetched_at)?;
        info!(%currency, path = %path.display(), "exported key levels");
    }

    Ok(())
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::filter::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy();

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            // Machine readable output for log shippers
            .json()
            .init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            // Disable colours on release builds
            .with_ansi(cfg!(debug_assertions))
            .init()
    }
}
