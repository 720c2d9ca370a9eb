use std::sync::Arc;

use anyhow::Result;
use metcast_forecast::{FetchState, ForecastRepository, SqliteStore, SystemClock};
use metcast_navigation::Navigator;

#[tokio::main]
async fn main() -> Result<()> {
    metcast_core::init()?;

    let mut app = metcast_core::App::new()?;
    app.initialize()?;

    let config = app.shared_config();
    let store = Arc::new(SqliteStore::open(config.cache_path())?);
    let repository = ForecastRepository::from_config(&config, store, Arc::new(SystemClock))?;

    tracing::info!("Metcast started");

    let navigator = Navigator::new();
    println!("Metcast - {}", navigator.page().title());

    match repository.fetch(false).await {
        FetchState::Ready(snapshot) => {
            println!("Issued {} by {}", snapshot.issue_time, snapshot.forecaster_name);
            println!("{}: {}", snapshot.forecast_period, snapshot.general_synopsis);
            println!(
                "Piarco {:.0}/{:.0}°C  Crown Point {:.0}/{:.0}°C",
                snapshot.piarco_max,
                snapshot.piarco_min,
                snapshot.crown_point_max,
                snapshot.crown_point_min
            );
            println!("Seas: {}", snapshot.seas_state);
            println!("Sunrise {}  Sunset {}", snapshot.sunrise_time, snapshot.sunset_time);
        }
        FetchState::Failed { reason, .. } => {
            println!("{}", reason);
        }
        other => tracing::warn!(?other, "Fetch finished in a non-terminal state"),
    }

    app.shutdown()?;

    Ok(())
}
