//! Background fetch driver for UI threads.
//! Network work runs on the tokio runtime; results come back via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::repository::ForecastRepository;
use crate::types::FetchState;

/// Messages sent from async operations back to the UI thread
#[derive(Debug)]
pub enum ForecastServiceMessage {
    /// Terminal state of a fetch
    FetchDone(FetchState),
}

/// Start a fetch on `runtime` and report its outcome on `tx`.
///
/// The repository enters `Loading`/`Refreshing` as soon as the task runs, so
/// callers polling [`ForecastRepository::state`] see the busy state before
/// the message arrives. A fetch superseded by a newer one sends nothing, so
/// the last message received always matches the repository state.
pub fn request_fetch(
    tx: &Sender<ForecastServiceMessage>,
    runtime: &tokio::runtime::Handle,
    repository: Arc<ForecastRepository>,
    force_refresh: bool,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let (state, committed) = repository.fetch_tracked(force_refresh).await;
        if !committed {
            tracing::debug!("Superseded fetch finished, not reporting");
            return;
        }
        if tx.send(ForecastServiceMessage::FetchDone(state)).is_err() {
            tracing::debug!("Forecast result dropped, receiver gone");
        }
    });
}
