//! Watch command implementation

use anyhow::Result;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::scrape::{run_scheduled, Scraper};

pub async fn run(scraper: &Scraper, every: Duration) -> Result<()> {
    let cancel = CancellationToken::new();

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Unable to listen for interrupt");
            return;
        }
        info!("Interrupt received, stopping after the current player");
        on_signal.cancel();
    });

    println!("Scraping every {}s, press Ctrl-C to stop", every.as_secs());
    let runs = run_scheduled(scraper, every, &cancel).await;
    println!("Stopped after {} runs", runs);
    Ok(())
}
