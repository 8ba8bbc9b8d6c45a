//! Periodic scrape scheduling
//!
//! Runs are awaited inside the timer loop, so two runs never overlap. Ticks
//! that come due while a run is still going collapse into one late run, then
//! the schedule resumes on the interval grid.

use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::Scraper;

/// Scrape on a fixed interval until `cancel` fires. The first run starts
/// immediately. Returns the number of runs started.
pub async fn run_scheduled(scraper: &Scraper, every: Duration, cancel: &CancellationToken) -> u64 {
    info!(interval_secs = every.as_secs(), "Starting scrape scheduler");

    let mut timer = interval(every);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut runs = 0;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,
            _ = timer.tick() => {}
        }

        runs += 1;
        match scraper.run_once(cancel).await {
            Ok(report) if !report.failed.is_empty() => {
                warn!(
                    run_id = %report.run_id,
                    failed = report.failed.len(),
                    "Scrape finished with failures"
                );
            }
            Ok(_) => {}
            // Already logged by the run; the next tick tries again.
            Err(_) => {}
        }
    }

    info!(runs, "Scrape scheduler stopped");
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::source::testing::{player, StaticSource};
    use crate::source::{PlayerBatch, PlayerSource};
    use crate::store::SkillStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{self, Receiver};
    use std::sync::{Arc, Mutex};

    fn scraper(source: impl PlayerSource + 'static) -> (Scraper, Arc<SkillStore>) {
        let store = Arc::new(SkillStore::open_in_memory().unwrap());
        (Scraper::new(Arc::new(source), Arc::clone(&store)), store)
    }

    /// Source whose first listing blocks until released; later listings
    /// return immediately.
    struct GatedSource {
        gate: Mutex<Option<Receiver<()>>>,
        listings: Arc<AtomicUsize>,
    }

    impl PlayerSource for GatedSource {
        fn id(&self) -> &str {
            "gated"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn list_all_players(&self) -> Result<PlayerBatch> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                gate.recv().unwrap();
            }
            Ok(PlayerBatch {
                players: vec![player("Zezima", 10, 1154.0)],
                skipped: vec![],
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_scheduler_never_runs() {
        let (scraper, store) = scraper(StaticSource::new(vec![player("Zezima", 10, 1154.0)]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let runs = run_scheduled(&scraper, Duration::from_millis(10), &cancel).await;

        assert_eq!(runs, 0);
        assert_eq!(store.player_count().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_runs_until_cancelled() {
        let (scraper, store) = scraper(StaticSource::new(vec![player("Zezima", 10, 1154.0)]));
        let cancel = CancellationToken::new();

        let (runs, ()) = tokio::join!(
            run_scheduled(&scraper, Duration::from_millis(10), &cancel),
            async {
                tokio::time::sleep(Duration::from_millis(95)).await;
                cancel.cancel();
            }
        );

        // Ticks at 0, 10, ..., 90.
        assert_eq!(runs, 10);
        assert_eq!(store.player_count().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_source_keeps_scheduler_alive() {
        let (scraper, _store) = scraper(StaticSource::unavailable());
        let cancel = CancellationToken::new();

        let (runs, ()) = tokio::join!(
            run_scheduled(&scraper, Duration::from_millis(10), &cancel),
            async {
                tokio::time::sleep(Duration::from_millis(95)).await;
                cancel.cancel();
            }
        );

        assert_eq!(runs, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_run_skips_missed_ticks() {
        let (release, gate) = mpsc::channel();
        let listings = Arc::new(AtomicUsize::new(0));
        let (scraper, _store) = scraper(GatedSource {
            gate: Mutex::new(Some(gate)),
            listings: Arc::clone(&listings),
        });
        let cancel = CancellationToken::new();

        let (runs, ()) = tokio::join!(
            run_scheduled(&scraper, Duration::from_millis(100), &cancel),
            async {
                // The first run spans the ticks due at 100, 200 and 300.
                tokio::time::advance(Duration::from_millis(350)).await;
                release.send(()).unwrap();
                tokio::time::sleep(Duration::from_millis(80)).await;
                cancel.cancel();
            }
        );

        // One late tick fires at 350, then the schedule resumes at 400. A
        // queued backlog would have run the 100, 200 and 300 ticks as well.
        assert_eq!(runs, 3);
        assert_eq!(listings.load(Ordering::SeqCst), 3);
    }
}
