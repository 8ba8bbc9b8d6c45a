//! Scrape orchestration
//!
//! One run lists every player from the source and, per player, resolves the
//! player's identity and records today's snapshot. Players are independent
//! units of work: a failure is logged, added to the run's report, and the run
//! moves on to the next player.

mod scheduler;

pub use scheduler::run_scheduled;

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::source::{NormalizedPlayer, PlayerSource};
use crate::store::SkillStore;

/// A player whose snapshot could not be recorded during a run.
#[derive(Debug)]
pub struct PlayerFailure {
    pub account_name: String,
    pub error: Error,
}

/// Side report of a single run.
#[derive(Debug)]
pub struct ScrapeReport {
    /// Correlation identifier for the run's log lines. Never persisted.
    pub run_id: Uuid,
    pub day: NaiveDate,
    pub fetched: usize,
    pub recorded: usize,
    pub failed: Vec<PlayerFailure>,
    pub skipped_records: usize,
    /// The run stopped early because cancellation was requested.
    pub cancelled: bool,
}

impl ScrapeReport {
    fn new(run_id: Uuid, day: NaiveDate) -> Self {
        Self {
            run_id,
            day,
            fetched: 0,
            recorded: 0,
            failed: vec![],
            skipped_records: 0,
            cancelled: false,
        }
    }
}

pub struct Scraper {
    source: Arc<dyn PlayerSource>,
    store: Arc<SkillStore>,
}

impl Scraper {
    pub fn new(source: Arc<dyn PlayerSource>, store: Arc<SkillStore>) -> Self {
        Self { source, store }
    }

    /// Scrape every player, recording snapshots under today's UTC date.
    pub async fn run_once(&self, cancel: &CancellationToken) -> Result<ScrapeReport> {
        self.run_for_day(Utc::now().date_naive(), cancel).await
    }

    /// Scrape every player, recording snapshots under `day`.
    ///
    /// Fails only when the source can't be listed; nothing has been written
    /// in that case. Cancellation is checked between players, so snapshots
    /// already committed are kept.
    pub async fn run_for_day(
        &self,
        day: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<ScrapeReport> {
        let run_id = Uuid::now_v7();
        let span = info_span!("scrape", run_id = %run_id, source = self.source.id());

        self.run(ScrapeReport::new(run_id, day), cancel)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        mut report: ScrapeReport,
        cancel: &CancellationToken,
    ) -> Result<ScrapeReport> {
        debug!("Fetching player stats");

        let source = Arc::clone(&self.source);
        let listing = tokio::task::spawn_blocking(move || source.list_all_players());

        let batch = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                info!("Scrape cancelled before players were fetched");
                report.cancelled = true;
                return Ok(report);
            }
            joined = listing => match joined.map_err(Error::from).and_then(|listed| listed) {
                Ok(batch) => batch,
                Err(e) => {
                    error!(error = %e, "Unable to fetch players");
                    return Err(e);
                }
            },
        };

        for skipped in &batch.skipped {
            warn!(error = %skipped, "Skipping unreadable player record");
        }
        report.skipped_records = batch.skipped.len();
        report.fetched = batch.players.len();

        for player in batch.players {
            if cancel.is_cancelled() {
                let remaining = report.fetched - report.recorded - report.failed.len();
                info!(remaining, "Scrape cancelled");
                report.cancelled = true;
                break;
            }

            let account_name = player.account_name.clone();
            let outcome = self
                .record_player(player, report.day)
                .instrument(info_span!("player", player = %account_name))
                .await;

            match outcome {
                Ok(()) => report.recorded += 1,
                Err(error) => {
                    warn!(player = %account_name, error = %error, "Unable to record player skills");
                    report.failed.push(PlayerFailure {
                        account_name,
                        error,
                    });
                }
            }
        }

        info!(
            day = %report.day,
            fetched = report.fetched,
            recorded = report.recorded,
            failed = report.failed.len(),
            skipped_records = report.skipped_records,
            "Finished fetching player stats"
        );

        Ok(report)
    }

    /// Resolve the player's identity, then write the day's snapshot in one
    /// transaction.
    async fn record_player(&self, player: NormalizedPlayer, day: NaiveDate) -> Result<()> {
        let store = Arc::clone(&self.store);
        let span = Span::current();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let _entered = span.enter();
            let record = store.get_or_create_player(&player.account_name, player.created_on)?;
            store.record_snapshots(&record.id, day, &player.skills())?;
            debug!(player_id = %record.id, skills = player.levels.len(), "Recorded skills");
            Ok(())
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::Skill;
    use crate::source::testing::{player, StaticSource};
    use crate::source::SaveDirectory;
    use std::fs;
    use tempfile::TempDir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn setup(source: impl PlayerSource + 'static) -> (Scraper, Arc<SkillStore>) {
        let store = Arc::new(SkillStore::open_in_memory().unwrap());
        (Scraper::new(Arc::new(source), Arc::clone(&store)), store)
    }

    fn snapshot_count(store: &SkillStore, username: &str) -> i64 {
        let id = store.reader().get_player(username).unwrap().id;
        store.snapshot_count(&id, day()).unwrap()
    }

    #[tokio::test]
    async fn test_records_every_player() {
        let (scraper, store) = setup(StaticSource::new(vec![
            player("Zezima", 99, 13_034_431.0),
            player("Lynx Titan", 99, 200_000_000.0),
            player("Newbie", 1, 0.0),
        ]));

        let report = scraper.run_for_day(day(), &CancellationToken::new()).await.unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.recorded, 3);
        assert!(report.failed.is_empty());
        assert!(!report.cancelled);
        assert_eq!(store.player_count().unwrap(), 3);
        assert_eq!(snapshot_count(&store, "Newbie"), Skill::COUNT as i64);

        let top = store.reader().get_highscores("Magic").unwrap();
        assert_eq!(top[0].username, "Lynx Titan");
    }

    #[tokio::test]
    async fn test_failed_player_does_not_stop_run() {
        // Level 120 violates the stored level bound.
        let (scraper, store) = setup(StaticSource::new(vec![
            player("Before", 10, 1154.0),
            player("Broken", 120, 1154.0),
            player("After", 10, 1154.0),
        ]));

        let report = scraper.run_for_day(day(), &CancellationToken::new()).await.unwrap();

        assert_eq!(report.recorded, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].account_name, "Broken");
        assert!(matches!(report.failed[0].error, Error::Storage(_)));

        assert_eq!(snapshot_count(&store, "Before"), Skill::COUNT as i64);
        assert_eq!(snapshot_count(&store, "After"), Skill::COUNT as i64);
        // Identity was resolved, but no partial snapshot was left behind.
        assert_eq!(snapshot_count(&store, "Broken"), 0);
    }

    #[tokio::test]
    async fn test_unavailable_source_aborts_run() {
        let (scraper, store) = setup(StaticSource::unavailable());

        let err = scraper
            .run_for_day(day(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SourceUnavailable { .. }));
        assert_eq!(store.player_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_run_records_nothing() {
        let (scraper, store) = setup(StaticSource::new(vec![player("Zezima", 10, 1154.0)]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = scraper.run_for_day(day(), &cancel).await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.recorded, 0);
        assert_eq!(store.player_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_keeps_committed_players() {
        let (scraper, store) = setup(StaticSource::new(vec![
            player("First", 10, 1154.0),
            player("Second", 10, 1154.0),
        ]));
        let cancel = CancellationToken::new();

        // Stall the first player's writes until the token has been cancelled.
        let stalled = store.hold();
        let (report, ()) = tokio::join!(scraper.run_for_day(day(), &cancel), async {
            // record_player clones the store handle for the player in flight.
            while Arc::strong_count(&store) < 3 {
                tokio::task::yield_now().await;
            }
            cancel.cancel();
            drop(stalled);
        });
        let report = report.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.fetched, 2);
        assert_eq!(report.recorded, 1);
        assert!(report.failed.is_empty());
        assert_eq!(snapshot_count(&store, "First"), Skill::COUNT as i64);
        assert!(matches!(
            store.reader().get_player("Second"),
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rerun_same_day_is_idempotent() {
        let (scraper, store) = setup(StaticSource::new(vec![
            player("Zezima", 10, 1154.0),
            player("Lynx Titan", 20, 4470.0),
        ]));
        let cancel = CancellationToken::new();

        scraper.run_for_day(day(), &cancel).await.unwrap();
        let first_id = store.reader().get_player("Zezima").unwrap().id;
        scraper.run_for_day(day(), &cancel).await.unwrap();

        assert_eq!(store.player_count().unwrap(), 2);
        assert_eq!(store.reader().get_player("Zezima").unwrap().id, first_id);
        assert_eq!(snapshot_count(&store, "Zezima"), Skill::COUNT as i64);
    }

    #[tokio::test]
    async fn test_save_directory_end_to_end() {
        let dir = TempDir::new().unwrap();
        let experience = vec!["11540"; Skill::COUNT].join(", ");
        let levels = vec!["10"; Skill::COUNT].join(", ");
        fs::write(
            dir.path().join("zezima.toml"),
            format!(
                "accountName = \"Zezima\"\nexperience = [{experience}]\nlevels = [{levels}]\n\
                 [variables]\ncreation = 1700000000000\n"
            ),
        )
        .unwrap();
        fs::write(dir.path().join("broken.toml"), "levels = 3").unwrap();

        let (scraper, store) = setup(SaveDirectory::new(dir.path().to_path_buf()));
        let report = scraper.run_for_day(day(), &CancellationToken::new()).await.unwrap();

        assert_eq!(report.recorded, 1);
        assert_eq!(report.skipped_records, 1);

        let skills = store.reader().get_player_skills("Zezima").unwrap();
        let attack = skills.get(Skill::Attack).unwrap();
        assert_eq!((attack.level, attack.experience), (10, 1154.0));
        // 1154 experience is exactly the level 10 threshold.
        assert_eq!(skills.get(Skill::Constitution).unwrap().level, 10);
    }
}
