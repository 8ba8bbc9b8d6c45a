//! Scrape command implementation

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::scrape::Scraper;

pub async fn run(scraper: &Scraper) -> Result<()> {
    println!("Scraping player saves...\n");

    let report = scraper.run_once(&CancellationToken::new()).await?;

    println!("Run {} ({})", report.run_id, report.day);
    println!("   Found {} players", report.fetched);
    println!("   Recorded {}", report.recorded);

    if report.skipped_records > 0 {
        println!("   Skipped {} unreadable saves", report.skipped_records);
    }

    for failure in &report.failed {
        println!("   ✗ {}: {}", failure.account_name, failure.error);
    }

    if report.failed.is_empty() {
        println!("\n✅ Scrape complete!");
    } else {
        println!("\n⚠️  Scrape finished with {} failures", report.failed.len());
    }
    Ok(())
}
