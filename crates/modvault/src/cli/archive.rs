use anyhow::{Context, Result};
use console::style;
use indicatif::HumanBytes;
use modvault_archive::{ArchiveOptions, Archiver, RunStats};
use modvault_catalog::{CatalogClient, DEFAULT_USER_AGENT, ListingOptions};
use modvault_fetch::{FetchOptions, Fetcher, ReqwestClient};
use modvault_ledger::Ledger;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::ui::tracker::{BARS, ProgressTrackerBuilder, Tracker, TrackerBuilder};

pub fn run(settings: &Settings) -> Result<()> {
    if settings.get_small_files {
        debug!("get_small_files is set; every selected file is fetched regardless");
    }
    if settings.threads > 1 {
        debug!("threads = {} is ignored; entries are processed one at a time", settings.threads);
    }

    let types = settings.type_filter();
    if types.included().is_empty() {
        warn!("every category is disabled; listing all categories instead");
    }

    let http = ReqwestClient::new(DEFAULT_USER_AGENT).context("failed to build the HTTP client")?;
    let catalog = CatalogClient::new(http.clone(), ListingOptions {
        api_url: settings.api_url.clone(),
        types,
        favorites_only: settings.favorites_only,
        api_key: settings.api_key().map(str::to_string),
        first_page_only: settings.first_page_only,
        ..ListingOptions::default()
    })?;

    let ledger = if settings.only_size {
        Ledger::load_read_only(&settings.ledger_path)
    } else {
        Ledger::load(&settings.ledger_path)
    }
    .with_context(|| format!("failed to open ledger {}", settings.ledger_path.display()))?;
    info!("{} entries already archived", ledger.len());

    let pages = ProgressTrackerBuilder::default()
        .with_prefix("pages")
        .with_finish("catalog listed")
        .build(&BARS);
    let entries = ProgressTrackerBuilder::default()
        .with_prefix("entries")
        .build(&BARS);
    let bytes = ProgressTrackerBuilder::default()
        .with_prefix("file")
        .bytes()
        .build(&BARS);

    let mut fetch = FetchOptions::default()
        .header("User-Agent", DEFAULT_USER_AGENT)
        .on_progress(bytes.fetch_observer());
    if let Some(key) = settings.api_key() {
        fetch = fetch.header("Authorization", format!("Bearer {key}"));
    }

    let mut archiver = Archiver::new(Fetcher::new(http, fetch), ledger, ArchiveOptions {
        root:          settings.output_dir.clone(),
        size_only:     settings.only_size,
        force_recheck: settings.force_recheck,
    });

    for page in catalog.pages() {
        if let Some(total) = page.total_pages {
            pages.set_len(total);
        }
        pages.step(1);
        for entry in page.entries {
            entries.set_message(entry.name.clone());
            archiver.process(entry).context("ledger update failed")?;
            entries.step(1);
        }
    }

    pages.finish();
    entries.finish();
    bytes.finish();

    let stats = *archiver.stats();
    info!("{stats}");
    summary(&stats, settings.only_size);
    Ok(())
}

fn summary(stats: &RunStats, size_only: bool) {
    if size_only {
        println!(
            "{} {} entries, {} to archive ({} KB declared)",
            style("Sizes").green().bold(),
            stats.entries_seen,
            HumanBytes(stats.declared_bytes()),
            stats.declared_kb,
        );
        return;
    }

    println!(
        "{} {} new, {} updated, {} unchanged, {} unprocessable",
        style("Entries").green().bold(),
        stats.downloaded,
        stats.updated,
        stats.skipped,
        stats.unprocessable,
    );
    let failed = if stats.files_failed > 0 {
        style(stats.files_failed).red().bold()
    } else {
        style(stats.files_failed).dim()
    };
    println!(
        "{} {} fetched ({}), {} already present, {} failed",
        style("Files").green().bold(),
        stats.files_fetched,
        HumanBytes(stats.bytes_transferred),
        stats.files_reused,
        failed,
    );
}
