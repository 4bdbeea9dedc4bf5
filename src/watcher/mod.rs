//! Item reconciliation
//!
//! Each tracked item is periodically re-checked against reality: torrents can
//! vanish from the download client, an item can be moved between lists with
//! content that no longer matches the list's rules, and content can be
//! missing entirely. Every check runs under the item's lock so user-driven
//! operations and watcher runs never interleave on the same item.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::locker::Locker;
use crate::models::{ArchivedCandidate, Candidate, Item, ItemId, List, MediaKind};
use crate::search::{AcquireError, SearchEngine, SearchProvider, Strategy};
use crate::selector::{Criteria, MediaSelector};
use crate::services::{CatalogProvider, Database, DirectoryManager, DownloadsManager};

/// How long a reconciliation run waits for the item lock.
pub const LOCK_WAIT: Duration = Duration::from_secs(5);
/// Period of the per-item reconciliation task.
pub const WATCH_INTERVAL: Duration = Duration::from_secs(60);
/// Period of the per-series new-releases task.
pub const CHECK_RELEASES_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// How many ranked releases an archive keeps per item or season.
const ARCHIVE_RESULTS_BOUND: usize = 5;

/// True when the item has no content matching its list's expectations.
pub fn content_missing(item: &Item) -> bool {
    match item.list {
        List::Archive => match item.kind {
            MediaKind::Film => item.archived_torrents.is_empty(),
            MediaKind::TvSeries => item.archived_seasons.is_empty(),
        },
        // Favourites hold downloaded copies; a record is fine as long as
        // at least one torrent is a real download.
        List::Favourites => item.torrents.iter().all(|t| t.online),
        List::WatchList => item.torrents.iter().all(|t| !t.online),
    }
}

/// Drives the drift-correction cycle for tracked items.
pub struct WatcherService {
    db: Arc<dyn Database>,
    downloads: Arc<dyn DownloadsManager>,
    directory: Arc<dyn DirectoryManager>,
    search: Arc<dyn SearchProvider>,
    catalog: Arc<dyn CatalogProvider>,
    locker: Arc<Locker>,
    selector: MediaSelector,
}

impl WatcherService {
    pub fn new(
        db: Arc<dyn Database>,
        downloads: Arc<dyn DownloadsManager>,
        directory: Arc<dyn DirectoryManager>,
        search: Arc<dyn SearchProvider>,
        catalog: Arc<dyn CatalogProvider>,
        locker: Arc<Locker>,
        selector: MediaSelector,
    ) -> Self {
        Self { db, downloads, directory, search, catalog, locker, selector }
    }

    fn selector_for(&self, item: &Item) -> MediaSelector {
        let mut sel = self.selector.clone();
        sel.voice = item.voice.clone();
        sel
    }

    /// One full reconciliation pass over a single item.
    pub async fn reconcile(&self, id: &ItemId) -> Result<()> {
        let _guard = self
            .locker
            .timed_lock(LOCK_WAIT, id.clone())
            .await
            .context("lock item failed")?;

        let mut item = self
            .db
            .get_item(id)
            .await
            .context("load item from database failed")?
            .with_context(|| format!("item {id} not found"))?;

        // 1) torrents that vanished from the download client
        if item.list != List::Archive {
            if let Err(e) = self.downloads.drop_missing_torrents(&mut item).await {
                warn!(item = %id, error = %e, "drop missing torrents failed");
            }
        }

        // 2) torrents that contradict the item's list
        self.remove_unused_torrents(&mut item).await;

        // 3) nothing left at all: go get the content again
        if content_missing(&item) {
            warn!(item = %id, "content is missing, downloading everything");
            return self.download_content(&mut item).await;
        }

        // 4) refresh sizes and liveness
        let before = item.torrents.clone();
        if let Err(e) = self.downloads.refresh_torrent_info(&mut item).await {
            warn!(item = %id, error = %e, "refresh torrent info failed");
        } else if item.torrents != before {
            self.db
                .update_item_content(&item)
                .await
                .context("persist refreshed torrent info failed")?;
        }

        Ok(())
    }

    async fn remove_unused_torrents(&self, item: &mut Item) {
        let unused: Vec<String> = match item.list {
            List::Archive => item.torrents.iter().map(|t| t.id.clone()).collect(),
            List::WatchList => item
                .torrents
                .iter()
                .filter(|t| !t.online)
                .map(|t| t.id.clone())
                .collect(),
            List::Favourites => item
                .torrents
                .iter()
                .filter(|t| t.online)
                .map(|t| t.id.clone())
                .collect(),
        };

        for torrent_id in unused {
            info!(item = %item.id, torrent = %torrent_id, "removing unused torrent");
            if let Err(e) = self.downloads.remove_torrent(item, &torrent_id).await {
                warn!(item = %item.id, torrent = %torrent_id, error = %e, "remove unused torrent failed");
            }
        }
    }

    /// Re-acquires everything the item's list expects to exist.
    pub async fn download_content(&self, item: &mut Item) -> Result<()> {
        if item.list == List::Archive {
            self.search_and_archive(item)
                .await
                .context("search and archive content failed")
        } else {
            self.search_and_download(item)
                .await
                .context("search and download content failed")
        }
    }

    async fn search_and_download(&self, item: &mut Item) -> Result<()> {
        let sel = self.selector_for(item);
        let engine = SearchEngine::new(self.search.as_ref(), &sel);

        let strategy = match item.kind {
            MediaKind::TvSeries => Strategy::Full,
            MediaKind::Film => Strategy::Simple,
        };
        let criteria = if item.list == List::WatchList {
            Criteria::Fastest
        } else {
            Criteria::Quality
        };

        let found = engine.run(&item.info, item.kind, criteria, strategy).await?;
        for f in &found {
            item.set_voice(&f.candidate.voice);
            let voice = item.voice.clone();
            if let Err(e) = self.downloads.download(item, &voice, &f.payload).await {
                warn!(item = %item.id, title = %f.candidate.title, error = %e, "download failed");
            }
        }

        self.db.update_item_content(item).await?;
        Ok(())
    }

    async fn search_and_archive(&self, item: &mut Item) -> Result<()> {
        let sel = self.selector_for(item);

        let mut results = self
            .search
            .search_torrents(&item.info, item.kind, None)
            .await?;
        if results.is_empty() {
            return Err(AcquireError::NothingFound.into());
        }
        sel.sort(Criteria::Quality, &mut results);
        results.truncate(ARCHIVE_RESULTS_BOUND);
        item.archived_torrents = self.fetch_and_store(&item.id, &results).await;

        if item.kind == MediaKind::TvSeries {
            let total = item.info.seasons.unwrap_or(0);
            for season in 1..=total {
                let mut results = match self
                    .search
                    .search_torrents(&item.info, item.kind, Some(season))
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(item = %item.id, season, error = %e, "season search failed");
                        continue;
                    }
                };
                sel.sort(Criteria::Quality, &mut results);
                results.truncate(ARCHIVE_RESULTS_BOUND);
                let stored = self.fetch_and_store(&item.id, &results).await;
                info!(item = %item.id, season, torrents = stored.len(), "archived season releases");
                item.archived_seasons.insert(season, stored);
            }
        }

        self.db.update_item_content(item).await?;
        Ok(())
    }

    /// Fetches payloads for ranked results and stores them on disk. Results
    /// whose payload cannot be fetched or stored are skipped.
    async fn fetch_and_store(&self, id: &ItemId, results: &[Candidate]) -> Vec<ArchivedCandidate> {
        let mut stored = Vec::with_capacity(results.len());
        for result in results {
            let payload = match self.search.fetch_torrent_file(&result.link).await {
                Ok(p) => p,
                Err(e) => {
                    warn!(item = %id, title = %result.title, error = %e, "fetch torrent file failed");
                    continue;
                }
            };
            match self
                .directory
                .store_torrent_payload(id, &result.title, &payload)
                .await
            {
                Ok(path) => stored.push(ArchivedCandidate { result: result.clone(), path }),
                Err(e) => {
                    warn!(item = %id, title = %result.title, error = %e, "store torrent payload failed");
                }
            }
        }
        stored
    }

    /// Checks the upstream catalog for newly released seasons of a series
    /// and acquires them incrementally.
    pub async fn check_releases(&self, id: &ItemId) -> Result<()> {
        let _guard = self
            .locker
            .timed_lock(LOCK_WAIT, id.clone())
            .await
            .context("lock item failed")?;

        let mut item = self
            .db
            .get_item(id)
            .await
            .context("load item from database failed")?
            .with_context(|| format!("item {id} not found"))?;
        if item.kind != MediaKind::TvSeries {
            return Ok(());
        }

        let Some(latest) = self.catalog.lookup(&item.info).await? else {
            return Ok(());
        };
        let (Some(known), Some(latest_count)) = (item.info.seasons, latest.seasons) else {
            return Ok(());
        };
        if known >= latest_count {
            return Ok(());
        }
        info!(item = %id, known, latest = latest_count, "new seasons released");

        let sel = self.selector_for(&item);
        let criteria = if item.list == List::WatchList {
            Criteria::Fastest
        } else {
            Criteria::Quality
        };

        let mut acquired = 0u32;
        for season in known + 1..=latest_count {
            let mut results = match self
                .search
                .search_torrents(&item.info, item.kind, Some(season))
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!(item = %id, season, error = %e, "season search failed");
                    break;
                }
            };
            if results.is_empty() {
                break;
            }

            if item.list != List::Archive {
                let Some(best) = sel.select(criteria, &results).cloned() else {
                    break;
                };
                let payload = match self.search.fetch_torrent_file(&best.link).await {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(item = %id, season, error = %e, "fetch torrent file failed");
                        break;
                    }
                };
                item.set_voice(&best.voice);
                let voice = item.voice.clone();
                if let Err(e) = self.downloads.download(&mut item, &voice, &payload).await {
                    warn!(item = %id, season, error = %e, "download new season failed");
                    break;
                }
            } else {
                sel.sort(Criteria::Quality, &mut results);
                results.truncate(ARCHIVE_RESULTS_BOUND);
                let stored = self.fetch_and_store(&item.id, &results).await;
                item.archived_seasons.insert(season, stored);
            }

            acquired += 1;
        }

        if acquired == 0 {
            return Ok(());
        }

        item.info.seasons = Some(known + acquired);
        self.db
            .update_item_content(&item)
            .await
            .context("update season count failed")?;
        info!(item = %id, seasons = known + acquired, "new seasons acquired");
        Ok(())
    }
}
