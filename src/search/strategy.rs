//! Search strategies
//!
//! A strategy turns one logical acquisition ("get this item", "get season 3",
//! "get whatever seasons are still missing") into concrete index queries.
//! Per-season failures inside the aggregate strategies are tolerated; the
//! strategy only fails when it ends up with nothing at all.

use std::collections::HashSet;

use tracing::debug;

use crate::models::{ItemInfo, MediaKind};
use crate::selector::{Criteria, MediaSelector};

use super::{AcquireError, FoundTorrent, SearchProvider};

/// Which releases to go after.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// One best release for the whole item.
    Simple,
    /// One best release for a single season.
    Season(u32),
    /// Cover every season of the item.
    Full,
    /// Cover only the seasons not in the given set.
    FillMissing(HashSet<u32>),
}

/// Runs strategies against a search provider.
pub struct SearchEngine<'a> {
    provider: &'a dyn SearchProvider,
    selector: &'a MediaSelector,
}

impl<'a> SearchEngine<'a> {
    pub fn new(provider: &'a dyn SearchProvider, selector: &'a MediaSelector) -> Self {
        Self { provider, selector }
    }

    pub async fn run(
        &self,
        info: &ItemInfo,
        kind: MediaKind,
        criteria: Criteria,
        strategy: Strategy,
    ) -> Result<Vec<FoundTorrent>, AcquireError> {
        match strategy {
            Strategy::Simple => Ok(vec![self.search_one(info, kind, criteria, None).await?]),
            Strategy::Season(n) => Ok(vec![self.search_one(info, kind, criteria, Some(n)).await?]),
            Strategy::Full => self.search_full(info, kind, criteria).await,
            Strategy::FillMissing(existing) => {
                self.fill_missing(info, kind, criteria, existing).await
            }
        }
    }

    /// One query, one selected release, one fetched payload.
    async fn search_one(
        &self,
        info: &ItemInfo,
        kind: MediaKind,
        criteria: Criteria,
        season: Option<u32>,
    ) -> Result<FoundTorrent, AcquireError> {
        let list = self.provider.search_torrents(info, kind, season).await?;
        let candidate = self
            .selector
            .select(criteria, &list)
            .ok_or(AcquireError::NothingFound)?
            .clone();
        let payload = self.provider.fetch_torrent_file(&candidate.link).await?;
        Ok(FoundTorrent { candidate, payload })
    }

    async fn search_full(
        &self,
        info: &ItemInfo,
        kind: MediaKind,
        criteria: Criteria,
    ) -> Result<Vec<FoundTorrent>, AcquireError> {
        let mut result = Vec::new();
        let mut covered: HashSet<u32> = HashSet::new();
        let mut have_everything_attempted = false;

        // In a hurry: grab the first season alone so playback can start,
        // then fill the rest in the background loop below.
        if criteria == Criteria::Fastest {
            if let Ok(first) = self.search_one(info, kind, criteria, Some(1)).await {
                covered.extend(first.seasons());
                result.push(first);
                have_everything_attempted = true;
            }
        }

        // Otherwise prefer one compact release covering the whole run.
        if !have_everything_attempted {
            match self.search_one(info, kind, Criteria::Compact, None).await {
                Ok(found) => {
                    covered.extend(found.seasons());
                    result.push(found);
                }
                Err(e) => debug!(error = %e, "whole-item search came up empty"),
            }
        }

        let total = info.seasons.unwrap_or(0);
        for season in 1..=total {
            if covered.contains(&season) {
                continue;
            }
            match self.search_one(info, kind, criteria, Some(season)).await {
                Ok(found) => {
                    covered.extend(found.seasons());
                    covered.insert(season);
                    result.push(found);
                }
                Err(e) => debug!(season, error = %e, "season search came up empty"),
            }
        }

        if result.is_empty() {
            return Err(AcquireError::NothingFound);
        }
        Ok(result)
    }

    async fn fill_missing(
        &self,
        info: &ItemInfo,
        kind: MediaKind,
        criteria: Criteria,
        mut existing: HashSet<u32>,
    ) -> Result<Vec<FoundTorrent>, AcquireError> {
        let mut result = Vec::new();
        let total = info.seasons.unwrap_or(0);
        for season in 1..=total {
            if existing.contains(&season) {
                continue;
            }
            match self.search_one(info, kind, criteria, Some(season)).await {
                Ok(found) => {
                    existing.extend(found.seasons());
                    existing.insert(season);
                    result.push(found);
                }
                Err(e) => debug!(season, error = %e, "season search came up empty"),
            }
        }

        if result.is_empty() {
            return Err(AcquireError::NothingFound);
        }
        Ok(result)
    }
}
