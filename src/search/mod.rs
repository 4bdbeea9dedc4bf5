//! Release search and acquisition
//!
//! Wraps the remote index behind search strategies: a strategy decides which
//! queries to run (whole item, one season, everything missing) and returns
//! fetched torrent payloads ready to hand to the download manager.

mod remote;
mod strategy;

pub use remote::{RemoteSearchClient, SEARCH_LIMIT};
pub use strategy::{SearchEngine, Strategy};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Candidate, ItemInfo, MediaKind};

/// Remote torrent index.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Searches releases for an item, optionally narrowed to one season.
    async fn search_torrents(
        &self,
        info: &ItemInfo,
        kind: MediaKind,
        season: Option<u32>,
    ) -> Result<Vec<Candidate>>;
    /// Fetches the torrent payload behind a search result link.
    async fn fetch_torrent_file(&self, link: &str) -> Result<Vec<u8>>;
}

/// Why an acquisition attempt produced nothing.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The index responded but had no usable release.
    #[error("no matching releases found")]
    NothingFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A selected release together with its fetched torrent payload.
#[derive(Debug, Clone)]
pub struct FoundTorrent {
    pub candidate: Candidate,
    pub payload: Vec<u8>,
}

impl FoundTorrent {
    /// Seasons the release claims to cover.
    pub fn seasons(&self) -> impl Iterator<Item = u32> + '_ {
        self.candidate.seasons.iter().copied()
    }
}
