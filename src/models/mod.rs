//! Domain types for tracked catalog items and candidate releases

use serde::{Deserialize, Serialize};

/// Identity of a tracked catalog item (film or TV series).
///
/// Wraps the upstream catalog id so it can key locks, task groups and
/// database lookups without being confused with torrent ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

/// Membership category governing how content is sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum List {
    /// Actively downloaded to local storage.
    Favourites,
    /// Queued for later, sourced "online" (streamed on demand).
    WatchList,
    /// Indexed without downloading; only search results are kept.
    Archive,
}

/// What kind of media an item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Film,
    TvSeries,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Film => write!(f, "film"),
            MediaKind::TvSeries => write!(f, "tv-series"),
        }
    }
}

/// Download category labels passed to the download backend.
pub fn download_category(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Film => "curator_movies",
        MediaKind::TvSeries => "curator_tv",
    }
}

/// Catalog metadata for an item, cached from the upstream catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemInfo {
    pub title: String,
    /// Original-language title, used as a search fallback.
    pub original_title: String,
    pub year: u32,
    /// Known season count; `None` for films.
    pub seasons: Option<u32>,
}

/// A torrent tracked for an item in the download backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentRecord {
    pub id: String,
    pub title: String,
    /// Path of the torrent's content in the download backend.
    pub location: String,
    pub size: u64,
    /// True when sourced for online playback (WatchList items).
    pub online: bool,
}

/// A release found on a remote torrent index.
///
/// Immutable from the selector's point of view: ranking only reads these
/// fields and indexes into the input list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    /// Opaque link used to fetch the torrent payload.
    pub link: String,
    /// Total content size in megabytes.
    pub size_mb: u64,
    pub seeders: u32,
    /// Quality label as reported by the index ("1080p", "BDRip", ...).
    pub quality: String,
    /// Dub/voice label as reported by the index.
    pub voice: String,
    /// Season numbers the release covers; empty means the whole item.
    pub seasons: Vec<u32>,
}

/// A stored search result for an archived item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedCandidate {
    pub result: Candidate,
    /// Where the fetched torrent payload was stored by the directory manager.
    pub path: String,
}

/// A tracked catalog entry with its acquisition state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub info: ItemInfo,
    pub kind: MediaKind,
    pub list: List,
    /// Preferred voice, fixed at first download so later seasons match.
    pub voice: String,
    pub torrents: Vec<TorrentRecord>,
    /// Ranked search results kept for archived films.
    pub archived_torrents: Vec<ArchivedCandidate>,
    /// Ranked per-season search results kept for archived series.
    pub archived_seasons: std::collections::BTreeMap<u32, Vec<ArchivedCandidate>>,
}

impl Item {
    pub fn new(id: ItemId, info: ItemInfo, kind: MediaKind, list: List) -> Self {
        Item {
            id,
            info,
            kind,
            list,
            voice: String::new(),
            torrents: Vec::new(),
            archived_torrents: Vec::new(),
            archived_seasons: std::collections::BTreeMap::new(),
        }
    }

    /// Fixes the preferred voice on first download; later calls are no-ops.
    pub fn set_voice(&mut self, voice: &str) {
        if self.voice.is_empty() {
            self.voice = voice.to_string();
        }
    }

    pub fn add_torrent(&mut self, record: TorrentRecord) {
        self.torrents.push(record);
    }

    pub fn get_torrent(&self, id: &str) -> Option<&TorrentRecord> {
        self.torrents.iter().find(|t| t.id == id)
    }

    pub fn remove_torrent(&mut self, id: &str) -> Option<TorrentRecord> {
        let pos = self.torrents.iter().position(|t| t.id == id)?;
        Some(self.torrents.remove(pos))
    }

    /// Total size of locally stored (non-online) content.
    pub fn offline_size(&self) -> u64 {
        self.torrents
            .iter()
            .filter(|t| !t.online)
            .map(|t| t.size)
            .sum()
    }
}

/// Significance of a file inside downloaded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Regular trash files (readme, text, images).
    Insignificant,
    /// Film body.
    Film,
    /// Episode of a TV series.
    Episode,
    /// Subtitles, audio tracks and other supplements.
    MediaSupply,
}
