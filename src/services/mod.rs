//! Collaborator interfaces
//!
//! Seams between the acquisition logic and the outside world: persistent
//! storage, the download client, the on-disk library layout and the upstream
//! media catalog. Everything downstream works against these traits so that
//! reconciliation and search logic can be driven with in-memory fakes.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Item, ItemId, ItemInfo, MediaKind};

/// Persistent catalog of tracked items.
#[async_trait]
pub trait Database: Send + Sync {
    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>>;
    /// Persists the mutable acquisition state of an item: tracked torrents,
    /// archived results, voice and known season count.
    async fn update_item_content(&self, item: &Item) -> Result<()>;
    /// Lists tracked items, optionally narrowed to one media kind.
    async fn search_items(&self, kind: Option<MediaKind>) -> Result<Vec<Item>>;
    async fn delete_item(&self, id: &ItemId) -> Result<()>;
}

/// The download client plus its view of an item's torrents.
#[async_trait]
pub trait DownloadsManager: Send + Sync {
    /// Hands a torrent payload to the download client and records the new
    /// torrent on the item.
    async fn download(&self, item: &mut Item, voice: &str, payload: &[u8]) -> Result<()>;
    async fn remove_torrent(&self, item: &mut Item, torrent_id: &str) -> Result<()>;
    /// Drops item torrents the download client no longer knows about.
    async fn drop_missing_torrents(&self, item: &mut Item) -> Result<()>;
    /// Re-reads sizes and liveness of the item's torrents from the client.
    async fn refresh_torrent_info(&self, item: &mut Item) -> Result<()>;
}

/// On-disk layout of the library and stored torrent payloads.
#[async_trait]
pub trait DirectoryManager: Send + Sync {
    async fn create_item_layout(&self, item: &Item) -> Result<()>;
    async fn delete_item_layout(&self, item: &Item) -> Result<()>;
    /// Stores a fetched torrent payload and returns its storage path.
    async fn store_torrent_payload(
        &self,
        id: &ItemId,
        name: &str,
        payload: &[u8],
    ) -> Result<String>;
    async fn load_torrent_payload(&self, path: &str) -> Result<Vec<u8>>;
}

/// Catalog of media metadata, used to detect newly released seasons.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Latest known metadata for a title, if the catalog knows it.
    async fn lookup(&self, info: &ItemInfo) -> Result<Option<ItemInfo>>;
}
