//! Remote discovery index client
//!
//! JSON client for the torrent discovery service. Searches run as remote
//! sessions: one request opens the session, the client polls until the
//! backend has fanned the query out to its indexes, then the session is
//! cancelled. A search under the localized title that comes back empty is
//! retried under the original title.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::models::{Candidate, ItemInfo, MediaKind};

use super::SearchProvider;

/// How many results one search session may return.
pub const SEARCH_LIMIT: u32 = 10;

pub struct RemoteSearchClient {
    base_url: String,
    token: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SearchQuery {
    q: String,
    #[serde(rename = "type")]
    media_type: &'static str,
    limit: u32,
    strong: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SessionOpened {
    id: String,
    poll_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
struct SessionStatus {
    status: String,
    #[serde(default)]
    results: Vec<WireResult>,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    title: String,
    link: String,
    #[serde(default)]
    size_mb: u64,
    #[serde(default)]
    seeders: u32,
    #[serde(default)]
    quality: String,
    #[serde(default)]
    voice: String,
    #[serde(default)]
    seasons: Vec<u32>,
}

impl From<WireResult> for Candidate {
    fn from(w: WireResult) -> Self {
        Candidate {
            title: w.title,
            link: w.link,
            size_mb: w.size_mb,
            seeders: w.seeders,
            quality: w.quality,
            voice: w.voice,
            seasons: w.seasons,
        }
    }
}

impl RemoteSearchClient {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    async fn run_session(&self, query: &SearchQuery) -> Result<Vec<Candidate>> {
        let opened: SessionOpened = self
            .client
            .post(format!("{}/torrents/search/async", self.base_url))
            .header("X-Token", &self.token)
            .json(query)
            .send()
            .await
            .context("open search session")?
            .error_for_status()?
            .json()
            .await
            .context("decode search session")?;

        let interval = Duration::from_millis(opened.poll_interval_ms.max(100));
        let status_url = format!("{}/torrents/search/async/{}", self.base_url, opened.id);

        let result = loop {
            tokio::time::sleep(interval).await;
            let status: SessionStatus = self
                .client
                .get(&status_url)
                .header("X-Token", &self.token)
                .send()
                .await
                .context("poll search session")?
                .error_for_status()?
                .json()
                .await
                .context("decode search status")?;

            match status.status.as_str() {
                "ready" => break Ok(status.results),
                "error" => break Err(anyhow::anyhow!("remote search failed: {}", status.error)),
                _ => continue,
            }
        };

        // Best-effort session cleanup, the backend reaps leftovers anyway.
        let _ = self
            .client
            .delete(&status_url)
            .header("X-Token", &self.token)
            .send()
            .await;

        let results = result?;
        debug!(query = %query.q, count = results.len(), "search session complete");
        Ok(results.into_iter().map(Candidate::from).collect())
    }
}

#[async_trait]
impl SearchProvider for RemoteSearchClient {
    async fn search_torrents(
        &self,
        info: &ItemInfo,
        kind: MediaKind,
        season: Option<u32>,
    ) -> Result<Vec<Candidate>> {
        let mut query = SearchQuery {
            q: info.title.clone(),
            media_type: "movies",
            limit: SEARCH_LIMIT,
            strong: true,
            season: None,
            year: None,
        };
        match kind {
            MediaKind::TvSeries => query.season = season,
            MediaKind::Film => {
                if info.year != 0 {
                    query.year = Some(info.year);
                }
            }
        }

        let mut results = self.run_session(&query).await?;
        if results.is_empty()
            && !info.original_title.is_empty()
            && info.original_title != info.title
        {
            query.q = info.original_title.clone();
            results = self.run_session(&query).await?;
        }
        Ok(results)
    }

    async fn fetch_torrent_file(&self, link: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/torrents/download?link={}",
            self.base_url,
            urlencoding::encode(link)
        );
        let resp = self
            .client
            .get(&url)
            .header("X-Token", &self.token)
            .send()
            .await
            .context("download torrent file")?;
        if !resp.status().is_success() {
            bail!("download torrent file failed: http {}", resp.status());
        }
        Ok(resp.bytes().await?.to_vec())
    }
}
