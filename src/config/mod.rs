//! Application configuration management

use std::env;

use anyhow::{Context, Result};

use crate::selector::MediaSelector;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the torrent search service
    pub search_url: String,

    /// Access token sent to the search service
    pub search_token: String,

    /// Smallest plausible size of one season, in megabytes
    pub min_season_size_mb: u64,

    /// Largest plausible size of one season, in megabytes
    pub max_season_size_mb: u64,

    /// Seeder count above which a release is considered well seeded
    pub min_seeders_threshold: u32,

    /// Quality labels in order of preference, comma separated in the env
    pub quality_priority: Vec<String>,

    /// Globally preferred voice-over, empty for no preference
    pub voice: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = MediaSelector::default();

        Ok(Self {
            search_url: env::var("SEARCH_URL").context("SEARCH_URL is required")?,

            search_token: env::var("SEARCH_TOKEN").unwrap_or_default(),

            min_season_size_mb: env::var("MIN_SEASON_SIZE_MB")
                .unwrap_or_else(|_| defaults.min_season_size_mb.to_string())
                .parse()
                .context("Invalid MIN_SEASON_SIZE_MB")?,

            max_season_size_mb: env::var("MAX_SEASON_SIZE_MB")
                .unwrap_or_else(|_| defaults.max_season_size_mb.to_string())
                .parse()
                .context("Invalid MAX_SEASON_SIZE_MB")?,

            min_seeders_threshold: env::var("MIN_SEEDERS_THRESHOLD")
                .unwrap_or_else(|_| defaults.min_seeders_threshold.to_string())
                .parse()
                .context("Invalid MIN_SEEDERS_THRESHOLD")?,

            quality_priority: match env::var("QUALITY_PRIORITY") {
                Ok(raw) => raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                Err(_) => defaults.quality_priority,
            },

            voice: env::var("PREFERRED_VOICE").unwrap_or_default(),
        })
    }

    /// Builds the ranking settings this configuration describes.
    pub fn selector(&self) -> MediaSelector {
        let mut selector = MediaSelector::default();
        selector.min_season_size_mb = self.min_season_size_mb;
        selector.max_season_size_mb = self.max_season_size_mb;
        selector.min_seeders_threshold = self.min_seeders_threshold;
        selector.quality_priority = self.quality_priority.clone();
        selector.voice = self.voice.clone();
        selector
    }
}
