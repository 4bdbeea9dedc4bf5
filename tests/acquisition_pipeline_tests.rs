//! Integration tests for the acquisition pipeline
//!
//! These tests drive the public API end to end:
//! - Release name analysis (path -> season/episode/kind)
//! - Candidate ranking and selection
//! - Search strategies over a scripted provider

use curator::models::{Candidate, FileKind, ItemInfo, MediaKind};
use curator::selector::{Criteria, MediaSelector};

fn candidate(title: &str, size_mb: u64, seeders: u32, quality: &str, seasons: &[u32]) -> Candidate {
    Candidate {
        title: title.to_string(),
        link: format!("magnet:?xt={title}"),
        size_mb,
        seeders,
        quality: quality.to_string(),
        voice: String::new(),
        seasons: seasons.to_vec(),
    }
}

// ============================================================================
// Analysis
// ============================================================================

mod analysis {
    use curator::analysis::analyze;

    use super::*;

    #[test]
    fn test_series_episode_path() {
        let out = analyze("Stranger.Things.S04.1080p/s04e02.Vecna.mkv");
        assert_eq!(
            out.titles,
            vec!["Stranger Things".to_string(), "Vecna".to_string()]
        );
        assert_eq!(out.episode_name, "Vecna");
        assert_eq!(out.season, 4);
        assert_eq!(out.episode, 2);
        assert_eq!(out.kind, MediaKind::TvSeries);
        assert_eq!(out.file_kind, FileKind::Episode);
    }

    #[test]
    fn test_film_with_year() {
        let out = analyze("Дюна (2021) WEB-DL 1080p.mkv");
        assert_eq!(out.titles, vec!["Дюна".to_string()]);
        assert_eq!(out.kind, MediaKind::Film);
        assert_eq!(out.file_kind, FileKind::Film);
        assert_eq!(out.year, 2021);
    }

    #[test]
    fn test_subtitle_beats_video_classification() {
        let out = analyze("Show.S01/s01e01.srt");
        assert_eq!(out.file_kind, FileKind::MediaSupply);
    }
}

// ============================================================================
// Selection
// ============================================================================

mod selection {
    use super::*;

    #[test]
    fn test_quality_criteria_prefers_priority_order() {
        let selector = MediaSelector::default();
        let list = vec![
            candidate("720", 2000, 80, "720p", &[1]),
            candidate("1080", 2000, 80, "1080p", &[1]),
            candidate("480", 2000, 80, "480p", &[1]),
        ];
        let picked = selector.select(Criteria::Quality, &list).unwrap();
        assert_eq!(picked.title, "1080");
    }

    #[test]
    fn test_size_window_outranks_quality() {
        let selector = MediaSelector::default();
        // 100 MB for a whole season reads as a sample, the honest 480p wins.
        let list = vec![
            candidate("tiny", 100, 500, "1080p", &[1]),
            candidate("ok", 2000, 10, "480p", &[1]),
        ];
        let picked = selector.select(Criteria::Quality, &list).unwrap();
        assert_eq!(picked.title, "ok");
    }

    #[test]
    fn test_sort_is_descending_by_rank() {
        let selector = MediaSelector::default();
        let mut list = vec![
            candidate("480", 2000, 80, "480p", &[1]),
            candidate("1080", 2000, 80, "1080p", &[1]),
            candidate("720", 2000, 80, "720p", &[1]),
        ];
        selector.sort(Criteria::Quality, &mut list);
        let titles: Vec<&str> = list.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["1080", "720", "480"]);
    }
}

// ============================================================================
// Strategies
// ============================================================================

mod strategies {
    use std::collections::{HashMap, HashSet};

    use anyhow::Result;
    use async_trait::async_trait;
    use curator::search::{SearchEngine, SearchProvider, Strategy};

    use super::*;

    struct ScriptedProvider {
        responses: HashMap<Option<u32>, Vec<Candidate>>,
    }

    #[async_trait]
    impl SearchProvider for ScriptedProvider {
        async fn search_torrents(
            &self,
            _info: &ItemInfo,
            _kind: MediaKind,
            season: Option<u32>,
        ) -> Result<Vec<Candidate>> {
            Ok(self.responses.get(&season).cloned().unwrap_or_default())
        }

        async fn fetch_torrent_file(&self, link: &str) -> Result<Vec<u8>> {
            Ok(link.as_bytes().to_vec())
        }
    }

    fn series_info(seasons: u32) -> ItemInfo {
        ItemInfo {
            title: "Lexx".to_string(),
            original_title: String::new(),
            year: 1997,
            seasons: Some(seasons),
        }
    }

    #[tokio::test]
    async fn test_full_strategy_covers_every_season() {
        let mut responses = HashMap::new();
        responses.insert(None, Vec::new());
        responses.insert(Some(1), vec![candidate("s1", 2000, 80, "1080p", &[1])]);
        responses.insert(Some(2), vec![candidate("s2", 2000, 80, "1080p", &[2])]);

        let provider = ScriptedProvider { responses };
        let selector = MediaSelector::default();
        let engine = SearchEngine::new(&provider, &selector);

        let found = engine
            .run(
                &series_info(2),
                MediaKind::TvSeries,
                Criteria::Compact,
                Strategy::Full,
            )
            .await
            .unwrap();

        let covered: HashSet<u32> = found.iter().flat_map(|f| f.seasons()).collect();
        assert_eq!(covered, HashSet::from([1, 2]));
        // Payloads come back with the selected candidates.
        assert!(found.iter().all(|f| !f.payload.is_empty()));
    }

    #[tokio::test]
    async fn test_fill_missing_skips_existing_seasons() {
        let mut responses = HashMap::new();
        responses.insert(Some(2), vec![candidate("s2", 2000, 80, "1080p", &[2])]);

        let provider = ScriptedProvider { responses };
        let selector = MediaSelector::default();
        let engine = SearchEngine::new(&provider, &selector);

        let found = engine
            .run(
                &series_info(2),
                MediaKind::TvSeries,
                Criteria::Quality,
                Strategy::FillMissing(HashSet::from([1])),
            )
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].candidate.title, "s2");
    }
}
