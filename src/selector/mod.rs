//! Multi-criteria release selection
//!
//! Every criterion is a sum of independent rank functions. Each rank
//! function scores every candidate in `[-1, 1]` relative to the rest of the
//! list, so a score is only meaningful within one invocation. Selection is a
//! plain argmax over the summed scores with ties going to the earliest
//! candidate, which keeps repeated runs over the same list deterministic.

mod voices;

pub use voices::VoiceList;

use strsim::levenshtein;
use tracing::debug;

use crate::models::Candidate;

/// What to optimize for when picking a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criteria {
    /// Best picture quality within the size window.
    Quality,
    /// Smallest and best-seeded release, for a quick first watch.
    Fastest,
    /// Densest release: quality and seeders, preferring season bundles.
    Compact,
}

/// Scores and picks releases for one item.
#[derive(Debug, Clone)]
pub struct MediaSelector {
    pub min_season_size_mb: u64,
    pub max_season_size_mb: u64,
    pub min_seeders_threshold: u32,
    /// Quality labels from most to least preferred.
    pub quality_priority: Vec<String>,
    /// Preferred voice; empty falls back to the ranked voice list.
    pub voice: String,
    pub voice_list: VoiceList,
}

impl Default for MediaSelector {
    fn default() -> Self {
        MediaSelector {
            min_season_size_mb: 1024,
            max_season_size_mb: 50 * 1024,
            min_seeders_threshold: 50,
            quality_priority: vec!["1080p".into(), "720p".into(), "480p".into()],
            voice: String::new(),
            voice_list: VoiceList::default_ranked(),
        }
    }
}

impl MediaSelector {
    /// Summed score per candidate for the given criteria. A `-1.0` from any
    /// rank function is a disqualification, not a score: the candidate's
    /// total becomes `f32::NEG_INFINITY` so no amount of voice or quality
    /// points can buy it back.
    pub fn rank(&self, criteria: Criteria, list: &[Candidate]) -> Vec<f32> {
        let parts: Vec<Vec<f32>> = match criteria {
            Criteria::Quality => vec![
                self.limit_by_size(list),
                self.rank_by_quality(list),
                self.rank_by_voice(2.0, list),
            ],
            Criteria::Fastest => vec![
                self.rank_by_size(list),
                self.rank_by_seeders(list),
                self.rank_by_voice(0.5, list),
            ],
            Criteria::Compact => vec![
                self.limit_by_size(list),
                self.rank_by_seeders(list),
                self.rank_by_quality(list),
                self.rank_by_seasons(list),
                self.rank_by_voice(2.0, list),
            ],
        };

        let mut totals = vec![0f32; list.len()];
        let mut excluded = vec![false; list.len()];
        for part in &parts {
            for (i, score) in part.iter().enumerate() {
                if *score == -1.0 {
                    excluded[i] = true;
                }
                totals[i] += score;
            }
        }
        for (total, excluded) in totals.iter_mut().zip(&excluded) {
            if *excluded {
                *total = f32::NEG_INFINITY;
            }
        }
        totals
    }

    /// Picks the best candidate; ties go to the earliest one. When every
    /// candidate is disqualified the first one still comes back, so a list
    /// of only out-of-window releases degrades like the empty-voice case
    /// instead of erroring.
    pub fn select<'a>(&self, criteria: Criteria, list: &'a [Candidate]) -> Option<&'a Candidate> {
        let totals = self.rank(criteria, list);
        let mut best = 0;
        for (i, total) in totals.iter().enumerate() {
            if *total > totals[best] {
                best = i;
            }
        }
        let selected = list.get(best)?;
        debug!(
            title = %selected.title,
            voice = %selected.voice,
            size_mb = selected.size_mb,
            seeders = selected.seeders,
            quality = %selected.quality,
            "selected release"
        );
        Some(selected)
    }

    /// Stable sort by descending score.
    pub fn sort(&self, criteria: Criteria, list: &mut Vec<Candidate>) {
        let totals = self.rank(criteria, list);
        let mut indexed: Vec<(usize, Candidate)> = list.drain(..).enumerate().collect();
        indexed.sort_by(|(a, _), (b, _)| {
            totals[*b].partial_cmp(&totals[*a]).unwrap_or(std::cmp::Ordering::Equal)
        });
        list.extend(indexed.into_iter().map(|(_, c)| c));
    }

    /// Disqualifies releases outside the per-season size window.
    fn limit_by_size(&self, list: &[Candidate]) -> Vec<f32> {
        list.iter()
            .map(|c| {
                let seasons = c.seasons.len().max(1) as u64;
                let size = c.size_mb;
                if size < self.min_season_size_mb * seasons
                    || size >= self.max_season_size_mb * seasons
                {
                    -1.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn rank_by_size(&self, list: &[Candidate]) -> Vec<f32> {
        let max = list.iter().map(|c| c.size_mb).max().unwrap_or(0);
        if max == 0 {
            return vec![0.0; list.len()];
        }
        list.iter()
            .map(|c| 1.0 - c.size_mb as f32 / max as f32)
            .collect()
    }

    fn rank_by_seeders(&self, list: &[Candidate]) -> Vec<f32> {
        let max = list.iter().map(|c| c.seeders).max().unwrap_or(0);
        list.iter()
            .map(|c| {
                if c.seeders >= self.min_seeders_threshold {
                    1.0
                } else if max == 0 {
                    0.0
                } else {
                    c.seeders as f32 / max as f32
                }
            })
            .collect()
    }

    fn rank_by_quality(&self, list: &[Candidate]) -> Vec<f32> {
        let len = self.quality_priority.len();
        if len == 0 {
            return vec![0.0; list.len()];
        }
        let per_position = 1.0 / len as f32;
        list.iter()
            .map(|c| {
                self.quality_priority
                    .iter()
                    .position(|q| *q == c.quality)
                    .map(|j| (len - j) as f32 * per_position)
                    .unwrap_or(0.0)
            })
            .collect()
    }

    fn rank_by_seasons(&self, list: &[Candidate]) -> Vec<f32> {
        let max = list.iter().map(|c| c.seasons.len()).max().unwrap_or(0);
        if max == 0 {
            return vec![0.0; list.len()];
        }
        list.iter()
            .map(|c| c.seasons.len() as f32 / max as f32)
            .collect()
    }

    fn rank_by_voice(&self, weight: f32, list: &[Candidate]) -> Vec<f32> {
        if self.voice.is_empty() {
            self.rank_by_voice_list(weight, list)
        } else {
            self.rank_by_voice_distance(weight, list)
        }
    }

    fn rank_by_voice_list(&self, weight: f32, list: &[Candidate]) -> Vec<f32> {
        let len = self.voice_list.len();
        if len == 0 {
            return vec![0.0; list.len()];
        }
        let per_group = 1.0 / len as f32;
        list.iter()
            .map(|c| {
                let voice = c.voice.to_lowercase();
                for (j, group) in self.voice_list.iter().enumerate() {
                    if group.iter().any(|alias| voice.contains(alias.as_str())) {
                        return weight * (len - j) as f32 * per_group;
                    }
                }
                0.0
            })
            .collect()
    }

    fn rank_by_voice_distance(&self, weight: f32, list: &[Candidate]) -> Vec<f32> {
        let target = self.voice.to_lowercase();
        let distances: Vec<usize> = list
            .iter()
            .map(|c| levenshtein(&c.voice.to_lowercase(), &target))
            .collect();
        let max = distances.iter().copied().max().unwrap_or(0);
        if max == 0 {
            return vec![weight; list.len()];
        }
        distances
            .iter()
            .map(|d| weight * (1.0 - *d as f32 / max as f32))
            .collect()
    }
}
