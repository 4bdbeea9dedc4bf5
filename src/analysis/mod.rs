//! Filename and path analysis
//!
//! Turns a library-relative file path into a best-effort description of what
//! the file is: candidate titles, season/episode/year numbers, whether it
//! belongs to a film or a series, and how the file should be treated.
//!
//! Up to four path components are analyzed independently (primary
//! directory, secondary directory, the remaining sub-path, file name) and
//! the per-component results are merged, with components closer to the file
//! taking precedence for season and episode numbers.

mod analyzer;
mod layout;
mod tokens;

pub use layout::{split_layout, Layout};

use crate::models::{FileKind, MediaKind};
use analyzer::{analyze_component, ComponentAnalysis};
use tokens::{title_string, tokenize};

const VIDEO_EXTENSIONS: [&str; 16] = [
    "mkv", "mp4", "vob", "sub", "3gp", "avi", "wmv", "flv", "ogv", "mp4v",
    "ts", "mpeg4", "mjpg", "mpg", "mov", "xvid",
];
const SUBTITLE_EXTENSIONS: [&str; 7] = ["srt", "vtt", "usf", "smil", "smi", "sami", "sub"];

/// Merged view of one file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// Distinct title guesses, outermost path component first.
    pub titles: Vec<String>,
    /// Title guess from the file name itself.
    pub episode_name: String,
    pub year: u32,
    pub season: u32,
    /// `-1` when no episode number was found.
    pub episode: i32,
    pub kind: MediaKind,
    pub file_kind: FileKind,
}

/// Analyzes a file path relative to the library root.
pub fn analyze(path: &str) -> Analysis {
    let layout = split_layout(path);

    let mut components = Vec::new();
    for part in [
        &layout.primary,
        &layout.secondary,
        &layout.sub_path,
        &layout.file_name,
    ] {
        if !part.is_empty() {
            components.push(analyze_component(tokenize(part)));
        }
    }

    let mut analysis = merge(&components);
    analysis.file_kind = classify_file(&layout.extension, analysis.kind);
    analysis
}

fn merge(components: &[ComponentAnalysis]) -> Analysis {
    let mut titles = Vec::new();
    let mut year = 0;
    for component in components {
        let title = title_string(&component.tokens);
        if !title.is_empty()
            && !titles.iter().any(|t: &String| t.to_lowercase() == title.to_lowercase())
        {
            titles.push(title);
        }
        if year == 0 {
            year = component.year;
        }
    }

    let mut season = 0;
    let mut episode = -1;
    for component in components.iter().rev() {
        if season == 0 {
            season = component.season;
        }
        if episode < 0 {
            episode = component.episode;
        }
    }

    let episode_name = components
        .last()
        .map(|c| title_string(&c.tokens))
        .unwrap_or_default();
    let kind = if season != 0 { MediaKind::TvSeries } else { MediaKind::Film };

    Analysis {
        titles,
        episode_name,
        year,
        season,
        episode,
        kind,
        file_kind: FileKind::Insignificant,
    }
}

fn classify_file(extension: &str, kind: MediaKind) -> FileKind {
    let ext = extension.to_lowercase();
    let mut file_kind = FileKind::Insignificant;
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        file_kind = match kind {
            MediaKind::TvSeries => FileKind::Episode,
            MediaKind::Film => FileKind::Film,
        };
    }
    if SUBTITLE_EXTENSIONS.contains(&ext.as_str()) {
        file_kind = FileKind::MediaSupply;
    }
    file_kind
}
