//! Per-component heuristic analysis
//!
//! Extracts season, year and episode numbers out of a tokenized path
//! component and guesses how many of the leading tokens form the title.
//! The steps run in a fixed order; each one only marks tokens for removal
//! and never reorders them.

use once_cell::sync::Lazy;
use regex::Regex;

use super::tokens::Token;

static SEASON_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"s\d\d?").unwrap());
static GLUED_SEASON: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"s\d\d?", r"season\d\d?", r"сезон\d\d?", r"\d\d?season"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});
static SHORT_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d\d?$").unwrap());
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());
static NOISE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"rip$", r"^\d{3,4}p$", r"^\d{4}$", r"remux$"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});
static EPISODE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"e\d\d").unwrap());
static EPISODE_X_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"x\d\d").unwrap());
static TWO_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d\d$").unwrap());
static ONE_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d$").unwrap());

const SEASON_WORDS: [&str; 3] = ["сезон", "season", "sezon"];
const NOISE_WORDS: [&str; 13] = [
    "rus", "eng", "avo", "remastered", "web", "dl", "webdl", "sub", "lostfilm",
    "unrated", "dvd", "сериал", "серия",
];

/// What a single path component yielded. Episode is `-1` when unknown,
/// season and year are `0` when unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentAnalysis {
    pub tokens: Vec<Token>,
    pub season: u32,
    pub year: u32,
    pub episode: i32,
}

struct Pipeline {
    tokens: Vec<Token>,
    removed: Vec<bool>,
    season: u32,
    /// Set when the split-season step matched; only that step suppresses
    /// the glued-code fallback.
    split_season_matched: bool,
    year: u32,
    episode: i32,
}

fn parse_digits(text: &str) -> u32 {
    let digits: String = text.chars().filter(|ch| ch.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

impl Pipeline {
    fn new(tokens: Vec<Token>) -> Self {
        let removed = vec![false; tokens.len()];
        Self {
            tokens,
            removed,
            season: 0,
            split_season_matched: false,
            year: 0,
            episode: -1,
        }
    }

    fn find_from(&self, start: usize, pred: impl Fn(&Token) -> bool) -> Option<usize> {
        self.tokens[start..].iter().position(|t| pred(t)).map(|i| start + i)
    }

    fn find(&self, pred: impl Fn(&Token) -> bool) -> Option<usize> {
        self.find_from(0, pred)
    }

    /// A lone token like "strangerthingss03" carries a glued season code;
    /// the code is cut out of the token and the remainder stays as title.
    fn glued_single_token_season(&mut self) {
        if self.tokens.len() != 1 {
            return;
        }
        let Some(m) = SEASON_CODE.find(&self.tokens[0].text) else {
            return;
        };
        let range = m.range();
        self.season = parse_digits(m.as_str());
        self.tokens[0].text.replace_range(range, "");
    }

    /// "Сезон 2", "Season 01", "2 Season" and the russian ordinal form
    /// "6-й сезон" all put the number in a token adjacent to the word.
    fn split_season(&mut self) {
        let Some(pos) = self.find(|t| SEASON_WORDS.contains(&t.text.as_str())) else {
            return;
        };
        let mut found = None;
        if pos + 1 < self.tokens.len() && SHORT_NUMBER.is_match(&self.tokens[pos + 1].text) {
            found = Some(pos + 1);
        } else if pos > 0 && SHORT_NUMBER.is_match(&self.tokens[pos - 1].text) {
            found = Some(pos - 1);
        }
        if found.is_none()
            && pos > 1
            && self.tokens[pos - 1].text == "й"
            && SHORT_NUMBER.is_match(&self.tokens[pos - 2].text)
        {
            found = Some(pos - 2);
        }
        if let Some(found) = found {
            self.season = parse_digits(&self.tokens[found].text);
            self.split_season_matched = true;
            self.removed[pos] = true;
            self.removed[found] = true;
        }
    }

    fn glued_season(&mut self) {
        if self.split_season_matched {
            return;
        }
        let mut found = None;
        for (i, token) in self.tokens.iter().enumerate() {
            if let Some(m) = GLUED_SEASON.iter().find_map(|re| re.find(&token.text)) {
                found = Some((i, parse_digits(m.as_str())));
                break;
            }
        }
        if let Some((pos, season)) = found {
            self.season = season;
            self.removed[pos] = true;
        }
    }

    fn year(&mut self) {
        if let Some(pos) = self.find(|t| YEAR.is_match(&t.text)) {
            self.year = parse_digits(&self.tokens[pos].text);
            self.removed[pos] = true;
        }
    }

    fn noise(&mut self) {
        for (i, token) in self.tokens.iter().enumerate() {
            if token.in_braces
                || NOISE_WORDS.contains(&token.text.as_str())
                || NOISE.iter().any(|re| re.is_match(&token.text))
            {
                self.removed[i] = true;
            }
        }
    }

    fn episode(&mut self) {
        for code in [&EPISODE_CODE, &EPISODE_X_CODE] {
            if let Some(pos) = self.find(|t| code.is_match(&t.text)) {
                if let Some(m) = code.find(&self.tokens[pos].text) {
                    self.episode = parse_digits(m.as_str()) as i32;
                    self.removed[pos] = true;
                    return;
                }
            }
        }

        // First two-digit token not already claimed by another step.
        let mut start = 0;
        while let Some(pos) = self.find_from(start, |t| TWO_DIGITS.is_match(&t.text)) {
            if !self.removed[pos] {
                self.episode = parse_digits(&self.tokens[pos].text) as i32;
                self.removed[pos] = true;
                return;
            }
            start = pos + 1;
        }

        // A lone digit can be an episode number, but it can just as well be
        // part of the title, so it is not removed.
        if let Some(pos) = self.find(|t| ONE_DIGIT.is_match(&t.text)) {
            if !self.removed[pos] {
                self.episode = parse_digits(&self.tokens[pos].text) as i32;
            }
        }
    }

    /// Everything from the first removed token onward is assumed to be
    /// release metadata rather than title. A removal at index 1 is forgiven
    /// when the component starts with a number ("12 Monkeys").
    fn guess_title_length(&self) -> usize {
        for (i, removed) in self.removed.iter().enumerate() {
            if *removed && i != 0 {
                if i == 1 && self.tokens[0].is_digits() {
                    continue;
                }
                return i;
            }
        }
        self.tokens.len()
    }

    fn crop(mut self) -> ComponentAnalysis {
        let max_len = self.guess_title_length();
        let mut tokens = Vec::new();
        for (i, token) in self.tokens.drain(..).enumerate() {
            if tokens.len() == max_len {
                break;
            }
            if !self.removed[i] {
                tokens.push(token);
            }
        }
        ComponentAnalysis {
            tokens,
            season: self.season,
            year: self.year,
            episode: self.episode,
        }
    }
}

/// Runs the full extraction pipeline over one tokenized path component.
pub fn analyze_component(tokens: Vec<Token>) -> ComponentAnalysis {
    let mut p = Pipeline::new(tokens);
    p.glued_single_token_season();
    p.split_season();
    p.glued_season();
    p.year();
    p.noise();
    p.episode();
    p.crop()
}
