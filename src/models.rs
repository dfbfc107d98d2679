use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::scraper::rules::{
    DEFAULT_DESCRIPTION, DEFAULT_ENGLISH_TITLE, DEFAULT_GERMAN_TITLE, DEFAULT_SLUG,
    DEFAULT_TITLE, NOT_FOUND,
};

static EPISODE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/anime/stream/([^/?#]+)/staffel-(\d+)/episode-(\d+)").unwrap()
});

// ---------------------------------------------------------------------------
// LanguageKey
// ---------------------------------------------------------------------------

/// Dub/sub variant encoded by the `data-lang-key` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageKey {
    GermanDub,
    EnglishSub,
    GermanSub,
    Unknown(i64),
    Missing,
}

impl LanguageKey {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => LanguageKey::GermanDub,
            2 => LanguageKey::EnglishSub,
            3 => LanguageKey::GermanSub,
            other => LanguageKey::Unknown(other),
        }
    }

    /// Parses a raw attribute value. Anything that is not an integer is `Missing`.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|v| v.trim().parse::<i64>().ok())
            .map_or(LanguageKey::Missing, LanguageKey::from_code)
    }

    pub fn label(&self) -> String {
        match self {
            LanguageKey::GermanDub => "German Dub".to_string(),
            LanguageKey::EnglishSub => "English Sub".to_string(),
            LanguageKey::GermanSub => "German Sub".to_string(),
            LanguageKey::Unknown(code) => format!("Unknown ({})", code),
            LanguageKey::Missing => "Unknown Language".to_string(),
        }
    }
}

impl fmt::Display for LanguageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// ---------------------------------------------------------------------------
// PageMetadata
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "python", pyo3::pyclass(name = "RustPageMetadata", get_all))]
pub struct PageMetadata {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub description_short: String,
    pub german_title: String,
    pub english_title: String,
    pub season: String,
    pub episode: String,
    /// Language labels in page order; holds the single sentinel entry when none were found.
    pub available_languages: Vec<String>,
}

impl PageMetadata {
    pub fn languages_display(&self) -> String {
        self.available_languages.join(", ")
    }
}

impl Default for PageMetadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            slug: DEFAULT_SLUG.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            description_short: DEFAULT_DESCRIPTION.to_string(),
            german_title: DEFAULT_GERMAN_TITLE.to_string(),
            english_title: DEFAULT_ENGLISH_TITLE.to_string(),
            season: NOT_FOUND.to_string(),
            episode: NOT_FOUND.to_string(),
            available_languages: vec![NOT_FOUND.to_string()],
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderLinkMap
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HosterLinks {
    pub hoster: String,
    /// `(language label, absolute url)` in first-seen order.
    pub links: Vec<(String, String)>,
}

impl HosterLinks {
    pub fn get(&self, language: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|(lang, _)| lang == language)
            .map(|(_, url)| url.as_str())
    }
}

/// `hoster -> language -> url`, iterated in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderLinkMap {
    hosters: Vec<HosterLinks>,
}

impl ProviderLinkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a link. A repeated `(hoster, language)` pair overwrites the url but
    /// keeps the position of the first occurrence.
    pub fn insert(&mut self, hoster: &str, language: &str, url: String) {
        let idx = match self.hosters.iter().position(|h| h.hoster == hoster) {
            Some(i) => i,
            None => {
                self.hosters.push(HosterLinks {
                    hoster: hoster.to_string(),
                    links: Vec::new(),
                });
                self.hosters.len() - 1
            }
        };
        let entry = &mut self.hosters[idx];
        match entry.links.iter_mut().find(|(lang, _)| lang == language) {
            Some(slot) => slot.1 = url,
            None => entry.links.push((language.to_string(), url)),
        }
    }

    pub fn get(&self, hoster: &str, language: &str) -> Option<&str> {
        self.hoster(hoster)?.get(language)
    }

    /// Hoster lookup, ignoring ASCII case ("SpeedFiles" == "Speedfiles").
    pub fn hoster(&self, hoster: &str) -> Option<&HosterLinks> {
        self.hosters
            .iter()
            .find(|h| h.hoster == hoster)
            .or_else(|| self.hosters.iter().find(|h| h.hoster.eq_ignore_ascii_case(hoster)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &HosterLinks> {
        self.hosters.iter()
    }

    pub fn hoster_names(&self) -> Vec<&str> {
        self.hosters.iter().map(|h| h.hoster.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.hosters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosters.is_empty()
    }
}

// ---------------------------------------------------------------------------
// EpisodePage
// ---------------------------------------------------------------------------

/// Everything extracted from one episode page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "python", pyo3::pyclass(name = "RustEpisodePage"))]
pub struct EpisodePage {
    pub url: String,
    pub metadata: PageMetadata,
    pub provider_links: ProviderLinkMap,
}

impl EpisodePage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// EpisodeRef
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub slug: String,
    pub season: u32,
    pub episode: u32,
}

impl EpisodeRef {
    pub fn new(slug: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            slug: slug.into(),
            season,
            episode,
        }
    }

    /// Parses `.../anime/stream/<slug>/staffel-<n>/episode-<m>`.
    pub fn parse(url: &str) -> Option<Self> {
        let caps = EPISODE_URL_RE.captures(url)?;
        Some(Self {
            slug: caps[1].to_string(),
            season: caps[2].parse().ok()?,
            episode: caps[3].parse().ok()?,
        })
    }

    pub fn to_url(&self, origin: &str) -> String {
        format!(
            "{}/anime/stream/{}/staffel-{}/episode-{}",
            origin.trim_end_matches('/'),
            self.slug,
            self.season,
            self.episode
        )
    }
}

// ---------------------------------------------------------------------------
// StreamLink
// ---------------------------------------------------------------------------

/// A resolved stream for one `(hoster, language)` selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLink {
    pub hoster: String,
    pub language: String,
    pub redirect_url: String,
    pub embed_url: String,
    pub direct_url: String,
}
