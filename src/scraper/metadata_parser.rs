use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;

use crate::models::{LanguageKey, PageMetadata};
use crate::scraper::common::{first_number, non_empty_attr, trimmed_text, PageDocument};
use crate::scraper::rules::{
    rule_for, MetadataField, RuleSource, ACTIVE_LINK_LABEL_SELECTOR, ACTIVE_LINK_SELECTOR,
    DEFAULT_SLUG, DESCRIPTION_WORD_LIMIT, LANGUAGE_BOX_SELECTOR, LANGUAGE_IMG_SELECTOR,
    LANG_KEY_ATTR, NOT_FOUND,
};

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/anime/stream/([^/]+)").unwrap());
static SEASON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"staffel-(\d+)").unwrap());

static SEL_TITLE: Lazy<Selector> = Lazy::new(|| rule_selector(MetadataField::Title));
static SEL_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| rule_selector(MetadataField::Description));
static SEL_GERMAN_TITLE: Lazy<Selector> =
    Lazy::new(|| rule_selector(MetadataField::GermanTitle));
static SEL_ENGLISH_TITLE: Lazy<Selector> =
    Lazy::new(|| rule_selector(MetadataField::EnglishTitle));
static SEL_ACTIVE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(ACTIVE_LINK_SELECTOR).unwrap());
static SEL_ACTIVE_LABEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(ACTIVE_LINK_LABEL_SELECTOR).unwrap());
static SEL_LANGUAGE_BOX: Lazy<Selector> =
    Lazy::new(|| Selector::parse(LANGUAGE_BOX_SELECTOR).unwrap());
static SEL_LANGUAGE_IMG: Lazy<Selector> =
    Lazy::new(|| Selector::parse(LANGUAGE_IMG_SELECTOR).unwrap());

fn rule_selector(field: MetadataField) -> Selector {
    Selector::parse(rule_for(field).selector).unwrap()
}

fn selector_for(field: MetadataField) -> &'static Selector {
    match field {
        MetadataField::Title => &*SEL_TITLE,
        MetadataField::Description => &*SEL_DESCRIPTION,
        MetadataField::GermanTitle => &*SEL_GERMAN_TITLE,
        MetadataField::EnglishTitle => &*SEL_ENGLISH_TITLE,
    }
}

fn apply_rule(document: &PageDocument, field: MetadataField) -> String {
    let rule = rule_for(field);
    let selector = selector_for(field);

    let value = document.first(selector).and_then(|el| match rule.source {
        RuleSource::Text => trimmed_text(&el),
        RuleSource::Attr(name) => non_empty_attr(&el, name).map(str::to_string),
    });

    value.unwrap_or_else(|| {
        debug!("No match for {:?} ({}), using default", field, rule.selector);
        rule.default.to_string()
    })
}

pub fn extract_slug(source_url: &str) -> String {
    SLUG_RE
        .captures(source_url)
        .and_then(|c| c.get(1))
        .map_or_else(|| DEFAULT_SLUG.to_string(), |m| m.as_str().to_string())
}

/// Keeps the first `word_limit` space-separated words and appends `" [...]"`.
pub fn shorten_description(description: &str, word_limit: usize) -> String {
    let words: Vec<&str> = description.split(' ').collect();
    if words.len() > word_limit {
        format!("{} [...]", words[..word_limit].join(" "))
    } else {
        description.to_string()
    }
}

/// Returns `(season, episode)` read from the currently active episode link.
pub fn extract_season_and_episode(document: &PageDocument) -> (String, String) {
    let active = match document.first(&SEL_ACTIVE_LINK) {
        Some(a) => a,
        None => return (NOT_FOUND.to_string(), NOT_FOUND.to_string()),
    };

    let episode = active
        .select(&SEL_ACTIVE_LABEL)
        .next()
        .and_then(|label| trimmed_text(&label))
        .and_then(|text| first_number(&text))
        .unwrap_or_else(|| NOT_FOUND.to_string());

    let season = active
        .value()
        .attr("href")
        .and_then(|href| SEASON_RE.captures(href))
        .map_or_else(|| NOT_FOUND.to_string(), |c| c[1].to_string());

    (season, episode)
}

pub fn extract_available_languages(document: &PageDocument) -> Vec<String> {
    let labels: Vec<String> = document
        .first(&SEL_LANGUAGE_BOX)
        .map(|language_box| {
            language_box
                .select(&SEL_LANGUAGE_IMG)
                .filter_map(|img| img.value().attr(LANG_KEY_ATTR))
                .filter(|key| key.trim().parse::<i64>().is_ok())
                .map(|key| LanguageKey::parse(Some(key)).label())
                .collect()
        })
        .unwrap_or_default();

    if labels.is_empty() {
        vec![NOT_FOUND.to_string()]
    } else {
        labels
    }
}

pub fn extract_metadata(document: &PageDocument, source_url: &str) -> PageMetadata {
    extract_metadata_with_limit(document, source_url, DESCRIPTION_WORD_LIMIT)
}

pub fn extract_metadata_with_limit(
    document: &PageDocument,
    source_url: &str,
    word_limit: usize,
) -> PageMetadata {
    let description = apply_rule(document, MetadataField::Description);
    let description_short = shorten_description(&description, word_limit);
    let (season, episode) = extract_season_and_episode(document);

    let meta = PageMetadata {
        title: apply_rule(document, MetadataField::Title),
        slug: extract_slug(source_url),
        description,
        description_short,
        german_title: apply_rule(document, MetadataField::GermanTitle),
        english_title: apply_rule(document, MetadataField::EnglishTitle),
        season,
        episode,
        available_languages: extract_available_languages(document),
    };

    debug!(
        "Parsed metadata: slug={}, season={}, episode={}, languages={}",
        meta.slug,
        meta.season,
        meta.episode,
        meta.languages_display()
    );

    meta
}
