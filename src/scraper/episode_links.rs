use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::models::{LanguageKey, ProviderLinkMap};
use crate::scraper::common::{non_empty_attr, PageDocument};
use crate::scraper::rules::{DEFAULT_SITE_ORIGIN, LANG_KEY_ATTR, NO_LINK, UNKNOWN_HOST};

static EPISODE_LINK_CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"episodeLink\d+").unwrap());
static SEL_ICON: Lazy<Selector> = Lazy::new(|| Selector::parse("i").unwrap());
static SEL_A: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Hoster name is the second word of the icon title, e.g. `"Hoster VOE"`.
fn hoster_name(row: &ElementRef) -> String {
    row.select(&SEL_ICON)
        .next()
        .and_then(|icon| icon.value().attr("title"))
        .and_then(|title| title.split_whitespace().nth(1))
        .map_or_else(|| UNKNOWN_HOST.to_string(), str::to_string)
}

fn row_href<'a>(row: &ElementRef<'a>) -> &'a str {
    row.select(&SEL_A)
        .next()
        .and_then(|a| non_empty_attr(&a, "href"))
        .unwrap_or(NO_LINK)
}

pub fn collect_episode_links(document: &PageDocument) -> ProviderLinkMap {
    collect_episode_links_for(document, DEFAULT_SITE_ORIGIN)
}

pub fn collect_episode_links_for(document: &PageDocument, site_origin: &str) -> ProviderLinkMap {
    let origin = site_origin.trim_end_matches('/');
    let mut links = ProviderLinkMap::new();

    let rows = document.find_all("li", |class| EPISODE_LINK_CLASS_RE.is_match(class));
    for row in &rows {
        let hoster = hoster_name(row);
        let language = LanguageKey::parse(row.value().attr(LANG_KEY_ATTR)).label();
        let url = format!("{}{}", origin, row_href(row));
        links.insert(&hoster, &language, url);
    }

    debug!(
        "Collected {} episode link rows across {} hosters",
        rows.len(),
        links.len()
    );
    links
}
