use crate::models::{EpisodePage, ProviderLinkMap};

/// Renders `hoster -> language -> url` as aligned text. All urls start at the
/// same column, `2 + longest language label` across every hoster.
pub fn format_provider_links(links: &ProviderLinkMap) -> String {
    let max_label_len = links
        .iter()
        .flat_map(|h| h.links.iter().map(|(lang, _)| lang.chars().count()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for hoster in links.iter() {
        out.push_str(&hoster.hoster);
        out.push('\n');
        for (lang, url) in &hoster.links {
            let padding = " ".repeat(max_label_len - lang.chars().count() + 1);
            out.push_str(&format!("{}:{}{}\n", lang, padding, url));
        }
        out.push('\n');
    }
    out
}

pub fn format_episode_summary(page: &EpisodePage) -> String {
    let meta = &page.metadata;
    let rows = [
        ("Title", meta.title.as_str()),
        ("Slug", meta.slug.as_str()),
        ("Description", meta.description_short.as_str()),
        ("Season", meta.season.as_str()),
        ("Episode", meta.episode.as_str()),
        ("Ger. Title", meta.german_title.as_str()),
        ("Eng. Title", meta.english_title.as_str()),
    ];

    let mut out = format!("Details of {}\n\n", page.url);
    for (label, value) in rows {
        out.push_str(&format!("{:<16}{}\n", format!("{}:", label), value));
    }
    out.push_str(&format!("{:<16}{}\n\n", "Avl. Languages:", meta.languages_display()));
    out.push_str(&format_provider_links(&page.provider_links));
    out
}
