//! Fixed extraction rules for the aniworld episode page.

pub const DEFAULT_SITE_ORIGIN: &str = "https://aniworld.to";

/// Descriptions longer than this many words are shortened with `" [...]"`.
pub const DESCRIPTION_WORD_LIMIT: usize = 15;

pub const DEFAULT_TITLE: &str = "Title not found";
pub const DEFAULT_SLUG: &str = "Slug not found";
pub const DEFAULT_DESCRIPTION: &str = "Description not found";
pub const DEFAULT_GERMAN_TITLE: &str = "German title not found";
pub const DEFAULT_ENGLISH_TITLE: &str = "English title not found";
pub const NOT_FOUND: &str = "Not found";
pub const UNKNOWN_HOST: &str = "Unknown Host";
pub const NO_LINK: &str = "No link";

pub const ACTIVE_LINK_SELECTOR: &str = ".currentActiveLink a";
pub const ACTIVE_LINK_LABEL_SELECTOR: &str = "span[itemprop='name']";
pub const LANGUAGE_BOX_SELECTOR: &str = ".changeLanguageBox";
pub const LANGUAGE_IMG_SELECTOR: &str = "img[data-lang-key]";
pub const LANG_KEY_ATTR: &str = "data-lang-key";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataField {
    Title,
    Description,
    GermanTitle,
    EnglishTitle,
}

impl MetadataField {
    pub const ALL: [MetadataField; 4] = [
        MetadataField::Title,
        MetadataField::Description,
        MetadataField::GermanTitle,
        MetadataField::EnglishTitle,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleSource {
    /// Trimmed text content of the first match.
    Text,
    /// Raw value of an attribute on the first match.
    Attr(&'static str),
}

#[derive(Clone, Copy, Debug)]
pub struct SelectorRule {
    pub field: MetadataField,
    pub selector: &'static str,
    pub source: RuleSource,
    pub default: &'static str,
}

static TITLE_RULE: SelectorRule = SelectorRule {
    field: MetadataField::Title,
    selector: ".series-title h1 span",
    source: RuleSource::Text,
    default: DEFAULT_TITLE,
};

static DESCRIPTION_RULE: SelectorRule = SelectorRule {
    field: MetadataField::Description,
    selector: ".seri_des",
    source: RuleSource::Attr("data-full-description"),
    default: DEFAULT_DESCRIPTION,
};

static GERMAN_TITLE_RULE: SelectorRule = SelectorRule {
    field: MetadataField::GermanTitle,
    selector: ".episodeGermanTitle",
    source: RuleSource::Text,
    default: DEFAULT_GERMAN_TITLE,
};

static ENGLISH_TITLE_RULE: SelectorRule = SelectorRule {
    field: MetadataField::EnglishTitle,
    selector: ".episodeEnglishTitle",
    source: RuleSource::Text,
    default: DEFAULT_ENGLISH_TITLE,
};

pub fn rule_for(field: MetadataField) -> &'static SelectorRule {
    match field {
        MetadataField::Title => &TITLE_RULE,
        MetadataField::Description => &DESCRIPTION_RULE,
        MetadataField::GermanTitle => &GERMAN_TITLE_RULE,
        MetadataField::EnglishTitle => &ENGLISH_TITLE_RULE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_for_returns_matching_field() {
        for field in MetadataField::ALL {
            assert_eq!(rule_for(field).field, field);
        }
        assert_eq!(rule_for(MetadataField::Title).default, "Title not found");
        assert_eq!(
            rule_for(MetadataField::Description).source,
            RuleSource::Attr("data-full-description")
        );
    }
}
