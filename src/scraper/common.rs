use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static SEL_SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script").unwrap());

/// Parsed HTML page exposing only the queries the extractors need:
/// first by selector, all by tag + class predicate, and inline script text.
pub struct PageDocument {
    html: Html,
}

impl PageDocument {
    pub fn parse(html_content: &str) -> Self {
        Self {
            html: Html::parse_document(html_content),
        }
    }

    pub fn first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// All `tag` elements whose `class` attribute satisfies `class_pred`, in document order.
    pub fn find_all<P>(&self, tag: &str, class_pred: P) -> Vec<ElementRef<'_>>
    where
        P: Fn(&str) -> bool,
    {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| {
                el.value().name() == tag && el.value().attr("class").map_or(false, &class_pred)
            })
            .collect()
    }

    pub fn script_texts(&self) -> Vec<String> {
        self.html
            .select(&SEL_SCRIPT)
            .map(|s| get_text_content(&s))
            .filter(|t| !t.trim().is_empty())
            .collect()
    }
}

pub fn get_text_content(el: &ElementRef) -> String {
    el.text().collect::<Vec<_>>().join("")
}

/// Trimmed text, or `None` when the element has no visible text.
pub fn trimmed_text(el: &ElementRef) -> Option<String> {
    let text = get_text_content(el).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub fn non_empty_attr<'a>(el: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name).filter(|v| !v.is_empty())
}

pub fn first_number(text: &str) -> Option<String> {
    NUMBER_RE.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_all_by_tag_and_class() {
        let doc = PageDocument::parse(
            r#"<ul><li class="a episodeLink1">x</li><li class="b">y</li><p class="episodeLink2"></p></ul>"#,
        );
        let found = doc.find_all("li", |c| c.contains("episodeLink"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value().attr("class"), Some("a episodeLink1"));
    }

    #[test]
    fn test_first_number() {
        assert_eq!(first_number("Episode 12"), Some("12".to_string()));
        assert_eq!(first_number("Film"), None);
    }

    #[test]
    fn test_script_texts_skip_empty() {
        let doc = PageDocument::parse(
            r#"<html><head><script src="x.js"></script><script>var a = 1;</script></head></html>"#,
        );
        assert_eq!(doc.script_texts(), vec!["var a = 1;".to_string()]);
    }

    #[test]
    fn test_trimmed_text_empty_is_none() {
        let doc = PageDocument::parse(r#"<span class="t">   </span><span class="u"> Hi </span>"#);
        let t = Selector::parse(".t").unwrap();
        let u = Selector::parse(".u").unwrap();
        assert_eq!(trimmed_text(&doc.first(&t).unwrap()), None);
        assert_eq!(trimmed_text(&doc.first(&u).unwrap()), Some("Hi".to_string()));
    }
}
