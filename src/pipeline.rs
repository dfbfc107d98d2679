use log::{debug, info, warn};

use crate::error::PipelineError;
use crate::models::{EpisodePage, EpisodeRef, StreamLink};
use crate::providers::Provider;
use crate::requester::handler::{DocumentFetcher, LinkResolver, RequestHandler};
use crate::scraper::common::PageDocument;
use crate::scraper::episode_links::collect_episode_links_for;
use crate::scraper::metadata_parser::extract_metadata_with_limit;
use crate::scraper::rules::{DEFAULT_SITE_ORIGIN, DESCRIPTION_WORD_LIMIT};

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Prefix for the relative redirect hrefs of the link rows.
    pub site_origin: String,
    pub description_word_limit: usize,
    /// Hosters the pipeline is allowed to resolve.
    pub supported_providers: Vec<Provider>,
}

impl PipelineConfig {
    pub fn is_supported(&self, provider: Provider) -> bool {
        self.supported_providers.contains(&provider)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            site_origin: DEFAULT_SITE_ORIGIN.to_string(),
            description_word_limit: DESCRIPTION_WORD_LIMIT,
            supported_providers: Provider::DEFAULT_SUPPORTED.to_vec(),
        }
    }
}

/// Runs metadata extraction and link collection over one episode page.
pub fn extract_episode_page(html_content: &str, url: &str, config: &PipelineConfig) -> EpisodePage {
    let document = PageDocument::parse(html_content);
    EpisodePage {
        url: url.to_string(),
        metadata: extract_metadata_with_limit(&document, url, config.description_word_limit),
        provider_links: collect_episode_links_for(&document, &config.site_origin),
    }
}

pub struct EpisodePipeline<F, R> {
    config: PipelineConfig,
    fetcher: F,
    resolver: R,
}

impl<'a> EpisodePipeline<&'a RequestHandler, &'a RequestHandler> {
    /// Uses one HTTP handler for both fetching and redirect resolution.
    pub fn with_handler(config: PipelineConfig, handler: &'a RequestHandler) -> Self {
        Self::new(config, handler, handler)
    }
}

impl<F: DocumentFetcher, R: LinkResolver> EpisodePipeline<F, R> {
    pub fn new(config: PipelineConfig, fetcher: F, resolver: R) -> Self {
        Self {
            config,
            fetcher,
            resolver,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn extract(&self, html_content: &str, url: &str) -> EpisodePage {
        extract_episode_page(html_content, url, &self.config)
    }

    pub fn fetch_episode(&self, url: &str) -> Result<EpisodePage, PipelineError> {
        info!("[Pipeline] Fetching episode page {}", url);
        let html = self.fetcher.fetch_html(url)?;
        Ok(self.extract(&html, url))
    }

    pub fn fetch_episode_ref(&self, episode: &EpisodeRef) -> Result<EpisodePage, PipelineError> {
        self.fetch_episode(&episode.to_url(&self.config.site_origin))
    }

    /// Resolves the chosen `(hoster, language)` link of `page` to a direct media url.
    ///
    /// Selection and support are checked before any request is made.
    pub fn resolve_stream(
        &self,
        page: &EpisodePage,
        hoster: &str,
        language: &str,
    ) -> Result<StreamLink, PipelineError> {
        let redirect_url = page
            .provider_links
            .get(hoster, language)
            .ok_or_else(|| PipelineError::SelectionUnavailable {
                hoster: hoster.to_string(),
                language: language.to_string(),
            })?
            .to_string();

        let provider = match Provider::from_name(hoster) {
            Some(p) if self.config.is_supported(p) => p,
            _ => {
                warn!("[Pipeline] No extraction rule for hoster '{}'", hoster);
                return Err(PipelineError::ProviderUnsupported(hoster.to_string()));
            }
        };

        let embed_url = self.resolver.resolve_link(&redirect_url)?;
        debug!("[Pipeline] {} resolved to {}", redirect_url, embed_url);

        let embed_html = self.fetcher.fetch_html(&embed_url)?;
        let direct_url = provider.extract_direct_link(&embed_url, &embed_html, &self.fetcher)?;
        info!("[Pipeline] {} ({}) -> {}", provider, language, direct_url);

        Ok(StreamLink {
            hoster: provider.name().to_string(),
            language: language.to_string(),
            redirect_url,
            embed_url,
            direct_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::providers::speedfiles;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const EPISODE_URL: &str = "https://aniworld.to/anime/stream/some-show/staffel-1/episode-3";
    const MEDIA_URL: &str = "https://cdn.speedfiles.net/store_access/abc?token=T0k3n&t=1&sp=1500";

    const EPISODE_HTML: &str = r#"
<html><body>
  <div class="series-title"><h1><span>Some Show</span></h1></div>
  <li class="currentActiveLink"><a href="/anime/stream/some-show/staffel-1/episode-3"><span itemprop="name">Episode 3</span></a></li>
  <div class="changeLanguageBox"><img data-lang-key="1"><img data-lang-key="3"></div>
  <ul>
    <li class="episodeLink1" data-lang-key="3"><a href="/redirect/1"><i title="Hoster SpeedFiles"></i></a></li>
    <li class="episodeLink2" data-lang-key="1"><a href="/redirect/2"><i title="Hoster Vidoza"></i></a></li>
    <li class="episodeLink3" data-lang-key="1"><a href="/redirect/3"><i title="Hoster Streamtape"></i></a></li>
  </ul>
</body></html>"#;

    #[derive(Default)]
    struct FakeWeb {
        pages: HashMap<String, String>,
        redirects: HashMap<String, String>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeWeb {
        fn page(mut self, url: &str, html: String) -> Self {
            self.pages.insert(url.to_string(), html);
            self
        }

        fn redirect(mut self, from: &str, to: &str) -> Self {
            self.redirects.insert(from.to_string(), to.to_string());
            self
        }
    }

    impl DocumentFetcher for FakeWeb {
        fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
            self.requests.borrow_mut().push(url.to_string());
            self.pages.get(url).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    impl LinkResolver for FakeWeb {
        fn resolve_link(&self, url: &str) -> Result<String, FetchError> {
            self.requests.borrow_mut().push(url.to_string());
            Ok(self.redirects.get(url).cloned().unwrap_or_else(|| url.to_string()))
        }
    }

    fn web() -> FakeWeb {
        FakeWeb::default()
            .page(EPISODE_URL, EPISODE_HTML.to_string())
            .redirect(
                "https://aniworld.to/redirect/1",
                "https://speedfiles.net/d2bb8bb75e7d",
            )
            .page(
                "https://speedfiles.net/d2bb8bb75e7d",
                format!(
                    r#"<script>var _0x5opu234 = "{}";</script>"#,
                    speedfiles::encode(MEDIA_URL)
                ),
            )
    }

    #[test]
    fn test_fetch_episode_extracts_page() {
        let web = web();
        let pipeline = EpisodePipeline::new(PipelineConfig::default(), &web, &web);
        let page = pipeline.fetch_episode(EPISODE_URL).unwrap();

        assert_eq!(page.metadata.title, "Some Show");
        assert_eq!(page.metadata.season, "1");
        assert_eq!(page.metadata.episode, "3");
        assert_eq!(page.metadata.languages_display(), "German Dub, German Sub");
        assert_eq!(
            page.provider_links.hoster_names(),
            vec!["SpeedFiles", "Vidoza", "Streamtape"]
        );
    }

    #[test]
    fn test_fetch_episode_ref_builds_url() {
        let web = web();
        let pipeline = EpisodePipeline::new(PipelineConfig::default(), &web, &web);
        let page = pipeline
            .fetch_episode_ref(&EpisodeRef::new("some-show", 1, 3))
            .unwrap();
        assert_eq!(page.url, EPISODE_URL);
    }

    #[test]
    fn test_resolve_speedfiles_stream() {
        let web = web();
        let pipeline = EpisodePipeline::new(PipelineConfig::default(), &web, &web);
        let page = pipeline.extract(EPISODE_HTML, EPISODE_URL);

        let stream = pipeline
            .resolve_stream(&page, "Speedfiles", "German Sub")
            .unwrap();
        assert_eq!(stream.hoster, "SpeedFiles");
        assert_eq!(stream.redirect_url, "https://aniworld.to/redirect/1");
        assert_eq!(stream.embed_url, "https://speedfiles.net/d2bb8bb75e7d");
        assert_eq!(stream.direct_url, MEDIA_URL);
    }

    #[test]
    fn test_missing_selection_makes_no_requests() {
        let web = web();
        let pipeline = EpisodePipeline::new(PipelineConfig::default(), &web, &web);
        let page = pipeline.extract(EPISODE_HTML, EPISODE_URL);

        let err = pipeline
            .resolve_stream(&page, "SpeedFiles", "English Sub")
            .unwrap_err();
        assert!(matches!(err, PipelineError::SelectionUnavailable { .. }));
        assert!(web.requests.borrow().is_empty());
    }

    #[test]
    fn test_unsupported_hoster() {
        let web = web();
        let pipeline = EpisodePipeline::new(PipelineConfig::default(), &web, &web);
        let page = pipeline.extract(EPISODE_HTML, EPISODE_URL);

        let err = pipeline
            .resolve_stream(&page, "Streamtape", "German Dub")
            .unwrap_err();
        assert!(matches!(err, PipelineError::ProviderUnsupported(ref h) if h == "Streamtape"));
        assert!(web.requests.borrow().is_empty());
    }

    #[test]
    fn test_allow_list_excludes_provider() {
        let web = web();
        let config = PipelineConfig {
            supported_providers: vec![Provider::Vidoza],
            ..PipelineConfig::default()
        };
        let pipeline = EpisodePipeline::new(config, &web, &web);
        let page = pipeline.extract(EPISODE_HTML, EPISODE_URL);

        assert!(matches!(
            pipeline.resolve_stream(&page, "SpeedFiles", "German Sub"),
            Err(PipelineError::ProviderUnsupported(_))
        ));
    }

    #[test]
    fn test_fetch_failure_propagates() {
        let web = web();
        let pipeline = EpisodePipeline::new(PipelineConfig::default(), &web, &web);
        let page = pipeline.extract(EPISODE_HTML, EPISODE_URL);

        // redirect/2 resolves to itself and has no page behind it
        let err = pipeline
            .resolve_stream(&page, "Vidoza", "German Dub")
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Fetch(FetchError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn test_resolve_doodstream_stream() {
        let html = r#"<li class="episodeLink9" data-lang-key="1"><a href="/redirect/9"><i title="Hoster Doodstream"></i></a></li>"#;
        let web = FakeWeb::default()
            .redirect("https://aniworld.to/redirect/9", "https://dood.li/e/abc")
            .page(
                "https://dood.li/e/abc",
                "<script>$.get('/pass_md5/1-2/xyz', function(d) {}); var t = '?token=tok42&expiry=';</script>"
                    .to_string(),
            )
            .page(
                "https://dood.li/pass_md5/1-2/xyz",
                "https://cdn.dood.video/abc~".to_string(),
            );
        let pipeline = EpisodePipeline::new(PipelineConfig::default(), &web, &web);
        let page = pipeline.extract(html, EPISODE_URL);

        let stream = pipeline
            .resolve_stream(&page, "Doodstream", "German Dub")
            .unwrap();
        assert_eq!(stream.embed_url, "https://dood.li/e/abc");
        assert!(stream.direct_url.starts_with("https://cdn.dood.video/abc~"));
        assert!(stream.direct_url.contains("?token=tok42&expiry="));
    }

    #[test]
    fn test_luluvdo_is_opt_in() {
        let config = PipelineConfig::default();
        assert!(config.is_supported(Provider::Doodstream));
        assert!(!config.is_supported(Provider::Luluvdo));
    }

    #[test]
    fn test_custom_origin_and_word_limit() {
        let config = PipelineConfig {
            site_origin: "https://s.to/".to_string(),
            description_word_limit: 2,
            ..PipelineConfig::default()
        };
        let html = r#"<p class="seri_des" data-full-description="one two three"></p>
<li class="episodeLink5" data-lang-key="2"><a href="/redirect/5"><i title="Hoster VOE"></i></a></li>"#;
        let page = extract_episode_page(html, EPISODE_URL, &config);
        assert_eq!(page.metadata.description_short, "one two [...]");
        assert_eq!(
            page.provider_links.get("VOE", "English Sub"),
            Some("https://s.to/redirect/5")
        );
    }
}
