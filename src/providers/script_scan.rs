use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PipelineError;
use crate::requester::handler::DocumentFetcher;
use crate::scraper::common::PageDocument;
use crate::scraper::rules::DEFAULT_SITE_ORIGIN;

pub const LULUVDO_EMBED_ENDPOINT: &str = "https://luluvdo.com/dl?op=embed&file_code=";

static VIDOZA_SRC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"src: "(.*?)""#).unwrap());
static VIDMOLY_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"file:\s*"(https?://.*?)""#).unwrap());
static LULUVDO_FILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"file:\s*"([^"]+)""#).unwrap());
static VOE_REDIRECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"window\.location\.href\s*=\s*'(https://[^/]+/e/\w+)';").unwrap()
});
static VOE_HLS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'hls':\s*'([^']*)'").unwrap());

fn not_found(provider: &str) -> PipelineError {
    PipelineError::NotFound {
        provider: provider.to_string(),
    }
}

fn first_script_capture<F>(html_content: &str, re: &Regex, script_filter: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    PageDocument::parse(html_content)
        .script_texts()
        .iter()
        .filter(|s| script_filter(s.as_str()))
        .find_map(|s| re.captures(s.as_str()).map(|c| c[1].to_string()))
}

/// Vidoza embeds the source in the player setup script next to `sourcesCode:`.
pub fn vidoza_get_direct_link(html_content: &str) -> Result<String, PipelineError> {
    first_script_capture(html_content, &VIDOZA_SRC_RE, |s| s.contains("sourcesCode:"))
        .ok_or_else(|| not_found("Vidoza"))
}

pub fn vidmoly_get_direct_link(html_content: &str) -> Result<String, PipelineError> {
    first_script_capture(html_content, &VIDMOLY_FILE_RE, |_| true)
        .ok_or_else(|| not_found("Vidmoly"))
}

/// Luluvdo serves the player setup from its `dl?op=embed` endpoint keyed by file code.
pub fn luluvdo_embed_url(embed_url: &str) -> String {
    let file_code = embed_url.rsplit('/').next().unwrap_or(embed_url);
    format!(
        "{}{}&auto=1&referer={}",
        LULUVDO_EMBED_ENDPOINT, file_code, DEFAULT_SITE_ORIGIN
    )
}

pub fn luluvdo_get_direct_link(
    embed_url: &str,
    fetcher: &dyn DocumentFetcher,
) -> Result<String, PipelineError> {
    let player_url = luluvdo_embed_url(embed_url);
    debug!("[Luluvdo] Requesting {}", player_url);
    let page = fetcher.fetch_html(&player_url)?;
    LULUVDO_FILE_RE
        .captures(&page)
        .map(|c| c[1].to_string())
        .ok_or_else(|| not_found("Luluvdo"))
}

fn malformed(provider: &str, reason: impl ToString) -> PipelineError {
    PipelineError::Malformed {
        provider: provider.to_string(),
        reason: reason.to_string(),
    }
}

fn voe_decode_hls(encoded: &str) -> Result<String, PipelineError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| malformed("VOE", e))?;
    String::from_utf8(bytes).map_err(|e| malformed("VOE", e))
}

/// VOE either serves the `'hls'` source directly or first bounces through a
/// `window.location.href` redirect to the real embed page.
pub fn voe_get_direct_link(
    html_content: &str,
    fetcher: &dyn DocumentFetcher,
) -> Result<String, PipelineError> {
    if let Some(caps) = VOE_HLS_RE.captures(html_content) {
        return voe_decode_hls(&caps[1]);
    }

    let redirect_url = match VOE_REDIRECT_RE.captures(html_content) {
        Some(caps) => caps[1].to_string(),
        None => {
            warn!("[VOE] No redirect link found");
            return Err(not_found("VOE"));
        }
    };

    debug!("[VOE] Following redirect to {}", redirect_url);
    let redirected = fetcher.fetch_html(&redirect_url)?;
    match VOE_HLS_RE.captures(&redirected) {
        Some(caps) => voe_decode_hls(&caps[1]),
        None => {
            warn!("[VOE] No HLS link found");
            Err(not_found("VOE"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    struct OnePage(&'static str, String);

    impl DocumentFetcher for OnePage {
        fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
            if url == self.0 {
                Ok(self.1.clone())
            } else {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
            }
        }
    }

    #[test]
    fn test_vidoza_requires_sources_code_script() {
        let html = r#"<script>var p = { src: "https://decoy/x.mp4" };</script>
<script>window.pData = { sourcesCode: [{ src: "https://str38.vidoza.net/abc/v.mp4", type: "video/mp4" }] };</script>"#;
        assert_eq!(
            vidoza_get_direct_link(html).unwrap(),
            "https://str38.vidoza.net/abc/v.mp4"
        );
        assert!(matches!(
            vidoza_get_direct_link("<script>var a;</script>"),
            Err(PipelineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_vidmoly_file_pattern() {
        let html = r#"<script>player.setup({ sources: [{file:"https://box.vidmoly.to/hls/master.m3u8"}] });</script>"#;
        assert_eq!(
            vidmoly_get_direct_link(html).unwrap(),
            "https://box.vidmoly.to/hls/master.m3u8"
        );
    }

    #[test]
    fn test_voe_follows_redirect() {
        let hls = STANDARD.encode("https://delivery.voe.sx/engine/hls/master.m3u8");
        let target = OnePage(
            "https://voe.sx/e/abc123",
            format!("<script>var sources = {{ 'hls': '{}' }};</script>", hls),
        );
        let html = "<script>window.location.href = 'https://voe.sx/e/abc123';</script>";
        assert_eq!(
            voe_get_direct_link(html, &target).unwrap(),
            "https://delivery.voe.sx/engine/hls/master.m3u8"
        );
    }

    #[test]
    fn test_luluvdo_reads_embed_endpoint() {
        let target = OnePage(
            "https://luluvdo.com/dl?op=embed&file_code=u4z0xq1w&auto=1&referer=https://aniworld.to",
            r#"<script>jwplayer("vplayer").setup({ sources: [{file:"https://cdn.luluvdo.com/hls/u4z0xq1w/master.m3u8"}] });</script>"#
                .to_string(),
        );
        assert_eq!(
            luluvdo_get_direct_link("https://luluvdo.com/e/u4z0xq1w", &target).unwrap(),
            "https://cdn.luluvdo.com/hls/u4z0xq1w/master.m3u8"
        );
        assert!(matches!(
            luluvdo_get_direct_link("https://luluvdo.com/e/other", &target),
            Err(PipelineError::Fetch(_))
        ));
    }

    #[test]
    fn test_voe_invalid_hls_is_malformed() {
        let target = OnePage("https://voe.sx/e/none", String::new());
        let err = voe_get_direct_link("<script>var s = {'hls': '!!notb64'};</script>", &target)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Malformed { ref provider, .. } if provider == "VOE"));
        assert!(!err.to_string().contains("stage"));
    }

    #[test]
    fn test_voe_without_redirect_or_hls() {
        let target = OnePage("https://voe.sx/e/none", String::new());
        assert!(matches!(
            voe_get_direct_link("<p>gone</p>", &target),
            Err(PipelineError::NotFound { .. })
        ));
    }
}
