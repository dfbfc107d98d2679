use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use once_cell::sync::Lazy;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;

use crate::error::PipelineError;
use crate::requester::handler::DocumentFetcher;

/// Host the `pass_md5` path is requested from.
pub const DOODSTREAM_ORIGIN: &str = "https://dood.li";

const SUFFIX_LEN: usize = 10;

static PASS_MD5_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\.get\('([^']*/pass_md5/[^']*)'").unwrap());
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"token=([a-zA-Z0-9]+)").unwrap());

fn not_found() -> PipelineError {
    PipelineError::NotFound {
        provider: "Doodstream".to_string(),
    }
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Returns the `pass_md5` path and the playback token from an embed page.
pub fn locate(html_content: &str) -> Option<(String, String)> {
    let pass_md5 = match PASS_MD5_RE.captures(html_content) {
        Some(caps) => caps[1].to_string(),
        None => {
            warn!("[Doodstream] pass_md5 url not found");
            return None;
        }
    };
    let token = match TOKEN_RE.captures(html_content) {
        Some(caps) => caps[1].to_string(),
        None => {
            warn!("[Doodstream] token not found");
            return None;
        }
    };
    Some((pass_md5, token))
}

pub fn build_direct_link(video_base: &str, suffix: &str, token: &str, expiry: u64) -> String {
    format!("{}{}?token={}&expiry={}", video_base.trim(), suffix, token, expiry)
}

/// The `pass_md5` endpoint answers with the media url prefix; the player appends
/// a random suffix, the token and the current unix time.
pub fn get_direct_link(
    html_content: &str,
    fetcher: &dyn DocumentFetcher,
) -> Result<String, PipelineError> {
    let (pass_md5, token) = locate(html_content).ok_or_else(not_found)?;
    let md5_url = format!("{}{}", DOODSTREAM_ORIGIN, pass_md5);
    debug!("[Doodstream] Requesting {}", md5_url);

    let video_base = fetcher.fetch_html(&md5_url)?;
    if video_base.trim().is_empty() {
        return Err(PipelineError::Malformed {
            provider: "Doodstream".to_string(),
            reason: "empty pass_md5 response".to_string(),
        });
    }

    Ok(build_direct_link(
        &video_base,
        &random_suffix(),
        &token,
        unix_now(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    struct OnePage(&'static str, &'static str);

    impl DocumentFetcher for OnePage {
        fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
            if url == self.0 {
                Ok(self.1.to_string())
            } else {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
            }
        }
    }

    const EMBED_HTML: &str = r#"<script>
$.get('/pass_md5/12345-67-89-1731385663-abcdef/q1w2e3r4t5', function(data) {
    dsplayer.src({ src: data + makePlay(), type: 'video/mp4' });
});
function makePlay() { return 'XXXXXXXXXX?token=k9Zx81Ab2c&expiry=' + Date.now(); }
</script>"#;

    #[test]
    fn test_locate_pass_md5_and_token() {
        assert_eq!(
            locate(EMBED_HTML),
            Some((
                "/pass_md5/12345-67-89-1731385663-abcdef/q1w2e3r4t5".to_string(),
                "k9Zx81Ab2c".to_string()
            ))
        );
        assert_eq!(locate("<script>$.get('/pass_md5/a/b')</script>"), None);
    }

    #[test]
    fn test_build_direct_link() {
        assert_eq!(
            build_direct_link(
                "https://x.cloudatacdn.com/u5kj/abc~\n",
                "AbCdEfGhIj",
                "tok1",
                1731385663
            ),
            "https://x.cloudatacdn.com/u5kj/abc~AbCdEfGhIj?token=tok1&expiry=1731385663"
        );
    }

    #[test]
    fn test_follows_pass_md5() {
        let md5 = OnePage(
            "https://dood.li/pass_md5/12345-67-89-1731385663-abcdef/q1w2e3r4t5",
            "https://x.cloudatacdn.com/u5kj/abc~",
        );
        let link = get_direct_link(EMBED_HTML, &md5).unwrap();

        let shape = Regex::new(
            r"^https://x\.cloudatacdn\.com/u5kj/abc~[A-Za-z0-9]{10}\?token=k9Zx81Ab2c&expiry=\d+$",
        )
        .unwrap();
        assert!(shape.is_match(&link), "unexpected link {}", link);
    }

    #[test]
    fn test_missing_token_is_not_found() {
        let md5 = OnePage("https://dood.li/pass_md5/a/b", "https://x/");
        assert!(matches!(
            get_direct_link("<script>$.get('/pass_md5/a/b')</script>", &md5),
            Err(PipelineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_empty_pass_md5_response_is_malformed() {
        let md5 = OnePage(
            "https://dood.li/pass_md5/12345-67-89-1731385663-abcdef/q1w2e3r4t5",
            "  ",
        );
        assert!(matches!(
            get_direct_link(EMBED_HTML, &md5),
            Err(PipelineError::Malformed { .. })
        ));
    }
}
