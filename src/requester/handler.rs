use log::{debug, error, info, warn};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::Proxy;
use std::time::Duration;
use url::Url;

use super::config::RequestConfig;
use crate::error::FetchError;

const SPAM_MARKER: &str = "Deine Anfrage wurde als Spam erkannt.";

/// Supplies raw HTML for a url.
pub trait DocumentFetcher {
    fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}

/// Follows redirects and returns the final url.
pub trait LinkResolver {
    fn resolve_link(&self, url: &str) -> Result<String, FetchError>;
}

impl<T: DocumentFetcher + ?Sized> DocumentFetcher for &T {
    fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch_html(url)
    }
}

impl<T: LinkResolver + ?Sized> LinkResolver for &T {
    fn resolve_link(&self, url: &str) -> Result<String, FetchError> {
        (**self).resolve_link(url)
    }
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

/// Some hosters refuse requests without their own origin as referer.
pub fn referer_for(url: &str) -> Option<&'static str> {
    let host = host_of(url)?;
    if host.contains("vidmoly") {
        Some("https://vidmoly.to")
    } else if host.contains("dood") {
        Some("https://dood.li/")
    } else {
        None
    }
}

pub fn is_blacklisted_page(html_content: &str) -> bool {
    html_content.contains(SPAM_MARKER)
}

pub fn cors_proxy_target(prefix: &str, url: &str) -> String {
    format!("{}{}", prefix, urlencoding::encode(url))
}

fn build_headers(config: &RequestConfig, url: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(ua) = HeaderValue::from_str(&config.user_agent) {
        headers.insert(USER_AGENT, ua);
    }
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("de-DE,de;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    if let Some(referer) = referer_for(url) {
        headers.insert(REFERER, HeaderValue::from_static(referer));
    }
    headers
}

fn build_client(config: &RequestConfig) -> Result<Client, FetchError> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .cookie_store(true)
        .gzip(true)
        .deflate(true);

    if let Some(ref proxy_url) = config.proxy_url {
        builder = builder.proxy(Proxy::all(proxy_url).map_err(FetchError::Client)?);
    }

    builder.build().map_err(FetchError::Client)
}

/// Blocking reqwest implementation of both collaborators.
pub struct RequestHandler {
    config: RequestConfig,
    client: Client,
}

impl RequestHandler {
    pub fn new(config: RequestConfig) -> Result<Self, FetchError> {
        let client = build_client(&config)?;
        info!(
            "RequestHandler initialized (cors proxy: {}, proxy: {})",
            config.cors_proxy_url.as_deref().unwrap_or("none"),
            if config.proxy_url.is_some() { "set" } else { "none" }
        );
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    fn do_request(
        &self,
        target_url: &str,
        headers_for: &str,
        context_msg: &str,
    ) -> Result<String, FetchError> {
        debug!("[{}] Requesting: {}", context_msg, target_url);

        let response = self
            .client
            .get(target_url)
            .headers(build_headers(&self.config, headers_for))
            .send()
            .map_err(|e| {
                error!("[{}] Error: {}", context_msg, e);
                FetchError::Request {
                    url: target_url.to_string(),
                    source: e,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("[{}] HTTP Error: {}", context_msg, status);
            return Err(FetchError::Status {
                url: target_url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().map_err(|e| FetchError::Request {
            url: target_url.to_string(),
            source: e,
        })?;
        debug!(
            "[{}] Response: HTTP {}, Text-Length: {} chars",
            context_msg,
            status,
            text.len()
        );
        Ok(text)
    }

    fn fetch_unchecked(&self, url: &str) -> Result<String, FetchError> {
        if let Some(ref prefix) = self.config.cors_proxy_url {
            let proxied = cors_proxy_target(prefix, url);
            match self.do_request(&proxied, url, "Fetch via proxy") {
                Ok(html) => return Ok(html),
                Err(e) => warn!("[Fetch] Proxy failed ({}), retrying directly", e),
            }
        }
        self.do_request(url, url, "Fetch")
    }
}

impl DocumentFetcher for RequestHandler {
    fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let html = self.fetch_unchecked(url)?;
        if is_blacklisted_page(&html) {
            error!("[Fetch] {} rejected the request as spam", url);
            return Err(FetchError::Blacklisted {
                url: url.to_string(),
            });
        }
        Ok(html)
    }
}

impl LinkResolver for RequestHandler {
    fn resolve_link(&self, url: &str) -> Result<String, FetchError> {
        let headers = build_headers(&self.config, url);
        let head = self.client.head(url).headers(headers.clone()).send();

        let response = match head {
            Ok(r) if r.status().is_success() => r,
            _ => {
                debug!("[Resolve] HEAD not usable for {}, falling back to GET", url);
                self.client
                    .get(url)
                    .headers(headers)
                    .send()
                    .map_err(|e| FetchError::Request {
                        url: url.to_string(),
                        source: e,
                    })?
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let resolved = response.url().to_string();
        debug!("[Resolve] {} -> {}", url, resolved);
        Ok(resolved)
    }
}
