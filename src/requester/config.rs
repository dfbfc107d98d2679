pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

#[derive(Clone, Debug)]
pub struct RequestConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Prefix the target url is appended to (url-encoded), e.g.
    /// `https://api.codetabs.com/v1/proxy/?quest=`. Direct requests are the fallback.
    pub cors_proxy_url: Option<String>,
    /// HTTP or SOCKS proxy for every request, e.g. `socks5h://127.0.0.1:9050`.
    pub proxy_url: Option<String>,
}

impl RequestConfig {
    pub fn with_cors_proxy(mut self, prefix: impl Into<String>) -> Self {
        self.cors_proxy_url = Some(prefix.into());
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            cors_proxy_url: None,
            proxy_url: None,
        }
    }
}
