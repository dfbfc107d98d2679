pub mod doodstream;
pub mod script_scan;
pub mod speedfiles;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::requester::handler::DocumentFetcher;

/// Hosters with a known direct-link extraction rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    SpeedFiles,
    Vidoza,
    Vidmoly,
    Voe,
    Doodstream,
    Luluvdo,
}

impl Provider {
    pub const ALL: [Provider; 6] = [
        Provider::SpeedFiles,
        Provider::Vidoza,
        Provider::Vidmoly,
        Provider::Voe,
        Provider::Doodstream,
        Provider::Luluvdo,
    ];

    /// Resolved unless a pipeline narrows or widens its allow-list. Luluvdo is opt-in.
    pub const DEFAULT_SUPPORTED: [Provider; 5] = [
        Provider::SpeedFiles,
        Provider::Vidoza,
        Provider::Vidmoly,
        Provider::Voe,
        Provider::Doodstream,
    ];

    /// Matches hoster names ignoring ASCII case ("Speedfiles", "SpeedFiles").
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::SpeedFiles => "SpeedFiles",
            Provider::Vidoza => "Vidoza",
            Provider::Vidmoly => "Vidmoly",
            Provider::Voe => "VOE",
            Provider::Doodstream => "Doodstream",
            Provider::Luluvdo => "Luluvdo",
        }
    }

    /// Pulls the playable media url out of the hoster's embed page. Some hosters
    /// need follow-up requests through `fetcher`.
    pub fn extract_direct_link(
        &self,
        embed_url: &str,
        embed_html: &str,
        fetcher: &dyn DocumentFetcher,
    ) -> Result<String, PipelineError> {
        match self {
            Provider::SpeedFiles => speedfiles::get_direct_link(embed_html),
            Provider::Vidoza => script_scan::vidoza_get_direct_link(embed_html),
            Provider::Vidmoly => script_scan::vidmoly_get_direct_link(embed_html),
            Provider::Voe => script_scan::voe_get_direct_link(embed_html, fetcher),
            Provider::Doodstream => doodstream::get_direct_link(embed_html, fetcher),
            Provider::Luluvdo => script_scan::luluvdo_get_direct_link(embed_url, fetcher),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_ignores_case() {
        assert_eq!(Provider::from_name("SpeedFiles"), Some(Provider::SpeedFiles));
        assert_eq!(Provider::from_name("Speedfiles"), Some(Provider::SpeedFiles));
        assert_eq!(Provider::from_name("voe"), Some(Provider::Voe));
        assert_eq!(Provider::from_name("doodstream"), Some(Provider::Doodstream));
        assert_eq!(Provider::from_name("LuluVDO"), Some(Provider::Luluvdo));
        assert_eq!(Provider::from_name("Streamtape"), None);
        assert_eq!(Provider::from_name("Unknown Host"), None);
    }
}
