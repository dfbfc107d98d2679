pub mod error;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod requester;
pub mod scraper;

#[cfg(feature = "python")]
mod python;

pub use error::{DecodeError, DecodeStage, FetchError, PipelineError};
pub use models::{
    EpisodePage, EpisodeRef, HosterLinks, LanguageKey, PageMetadata, ProviderLinkMap, StreamLink,
};
pub use pipeline::{extract_episode_page, EpisodePipeline, PipelineConfig};
pub use providers::Provider;
pub use requester::config::RequestConfig;
pub use requester::handler::{DocumentFetcher, LinkResolver, RequestHandler};
