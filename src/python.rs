use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::error::{FetchError, PipelineError};
use crate::models::{EpisodePage, LanguageKey, PageMetadata, StreamLink};
use crate::pipeline::{extract_episode_page, EpisodePipeline, PipelineConfig};
use crate::providers::speedfiles;
use crate::requester::config::RequestConfig;
use crate::requester::handler::RequestHandler;
use crate::scraper::formatter;

impl From<PipelineError> for PyErr {
    fn from(err: PipelineError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

impl From<FetchError> for PyErr {
    fn from(err: FetchError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn new_dict(py: Python<'_>) -> Bound<'_, PyDict> {
    PyDict::new_bound(py)
}

fn stream_to_dict<'py>(py: Python<'py>, stream: &StreamLink) -> PyResult<Bound<'py, PyDict>> {
    let dict = new_dict(py);
    dict.set_item("hoster", &stream.hoster)?;
    dict.set_item("language", &stream.language)?;
    dict.set_item("redirect_url", &stream.redirect_url)?;
    dict.set_item("embed_url", &stream.embed_url)?;
    dict.set_item("direct_url", &stream.direct_url)?;
    Ok(dict)
}

#[pymethods]
impl PageMetadata {
    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = new_dict(py);
        dict.set_item("title", &self.title)?;
        dict.set_item("slug", &self.slug)?;
        dict.set_item("description", &self.description)?;
        dict.set_item("description_short", &self.description_short)?;
        dict.set_item("german_title", &self.german_title)?;
        dict.set_item("english_title", &self.english_title)?;
        dict.set_item("season", &self.season)?;
        dict.set_item("episode", &self.episode)?;
        dict.set_item("available_languages", &self.available_languages)?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        format!(
            "RustPageMetadata(slug='{}', season='{}', episode='{}')",
            self.slug, self.season, self.episode
        )
    }
}

#[pymethods]
impl EpisodePage {
    #[getter]
    fn url(&self) -> String {
        self.url.clone()
    }

    #[getter]
    fn metadata(&self) -> PageMetadata {
        self.metadata.clone()
    }

    /// `[(hoster, [(language, url), ...]), ...]` in page order.
    #[getter]
    fn provider_links(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.provider_links
            .iter()
            .map(|h| (h.hoster.clone(), h.links.clone()))
            .collect()
    }

    #[pyo3(name = "to_json")]
    fn py_to_json(&self) -> PyResult<String> {
        self.to_json()
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn summary(&self) -> String {
        formatter::format_episode_summary(self)
    }

    fn __repr__(&self) -> String {
        format!(
            "RustEpisodePage(url='{}', hosters={})",
            self.url,
            self.provider_links.len()
        )
    }
}

/// Fetches episode pages and resolves streams over HTTP.
#[pyclass(name = "RustEpisodeClient")]
pub struct EpisodeClient {
    handler: RequestHandler,
    config: PipelineConfig,
}

#[pymethods]
impl EpisodeClient {
    #[new]
    #[pyo3(signature = (cors_proxy_url=None, proxy_url=None, timeout_secs=30, site_origin=None))]
    fn new(
        cors_proxy_url: Option<String>,
        proxy_url: Option<String>,
        timeout_secs: u64,
        site_origin: Option<String>,
    ) -> PyResult<Self> {
        let request_config = RequestConfig {
            cors_proxy_url,
            proxy_url,
            timeout_secs,
            ..RequestConfig::default()
        };
        let mut config = PipelineConfig::default();
        if let Some(origin) = site_origin {
            config.site_origin = origin;
        }
        Ok(Self {
            handler: RequestHandler::new(request_config)?,
            config,
        })
    }

    fn fetch_episode(&self, py: Python<'_>, url: &str) -> PyResult<EpisodePage> {
        py.allow_threads(|| {
            EpisodePipeline::with_handler(self.config.clone(), &self.handler).fetch_episode(url)
        })
        .map_err(PyErr::from)
    }

    fn resolve_stream<'py>(
        &self,
        py: Python<'py>,
        page: &EpisodePage,
        hoster: &str,
        language: &str,
    ) -> PyResult<Bound<'py, PyDict>> {
        let stream = py.allow_threads(|| {
            EpisodePipeline::with_handler(self.config.clone(), &self.handler)
                .resolve_stream(page, hoster, language)
        })?;
        stream_to_dict(py, &stream)
    }
}

#[pyfunction]
#[pyo3(signature = (html_content, url))]
fn parse_episode_page(html_content: &str, url: &str) -> EpisodePage {
    extract_episode_page(html_content, url, &PipelineConfig::default())
}

#[pyfunction]
fn format_provider_links(page: &EpisodePage) -> String {
    formatter::format_provider_links(&page.provider_links)
}

#[pyfunction]
fn decode_speedfiles(payload: &str) -> PyResult<String> {
    speedfiles::decode(payload).map_err(|e| PipelineError::from(e).into())
}

#[pyfunction]
fn speedfiles_get_direct_link(html_content: &str) -> PyResult<String> {
    Ok(speedfiles::get_direct_link(html_content)?)
}

#[pyfunction]
#[pyo3(signature = (key=None))]
fn language_label(key: Option<&str>) -> String {
    LanguageKey::parse(key).label()
}

#[pymodule]
fn aniworld_rust_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<PageMetadata>()?;
    m.add_class::<EpisodePage>()?;
    m.add_class::<EpisodeClient>()?;

    m.add_function(wrap_pyfunction!(parse_episode_page, m)?)?;
    m.add_function(wrap_pyfunction!(format_provider_links, m)?)?;
    m.add_function(wrap_pyfunction!(decode_speedfiles, m)?)?;
    m.add_function(wrap_pyfunction!(speedfiles_get_direct_link, m)?)?;
    m.add_function(wrap_pyfunction!(language_label, m)?)?;

    Ok(())
}
