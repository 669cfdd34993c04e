use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{Config, Error};

/// File read when no explicit settings path is given.
pub const DEFAULT_SETTINGS_FILE: &str = "funcultural.toml";

/// Everything a run needs besides the clock.
///
/// Every table and field is optional in the TOML file; missing values take
/// the defaults for the Funcultural site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub crawl: CrawlSettings,
    pub output: OutputSettings,
    pub classifier: Config,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    pub listing_url: String,
    /// Base for resolving relative image URLs inside articles.
    pub site_base: String,
    pub source_name: String,
    /// Safety limit on listing pages per run.
    pub max_pages: u32,
    pub request_timeout_secs: u64,
    /// Fixed pause between consecutive fetches.
    pub request_delay_ms: u64,
    pub user_agent: String,
    pub cache_dir: Option<PathBuf>,
    pub cache_ttl_secs: u64,
    pub selectors: SiteSelectors,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            listing_url: "https://funcultural.portovelho.ro.gov.br/noticias".into(),
            site_base: "https://funcultural.portovelho.ro.gov.br".into(),
            source_name: "Funcultural".into(),
            max_pages: 3,
            request_timeout_secs: 10,
            request_delay_ms: 500,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".into(),
            cache_dir: Some(PathBuf::from(".cache/html")),
            cache_ttl_secs: 60 * 60 * 24,
            selectors: SiteSelectors::default(),
        }
    }
}

impl CrawlSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// CSS selectors for the site's listing and article templates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    pub card: String,
    pub title: String,
    pub tag: String,
    pub date: String,
    pub article: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            card: "div.resultado-pesquisa".into(),
            title: "div.titulo-noticia-pesquisa".into(),
            tag: "div.tag-noticia".into(),
            date: "div.datanot".into(),
            article: "article.noticia-conteudo".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Current-year collection.
    pub current_file: PathBuf,
    /// Directory holding one `eventos_de_<year>.json` per archived year.
    pub archive_dir: PathBuf,
    pub index_file: PathBuf,
    /// Page template containing the `{{EVENTOS_HTML}}` placeholder.
    pub html_template: Option<PathBuf>,
    pub html_output: PathBuf,
    pub lock_file: PathBuf,
    /// A lock older than this is treated as left behind by a dead run.
    pub lock_max_age_secs: u64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            current_file: PathBuf::from("docs/api_output/eventos.json"),
            archive_dir: PathBuf::from("docs/api_output/arquivo"),
            index_file: PathBuf::from("docs/api_output/index.json"),
            html_template: None,
            html_output: PathBuf::from("docs/index.html"),
            lock_file: PathBuf::from("scraper.lock"),
            lock_max_age_secs: 6 * 60 * 60,
        }
    }
}

impl OutputSettings {
    pub fn lock_max_age(&self) -> Duration {
        Duration::from_secs(self.lock_max_age_secs)
    }
}

impl Settings {
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, Error> {
        toml::from_str(content).map_err(|source| Error::Settings {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&content, path)
    }

    /// Load `path` if given, else [`DEFAULT_SETTINGS_FILE`] when it exists,
    /// else built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        let fallback = Path::new(DEFAULT_SETTINGS_FILE);
        if fallback.exists() {
            return Self::from_file(fallback);
        }
        Ok(Self::default())
    }
}
