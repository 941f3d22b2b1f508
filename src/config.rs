use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::article::WordRange;
use crate::feed::ChannelMeta;
use crate::topics;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_FEED_TITLE: &str = "Personal Development Feed (DE)";
const DEFAULT_FEED_DESC: &str = "Tägliche Nuggets mit Link zum Weiterlesen.";
const DEFAULT_FEED_LINK: &str = "https://example.com/feed.xml";
const DEFAULT_MAX_ITEMS: usize = 60;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a whole number, got '{value}'")]
    NotANumber { name: &'static str, value: String },
    #[error("{name} must be greater than 0")]
    NotPositive { name: &'static str },
    #[error("{name} must be an absolute http(s) URL, got '{value}'")]
    InvalidUrl { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the completion service; `None` disables generation
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub channel: ChannelMeta,
    pub max_items: NonZeroUsize,
    /// Topic rotation, never empty
    pub topics: Vec<String>,
    pub words: WordRange,
    pub feed_path: PathBuf,
    pub item_path: PathBuf,
    pub fallback_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build the config from explicit key/value pairs (useful for testing).
    /// Empty values are treated as unset.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into().trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        let get = |name: &str| vars.get(name).cloned();

        let max_items = parse_positive("MAX_ITEMS", get("MAX_ITEMS"), DEFAULT_MAX_ITEMS)?;
        let timeout_secs =
            parse_positive("GENERATION_TIMEOUT_SECS", get("GENERATION_TIMEOUT_SECS"), DEFAULT_TIMEOUT_SECS)?;

        let channel = ChannelMeta {
            title: get("FEED_TITLE").unwrap_or_else(|| DEFAULT_FEED_TITLE.to_string()),
            link: http_url(
                "FEED_LINK",
                get("FEED_LINK")
                    .or_else(|| get("GITHUB_REPOSITORY").and_then(|r| pages_link(&r)))
                    .unwrap_or_else(|| DEFAULT_FEED_LINK.to_string()),
            )?,
            description: get("FEED_DESC").unwrap_or_else(|| DEFAULT_FEED_DESC.to_string()),
            language: ChannelMeta::LANGUAGE.to_string(),
        };

        Ok(Self {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get("MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            channel,
            max_items: NonZeroUsize::new(max_items).ok_or(ConfigError::NotPositive { name: "MAX_ITEMS" })?,
            topics: topics::resolve_topics(get("TOPICS").as_deref(), get("DEFAULT_TOPICS").as_deref()),
            words: WordRange::ARTICLE,
            feed_path: get("FEED_PATH").map_or_else(|| "feed.xml".into(), PathBuf::from),
            item_path: get("ITEM_PATH").map_or_else(|| "item.json".into(), PathBuf::from),
            fallback_path: get("FALLBACK_PATH").map_or_else(|| "data/fallback.json".into(), PathBuf::from),
        })
    }
}

fn parse_positive<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: T = raw
        .parse()
        .map_err(|_| ConfigError::NotANumber { name, value: raw.clone() })?;
    if value <= T::default() {
        return Err(ConfigError::NotPositive { name });
    }
    Ok(value)
}

fn http_url(name: &'static str, value: String) -> Result<String, ConfigError> {
    match url::Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(value),
        _ => Err(ConfigError::InvalidUrl { name, value }),
    }
}

/// GitHub Pages URL for an `owner/repo` slug
fn pages_link(repository: &str) -> Option<String> {
    let (owner, repo) = repository.split_once('/')?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(format!("https://{}.github.io/{}/feed.xml", owner, repo))
}
