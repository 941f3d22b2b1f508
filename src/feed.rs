//! RSS 2.0 feed document: parsing, the bounded newest-first update, and
//! serialization.

use std::collections::HashSet;
use std::num::NonZeroUsize;

use chrono::{DateTime, FixedOffset, SubsecRound, Utc};
use rss::validation::Validate;
use rss::{CategoryBuilder, Channel, ChannelBuilder, GuidBuilder, ItemBuilder};
use thiserror::Error;

use crate::article::Article;

const GENERATOR: &str = "nugget-feed";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed is not a readable RSS document: {0}")]
    Parse(#[from] rss::Error),
    #[error("item '{title}' has an invalid pubDate '{value}'")]
    InvalidPubDate { title: String, value: String },
    #[error("item '{0}' has no pubDate")]
    MissingPubDate(String),
    #[error("item '{0}' has neither guid nor link")]
    MissingGuid(String),
    #[error("feed failed RSS validation: {0}")]
    Validation(String),
    #[error("failed to serialize feed: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMeta {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
}

impl ChannelMeta {
    pub const LANGUAGE: &'static str = "de-de";
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub description: String,
    /// Items without a link are valid RSS and are carried over as such
    pub link: Option<String>,
    pub category: Option<String>,
    pub guid: String,
    pub pub_date: DateTime<FixedOffset>,
}

impl FeedEntry {
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            description: article.body.clone(),
            link: Some(article.url.clone()),
            category: Some(article.category.clone()),
            guid: article.id.clone(),
            pub_date: article.published.fixed_offset(),
        }
    }

    fn from_item(item: &rss::Item) -> Result<Self, FeedError> {
        let title = item.title().unwrap_or_default().to_string();

        let raw_date = item
            .pub_date()
            .ok_or_else(|| FeedError::MissingPubDate(title.clone()))?;
        let pub_date = DateTime::parse_from_rfc2822(raw_date.trim()).map_err(|_| FeedError::InvalidPubDate {
            title: title.clone(),
            value: raw_date.to_string(),
        })?;

        let guid = item
            .guid()
            .map(|g| g.value().trim())
            .filter(|v| !v.is_empty())
            .or_else(|| item.link().map(str::trim).filter(|l| !l.is_empty()))
            .ok_or_else(|| FeedError::MissingGuid(title.clone()))?
            .to_string();

        Ok(Self {
            description: item.description().unwrap_or_default().to_string(),
            link: item
                .link()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
            category: item.categories().first().map(|c| c.name().to_string()),
            guid,
            pub_date,
            title,
        })
    }

    fn to_item(&self) -> rss::Item {
        ItemBuilder::default()
            .title(self.title.clone())
            .description(self.description.clone())
            .link(self.link.clone())
            .categories(
                self.category
                    .iter()
                    .map(|c| CategoryBuilder::default().name(c.clone()).build())
                    .collect::<Vec<_>>(),
            )
            .guid(GuidBuilder::default().permalink(false).value(self.guid.clone()).build())
            .pub_date(self.pub_date.to_rfc2822())
            .build()
    }
}

/// In-memory feed. Entries are kept newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedDocument {
    pub channel: ChannelMeta,
    pub last_build_date: Option<DateTime<FixedOffset>>,
    pub entries: Vec<FeedEntry>,
}

impl FeedDocument {
    pub fn new(channel: ChannelMeta) -> Self {
        Self {
            channel,
            last_build_date: None,
            entries: Vec::new(),
        }
    }

    /// Parse an existing feed. Anything that is not a well-formed RSS
    /// document with dated, identifiable items is rejected.
    pub fn parse(xml: &str) -> Result<Self, FeedError> {
        let channel = Channel::read_from(xml.as_bytes())?;

        let entries = channel
            .items()
            .iter()
            .map(FeedEntry::from_item)
            .collect::<Result<Vec<_>, _>>()?;

        let last_build_date = channel
            .last_build_date()
            .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok());

        Ok(Self {
            channel: ChannelMeta {
                title: channel.title().to_string(),
                link: channel.link().to_string(),
                description: channel.description().to_string(),
                language: channel.language().unwrap_or(ChannelMeta::LANGUAGE).to_string(),
            },
            last_build_date,
            entries,
        })
    }

    pub fn to_xml(&self) -> Result<String, FeedError> {
        let items: Vec<rss::Item> = self.entries.iter().map(FeedEntry::to_item).collect();

        let channel = ChannelBuilder::default()
            .title(self.channel.title.clone())
            .link(self.channel.link.clone())
            .description(self.channel.description.clone())
            .language(self.channel.language.clone())
            .generator(GENERATOR.to_string())
            .last_build_date(self.last_build_date.map(|d| d.to_rfc2822()))
            .items(items)
            .build();

        channel
            .validate()
            .map_err(|e| FeedError::Validation(e.to_string()))?;

        let buf = channel
            .pretty_write_to(Vec::new(), b' ', 2)
            .map_err(|e| FeedError::Serialize(e.to_string()))?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn guids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.guid.as_str())
    }
}

/// Insert `article` into the feed and enforce its invariants.
///
/// An entry with the same guid is replaced rather than duplicated. The
/// result is ordered by publication date (newest first, the new entry wins
/// ties) and holds at most `max_items` entries; the oldest are dropped.
pub fn update(
    existing: Option<FeedDocument>,
    article: &Article,
    max_items: NonZeroUsize,
    channel: &ChannelMeta,
    now: DateTime<Utc>,
) -> FeedDocument {
    let mut doc = existing.unwrap_or_else(|| FeedDocument::new(channel.clone()));
    doc.channel = channel.clone();
    doc.last_build_date = Some(now.trunc_subsecs(0).fixed_offset());

    let entry = FeedEntry::from_article(article);
    doc.entries.retain(|e| e.guid != entry.guid);
    doc.entries.insert(0, entry);

    let mut seen = HashSet::new();
    doc.entries.retain(|e| seen.insert(e.guid.clone()));

    doc.entries.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
    doc.entries.truncate(max_items.get());
    doc
}
