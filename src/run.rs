//! The two run steps, wired from configuration to files.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::article::Article;
use crate::config::Config;
use crate::fallback::FallbackPool;
use crate::feed::{self, FeedDocument};
use crate::generator::Producer;
use crate::{store, topics};

/// Produce today's article and write it to the hand-off file.
///
/// `topic` bypasses the rotation; `date` replaces the calendar date used for
/// rotation and fallback selection. The article is always published at `now`,
/// so an override never back-dates it out of a full feed.
pub async fn generate(
    config: &Config,
    topic: Option<&str>,
    date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> anyhow::Result<Article> {
    let pool = FallbackPool::load(&config.fallback_path, config.words)?;
    info!("Loaded {} fallback articles", pool.len());

    let producer = Producer::new(config, pool)?;
    let day = date.unwrap_or_else(|| now.date_naive());

    let topic = match topic {
        Some(t) => t.to_string(),
        None => topics::pick_for_date(&config.topics, day)
            .ok_or_else(|| anyhow::anyhow!("topic list is empty"))?
            .to_string(),
    };

    let article = producer.produce_on(&topic, config.words, day, now).await;
    store::write_item(&config.item_path, &article)?;
    info!(
        "Article '{}' for topic '{}' written to {}",
        article.id,
        topic,
        config.item_path.display()
    );
    Ok(article)
}

/// Insert the hand-off article into the feed and rewrite it.
pub fn update(config: &Config, now: DateTime<Utc>) -> anyhow::Result<FeedDocument> {
    let article = store::read_item(&config.item_path)?;
    let existing = store::load_feed(&config.feed_path)?;
    if existing.is_none() {
        info!("No feed at {}, starting a new one", config.feed_path.display());
    }

    let doc = feed::update(existing, &article, config.max_items, &config.channel, now);
    store::write_feed(&config.feed_path, &doc)?;
    info!(
        "{} updated ({} of max {} items)",
        config.feed_path.display(),
        doc.entries.len(),
        config.max_items
    );
    Ok(doc)
}
