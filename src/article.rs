//! Article records and the validation rules shared by generated and
//! pre-written texts.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Categories an article may be filed under
pub const CATEGORIES: [&str; 4] = ["Minimalismus", "Selbstentwicklung", "Frugalismus", "Investieren"];

const MAX_TITLE_CHARS: usize = 140;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title exceeds 140 characters ({0})")]
    TitleTooLong(usize),
    #[error("body needs {min}-{max} words (got {count})")]
    WordCount { min: usize, max: usize, count: usize },
    #[error("url '{0}' is not an absolute http(s) URL")]
    InvalidUrl(String),
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
}

/// Target body length in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordRange {
    pub min: usize,
    pub max: usize,
}

impl WordRange {
    pub const ARTICLE: WordRange = WordRange { min: 150, max: 200 };

    pub fn new(min: usize, max: usize) -> Self {
        Self { min: min.min(max), max: min.max(max) }
    }

    /// The range widened by 10% on both ends, used for generated text.
    pub fn with_tolerance(self) -> Self {
        Self {
            min: self.min - self.min / 10,
            max: self.max + self.max / 10,
        }
    }

    pub fn contains(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn is_known_category(category: &str) -> bool {
    CATEGORIES.contains(&category)
}

/// Article content before it is bound to a topic and date: the JSON object
/// the completion service returns and the shape of every fallback entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Draft {
    pub title: String,
    pub body: String,
    pub url: String,
    pub category: String,
}

impl Draft {
    pub fn validate(&self, words: WordRange) -> Result<(), ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let title_chars = title.chars().count();
        if title_chars > MAX_TITLE_CHARS {
            return Err(ValidationError::TitleTooLong(title_chars));
        }

        let count = word_count(&self.body);
        if !words.contains(count) {
            return Err(ValidationError::WordCount { min: words.min, max: words.max, count });
        }

        let url = self.url.trim();
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(ValidationError::InvalidUrl(url.to_string())),
        }

        if !is_known_category(self.category.trim()) {
            return Err(ValidationError::UnknownCategory(self.category.trim().to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleOrigin {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub body: String,
    pub url: String,
    pub category: String,
    pub topic: String,
    pub published: DateTime<Utc>,
    pub origin: ArticleOrigin,
}

impl Article {
    /// Bind a draft to its topic and publish time. Text fields are trimmed and
    /// the timestamp is truncated to whole seconds.
    pub fn from_draft(draft: Draft, topic: &str, published: DateTime<Utc>, origin: ArticleOrigin) -> Self {
        let published = published.trunc_subsecs(0);
        Self {
            id: article_id(topic, published),
            title: draft.title.trim().to_string(),
            body: draft.body.trim().to_string(),
            url: draft.url.trim().to_string(),
            category: draft.category.trim().to_string(),
            topic: topic.to_string(),
            published,
            origin,
        }
    }
}

/// `YYYY-MM-DD-<topic-slug>`: stable across re-runs on the same day.
pub fn article_id(topic: &str, published: DateTime<Utc>) -> String {
    format!("{}-{}", published.format("%Y-%m-%d"), slugify(topic))
}

fn slugify(topic: &str) -> String {
    let mut slug = String::with_capacity(topic.len());
    for c in topic.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "artikel".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(words: usize) -> Draft {
        Draft {
            title: "Weniger ist mehr".to_string(),
            body: vec!["Wort"; words].join(" "),
            url: "https://example.com/weniger".to_string(),
            category: "Minimalismus".to_string(),
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_valid_draft() {
            assert_eq!(draft(170).validate(WordRange::ARTICLE), Ok(()));
        }

        #[test]
        fn test_word_count_bounds() {
            assert!(draft(150).validate(WordRange::ARTICLE).is_ok());
            assert!(draft(200).validate(WordRange::ARTICLE).is_ok());
            assert_eq!(
                draft(149).validate(WordRange::ARTICLE),
                Err(ValidationError::WordCount { min: 150, max: 200, count: 149 })
            );
            assert!(draft(201).validate(WordRange::ARTICLE).is_err());
        }

        #[test]
        fn test_tolerance_widens_range() {
            let tolerant = WordRange::ARTICLE.with_tolerance();
            assert_eq!(tolerant, WordRange { min: 135, max: 220 });
            assert!(draft(140).validate(tolerant).is_ok());
            assert!(draft(134).validate(tolerant).is_err());
        }

        #[test]
        fn test_empty_title() {
            let mut d = draft(170);
            d.title = "   ".to_string();
            assert_eq!(d.validate(WordRange::ARTICLE), Err(ValidationError::EmptyTitle));
        }

        #[test]
        fn test_long_title() {
            let mut d = draft(170);
            d.title = "x".repeat(141);
            assert_eq!(d.validate(WordRange::ARTICLE), Err(ValidationError::TitleTooLong(141)));
        }

        #[test]
        fn test_invalid_url() {
            let mut d = draft(170);
            d.url = "ftp://example.com/file".to_string();
            assert!(matches!(d.validate(WordRange::ARTICLE), Err(ValidationError::InvalidUrl(_))));

            d.url = "nur text".to_string();
            assert!(matches!(d.validate(WordRange::ARTICLE), Err(ValidationError::InvalidUrl(_))));
        }

        #[test]
        fn test_unknown_category() {
            let mut d = draft(170);
            d.category = "Kochen".to_string();
            assert_eq!(
                d.validate(WordRange::ARTICLE),
                Err(ValidationError::UnknownCategory("Kochen".to_string()))
            );
        }

        #[test]
        fn test_unknown_fields_rejected() {
            let json = r#"{"title":"t","body":"b","url":"https://x.de","category":"Minimalismus","extra":1}"#;
            assert!(serde_json::from_str::<Draft>(json).is_err());
        }

        #[test]
        fn test_word_range_new_orders_bounds() {
            assert_eq!(WordRange::new(200, 150), WordRange::ARTICLE);
        }
    }

    mod article_tests {
        use super::*;

        #[test]
        fn test_from_draft_trims_and_truncates() {
            let published = Utc.with_ymd_and_hms(2025, 3, 14, 6, 30, 0).unwrap()
                + chrono::Duration::milliseconds(750);
            let mut d = draft(160);
            d.title = "  Weniger ist mehr \n".to_string();

            let article = Article::from_draft(d, "Minimalismus", published, ArticleOrigin::Generated);

            assert_eq!(article.title, "Weniger ist mehr");
            assert_eq!(article.topic, "Minimalismus");
            assert_eq!(article.published, Utc.with_ymd_and_hms(2025, 3, 14, 6, 30, 0).unwrap());
            assert_eq!(article.id, "2025-03-14-minimalismus");
        }

        #[test]
        fn test_article_id_slug() {
            let published = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
            assert_eq!(article_id("Persönliche Finanzen & Ziele", published), "2025-01-02-persönliche-finanzen-ziele");
            assert_eq!(article_id("  ", published), "2025-01-02-artikel");
        }

        #[test]
        fn test_serde_origin_lowercase() {
            let json = serde_json::to_string(&ArticleOrigin::Fallback).unwrap();
            assert_eq!(json, "\"fallback\"");
        }
    }
}
