use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::article::{Article, ArticleOrigin, Draft, ValidationError, WordRange, CATEGORIES};
use crate::config::Config;
use crate::fallback::FallbackPool;

const SYSTEM_PROMPT: &str = "Du schreibst inspirierende, deutschsprachige Kurzartikel. \
    Halte dich an die geforderten Wortzahlen und bleibe seriös.";

/// Everything that can go wrong while asking the completion service.
/// These never leave [`Producer::produce`]; they only decide the fallback.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("response contains no choices")]
    NoChoices,
    #[error("response content is not an article object: {0}")]
    Content(#[from] serde_json::Error),
    #[error("generated article rejected: {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    response_format: serde_json::Value,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Thin client for an OpenAI-compatible chat-completion endpoint.
pub struct CompletionClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl CompletionClient {
    pub fn new(config: &Config, api_key: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("NuggetFeed/1.0 (Article Generator)")
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
        })
    }

    pub async fn request_draft(&self, topic: &str, words: WordRange) -> Result<Draft, GenerationError> {
        let request = ChatRequest {
            model: &self.model,
            response_format: json!({ "type": "json_object" }),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt(topic, words),
                },
            ],
        };

        debug!("Requesting article on '{}' from {}", topic, self.endpoint);
        let response: ChatResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(GenerationError::NoChoices)?;

        Ok(serde_json::from_str(&content)?)
    }
}

fn user_prompt(topic: &str, words: WordRange) -> String {
    let categories = CATEGORIES
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "Erzeuge EINEN Artikel als JSON mit Feldern:\n\
         {{ \"title\": string, \"body\": string, \"url\": string, \"category\": string }}.\n\
         Sprache: Deutsch. Länge body: {}–{} Wörter.\n\
         Thema: \"{}\".\n\
         Kategorie: eine aus [{}].\n\
         Am Ende des Textes keinen weiteren Call-to-Action; Link in \"url\".\n\
         Liefere ausschließlich ein JSON-Objekt ohne Kommentartext.",
        words.min, words.max, topic, categories
    )
}

/// Produces the day's article, falling back to the static pool whenever
/// generation is unavailable or its output is unusable.
pub struct Producer {
    client: Option<CompletionClient>,
    pool: FallbackPool,
}

impl Producer {
    pub fn new(config: &Config, pool: FallbackPool) -> anyhow::Result<Self> {
        let client = match &config.api_key {
            Some(key) => Some(CompletionClient::new(config, key.clone())?),
            None => None,
        };
        Ok(Self { client, pool })
    }

    /// A producer that never calls out, e.g. for dry runs and tests.
    pub fn offline(pool: FallbackPool) -> Self {
        Self { client: None, pool }
    }

    /// Always returns an article; generation failures are logged and
    /// replaced by a fallback entry.
    pub async fn produce(&self, topic: &str, words: WordRange, now: DateTime<Utc>) -> Article {
        self.produce_on(topic, words, now.date_naive(), now).await
    }

    /// Like [`Producer::produce`], but the fallback is chosen for `day`
    /// while the article is still published at `now`.
    pub async fn produce_on(
        &self,
        topic: &str,
        words: WordRange,
        day: NaiveDate,
        now: DateTime<Utc>,
    ) -> Article {
        match self.generate(topic, words).await {
            Ok(draft) => {
                info!("Generated article '{}' for topic '{}'", draft.title.trim(), topic);
                Article::from_draft(draft, topic, now, ArticleOrigin::Generated)
            }
            Err(e) => {
                warn!("Article generation failed, using fallback: {}", e);
                let draft = self.pool.select(topic, day).clone();
                info!("Selected fallback article '{}' for topic '{}'", draft.title, topic);
                Article::from_draft(draft, topic, now, ArticleOrigin::Fallback)
            }
        }
    }

    async fn generate(&self, topic: &str, words: WordRange) -> Result<Draft, GenerationError> {
        let client = self.client.as_ref().ok_or(GenerationError::MissingApiKey)?;
        let draft = client.request_draft(topic, words).await?;
        draft.validate(words.with_tolerance())?;
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod prompt_tests {
        use super::*;

        #[test]
        fn test_user_prompt_mentions_topic_and_range() {
            let prompt = user_prompt("Frugalismus", WordRange::ARTICLE);
            assert!(prompt.contains("Thema: \"Frugalismus\""));
            assert!(prompt.contains("150–200 Wörter"));
            assert!(prompt.contains("\"Minimalismus\",\"Selbstentwicklung\",\"Frugalismus\",\"Investieren\""));
        }

        #[test]
        fn test_request_serialization() {
            let request = ChatRequest {
                model: "gpt-4o-mini",
                response_format: json!({ "type": "json_object" }),
                messages: vec![ChatMessage {
                    role: "user".to_string(),
                    content: "hi".to_string(),
                }],
            };
            let value = serde_json::to_value(&request).unwrap();
            assert_eq!(value["model"], "gpt-4o-mini");
            assert_eq!(value["response_format"]["type"], "json_object");
            assert_eq!(value["messages"][0]["role"], "user");
        }

        #[test]
        fn test_response_without_choices_parses_empty() {
            let response: ChatResponse = serde_json::from_str("{}").unwrap();
            assert!(response.choices.is_empty());
        }
    }

    mod endpoint_tests {
        use super::*;

        #[test]
        fn test_endpoint_trailing_slash() {
            let config = Config::from_vars([("OPENAI_BASE_URL", "http://localhost:8080/v1/")]).unwrap();
            let client = CompletionClient::new(&config, "key".to_string()).unwrap();
            assert_eq!(client.endpoint, "http://localhost:8080/v1/chat/completions");
        }

        #[test]
        fn test_producer_without_key_is_offline() {
            let config = Config::from_vars(Vec::<(String, String)>::new()).unwrap();
            let pool = FallbackPool::new(
                vec![Draft {
                    title: "T".to_string(),
                    body: vec!["Wort"; 160].join(" "),
                    url: "https://example.com".to_string(),
                    category: "Minimalismus".to_string(),
                }],
                WordRange::ARTICLE,
            )
            .unwrap();
            let producer = Producer::new(&config, pool).unwrap();
            assert!(producer.client.is_none());
        }
    }
}
