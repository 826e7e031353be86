// src/pipeline/collector/twitter.rs
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::config::ApiConfig;
use crate::data_model::Post;
use crate::error::{PipelineError, Result};
use crate::pipeline::collector::{PageRequest, TimelineSource};

const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";
const STORED_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Twitter v1.1 `statuses/user_timeline` over blocking HTTP with app-only bearer auth.
pub struct TwitterTimelineClient {
    client: Client,
    base_url: String,
    token_env: String,
}

impl TwitterTimelineClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tweetlens/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(TwitterTimelineClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_env: config.bearer_token_env.clone(),
        })
    }

    // Read per request so commands that never touch the network need no token.
    fn bearer_token(&self) -> Result<String> {
        std::env::var(&self.token_env).map_err(|_| {
            PipelineError::SourceError(format!(
                "bearer token environment variable '{}' is not set",
                self.token_env
            ))
        })
    }
}

impl TimelineSource for TwitterTimelineClient {
    fn fetch_page(&self, query: &str, request: &PageRequest) -> Result<Vec<Post>> {
        let token = self.bearer_token()?;
        let mut params: Vec<(&str, String)> = vec![
            ("screen_name", query.to_string()),
            ("count", request.count.to_string()),
            ("tweet_mode", "extended".to_string()),
            ("include_rts", "true".to_string()),
        ];
        if let Some(since_id) = request.since_id {
            params.push(("since_id", since_id.to_string()));
        }
        if let Some(max_id) = request.max_id {
            params.push(("max_id", max_id.to_string()));
        }
        let url = format!("{}/statuses/user_timeline.json", self.base_url);
        debug!(%url, ?request, "Requesting timeline page");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&params)
            .send()?;
        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(PipelineError::SourceError(format!(
                    "authentication rejected for @{} ({})",
                    query, status
                )))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(PipelineError::SourceError(format!(
                    "rate limit exceeded while fetching @{}",
                    query
                )))
            }
            s if !s.is_success() => {
                let body = response.text().unwrap_or_default();
                return Err(PipelineError::SourceError(format!(
                    "timeline request for @{} failed with {}: {}",
                    query, s, body
                )));
            }
            _ => {}
        }

        let tweets: Vec<ApiTweet> = response
            .json()
            .map_err(|e| PipelineError::SourceError(format!("malformed timeline payload: {}", e)))?;
        tweets.into_iter().map(ApiTweet::into_post).collect()
    }
}

/// Subset of the v1.1 tweet object that is stored.
#[derive(Debug, Deserialize)]
pub struct ApiTweet {
    pub id_str: String,
    pub full_text: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub favorite_count: u64,
    #[serde(default)]
    pub retweet_count: u64,
    pub created_at: String,
    #[serde(default)]
    pub source: String,
    pub in_reply_to_status_id_str: Option<String>,
    pub in_reply_to_screen_name: Option<String>,
}

impl ApiTweet {
    pub fn into_post(self) -> Result<Post> {
        let created_at = normalize_created_at(&self.created_at)?;
        Ok(Post {
            id: self.id_str,
            text: self.full_text.or(self.text).unwrap_or_default(),
            favorite_count: self.favorite_count,
            retweet_count: self.retweet_count,
            created_at,
            source: HTML_TAG.replace_all(&self.source, "").into_owned(),
            in_reply_to_id: self.in_reply_to_status_id_str,
            in_reply_to_user: self.in_reply_to_screen_name,
        })
    }
}

/// `Wed Oct 10 20:19:24 +0000 2018` → `2018-10-10 20:19:24+00:00`.
pub fn normalize_created_at(raw: &str) -> Result<String> {
    let parsed = DateTime::parse_from_str(raw, TWITTER_DATE_FORMAT).map_err(|e| {
        PipelineError::SourceError(format!("unparseable created_at '{}': {}", raw, e))
    })?;
    Ok(parsed
        .with_timezone(&Utc)
        .format(STORED_DATE_FORMAT)
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_twitter_dates_to_utc() {
        assert_eq!(
            normalize_created_at("Wed Oct 10 20:19:24 +0000 2018").unwrap(),
            "2018-10-10 20:19:24+00:00"
        );
        assert_eq!(
            normalize_created_at("Wed Oct 10 23:30:00 -0100 2018").unwrap(),
            "2018-10-11 00:30:00+00:00"
        );
        assert!(normalize_created_at("yesterday").is_err());
    }

    #[test]
    fn api_tweet_prefers_full_text_and_strips_source_markup() {
        let json = r#"{
            "id_str": "1050118621198921728",
            "full_text": "The full text",
            "text": "The trunc…",
            "favorite_count": 3,
            "retweet_count": 1,
            "created_at": "Wed Oct 10 20:19:24 +0000 2018",
            "source": "<a href=\"http://twitter.com\" rel=\"nofollow\">Twitter Web Client</a>",
            "in_reply_to_status_id_str": null,
            "in_reply_to_screen_name": null
        }"#;
        let tweet: ApiTweet = serde_json::from_str(json).unwrap();
        let post = tweet.into_post().unwrap();
        assert_eq!(post.text, "The full text");
        assert_eq!(post.source, "Twitter Web Client");
        assert_eq!(post.numeric_id(), Some(1050118621198921728));
        assert_eq!(post.in_reply_to_id, None);
    }
}
