//! Twitter API v2 最近搜索客户端

use super::{create_http_client, PostSource};
use crate::config::TwitterConfig;
use crate::types::{ETLError, ETLResult, Tweet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// 单页条数限制（API 规定 10..=100）
const MIN_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

const TWEET_FIELDS: &str = "created_at,author_id,public_metrics,lang";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Option<Vec<ApiTweet>>,
    meta: Option<SearchMeta>,
}

#[derive(Debug, Deserialize)]
struct ApiTweet {
    id: String,
    text: String,
    created_at: Option<DateTime<Utc>>,
    author_id: Option<String>,
    lang: Option<String>,
    #[serde(default)]
    public_metrics: PublicMetrics,
}

#[derive(Debug, Default, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    reply_count: u64,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    quote_count: u64,
}

#[derive(Debug, Deserialize)]
struct SearchMeta {
    next_token: Option<String>,
}

pub struct TwitterClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl TwitterClient {
    pub fn new(base_url: String, bearer_token: Option<String>, timeout_secs: u64) -> ETLResult<Self> {
        Ok(Self {
            client: create_http_client(timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token,
        })
    }

    pub fn from_config(config: &TwitterConfig) -> ETLResult<Self> {
        let bearer_token = config.bearer_token();
        if bearer_token.is_none() {
            tracing::warn!(
                "No bearer token configured (env {}), searches will fail",
                config.bearer_token_env
            );
        } else {
            tracing::info!("Twitter API client initialized successfully");
        }

        Self::new(
            config.base_url.clone(),
            bearer_token,
            config.request_timeout_secs,
        )
    }

    async fn fetch_page(
        &self,
        query: &str,
        page_size: usize,
        next_token: Option<&str>,
    ) -> ETLResult<(Vec<Tweet>, Option<String>)> {
        let token = self
            .bearer_token
            .as_deref()
            .ok_or_else(|| ETLError::DataSource("缺少 bearer token".to_string()))?;

        let url = format!("{}/2/tweets/search/recent", self.base_url);
        let page_size = page_size.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("query", query),
            ("max_results", page_size.as_str()),
            ("tweet.fields", TWEET_FIELDS),
        ];
        if let Some(next) = next_token {
            params.push(("next_token", next));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ETLError::DataSource(format!(
                "search/recent 返回 {}: {}",
                status, body
            )));
        }

        parse_search_response(&body, Utc::now())
    }
}

/// 解析 search/recent 响应，返回推文和下一页 token
fn parse_search_response(
    body: &str,
    collected_at: DateTime<Utc>,
) -> ETLResult<(Vec<Tweet>, Option<String>)> {
    let response: SearchResponse = serde_json::from_str(body)?;

    let tweets = response
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|item| Tweet {
            id: item.id,
            text: item.text,
            created_at: item.created_at.unwrap_or(collected_at),
            author_id: item.author_id,
            lang: item.lang,
            retweet_count: item.public_metrics.retweet_count,
            like_count: item.public_metrics.like_count,
            reply_count: item.public_metrics.reply_count,
            quote_count: item.public_metrics.quote_count,
            collected_at,
        })
        .collect();

    let next_token = response.meta.and_then(|m| m.next_token);
    Ok((tweets, next_token))
}

#[async_trait]
impl PostSource for TwitterClient {
    fn name(&self) -> &str {
        "twitter"
    }

    async fn search(&self, query: &str, max_results: usize) -> ETLResult<Vec<Tweet>> {
        let mut tweets: Vec<Tweet> = Vec::new();
        let mut next_token: Option<String> = None;

        while tweets.len() < max_results {
            let remaining = max_results - tweets.len();
            let page_size = remaining.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);

            let (page, next) = self
                .fetch_page(query, page_size, next_token.as_deref())
                .await?;
            let page_len = page.len();
            tweets.extend(page);

            match next {
                Some(token) if page_len > 0 => next_token = Some(token),
                _ => break,
            }
        }

        tweets.truncate(max_results);
        tracing::info!("Collected {} tweets", tweets.len());
        Ok(tweets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_search_response() {
        let body = r#"{
            "data": [
                {
                    "id": "1760000000000000001",
                    "text": "Loving the new release https://t.co/abc",
                    "created_at": "2024-03-01T10:15:00.000Z",
                    "author_id": "99",
                    "lang": "en",
                    "public_metrics": {"retweet_count": 3, "reply_count": 1, "like_count": 12, "quote_count": 0}
                },
                {
                    "id": "1760000000000000002",
                    "text": "sin métricas",
                    "lang": "es"
                }
            ],
            "meta": {"result_count": 2, "next_token": "b26v89c19zqg8o3f"}
        }"#;
        let collected_at = Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap();

        let (tweets, next) = parse_search_response(body, collected_at).unwrap();

        assert_eq!(tweets.len(), 2);
        assert_eq!(next.as_deref(), Some("b26v89c19zqg8o3f"));
        assert_eq!(tweets[0].like_count, 12);
        assert_eq!(tweets[0].retweet_count, 3);
        assert_eq!(
            tweets[0].created_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap()
        );
        assert_eq!(tweets[1].like_count, 0);
        assert_eq!(tweets[1].created_at, collected_at);
        assert_eq!(tweets[1].collected_at, collected_at);
    }

    #[test]
    fn test_parse_empty_response() {
        let body = r#"{"meta": {"result_count": 0}}"#;
        let (tweets, next) = parse_search_response(body, Utc::now()).unwrap();
        assert!(tweets.is_empty());
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn test_search_without_token_fails() {
        let client = TwitterClient::new("http://127.0.0.1:9".to_string(), None, 1).unwrap();
        let result = client.search("rust", 10).await;
        assert!(matches!(result, Err(ETLError::DataSource(_))));
    }
}
