//! 推文处理：读取原始数据、投影过滤、情感分析、聚合视图

use crate::config::ProcessingConfig;
use crate::sentiment::{LexiconScorer, PolarityScorer, TextSentimentClassifier};
use crate::types::{AnalyzedTweet, ETLResult, ProcessedTweet, SentimentLabel, Tweet};
use chrono::{NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 按 (日期, 小时, 标签) 聚合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySentiment {
    pub tweet_date: NaiveDate,
    pub tweet_hour: u32,
    pub sentiment_label: SentimentLabel,
    pub tweet_count: u64,
    pub avg_polarity: f64,
    pub avg_confidence: f64,
}

/// 按 (日期, 标签) 聚合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySentiment {
    pub tweet_date: NaiveDate,
    pub sentiment_label: SentimentLabel,
    pub tweet_count: u64,
    pub avg_polarity: f64,
    pub total_likes: u64,
    pub total_retweets: u64,
}

/// 高互动推文按日期聚合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingTopic {
    pub tweet_date: NaiveDate,
    pub total_engagement: u64,
    pub tweet_count: u64,
    pub avg_sentiment: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedViews {
    pub hourly_sentiment: Vec<HourlySentiment>,
    pub daily_sentiment: Vec<DailySentiment>,
    pub trending_topics: Vec<TrendingTopic>,
}

impl AggregatedViews {
    pub fn is_empty(&self) -> bool {
        self.hourly_sentiment.is_empty()
            && self.daily_sentiment.is_empty()
            && self.trending_topics.is_empty()
    }
}

#[derive(Default)]
struct Accumulator {
    count: u64,
    polarity_sum: f64,
    confidence_sum: f64,
    likes: u64,
    retweets: u64,
}

impl Accumulator {
    fn push(&mut self, tweet: &AnalyzedTweet) {
        self.count += 1;
        self.polarity_sum += tweet.sentiment.polarity;
        self.confidence_sum += tweet.sentiment.confidence;
        self.likes += tweet.record.like_count;
        self.retweets += tweet.record.retweet_count;
    }

    fn avg_polarity(&self) -> f64 {
        self.polarity_sum / self.count.max(1) as f64
    }

    fn avg_confidence(&self) -> f64 {
        self.confidence_sum / self.count.max(1) as f64
    }
}

/// 推文处理器
pub struct TweetProcessor<S = LexiconScorer> {
    language: String,
    trending_min_likes: u64,
    classifier: TextSentimentClassifier<S>,
}

impl TweetProcessor<LexiconScorer> {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self::with_classifier(config, TextSentimentClassifier::new())
    }
}

impl<S: PolarityScorer> TweetProcessor<S> {
    pub fn with_classifier(config: &ProcessingConfig, classifier: TextSentimentClassifier<S>) -> Self {
        Self {
            language: config.language.clone(),
            trending_min_likes: config.trending_min_likes,
            classifier,
        }
    }

    pub fn classifier(&self) -> &TextSentimentClassifier<S> {
        &self.classifier
    }

    /// 读取 JSON Lines 文件；`path` 为目录时读取其中所有 `*.json`
    pub async fn read_json_files(&self, path: &Path) -> ETLResult<Vec<Tweet>> {
        let files: Vec<PathBuf> = if tokio::fs::metadata(path).await?.is_dir() {
            let mut files = Vec::new();
            let mut entries = tokio::fs::read_dir(path).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file = entry.path();
                if entry.file_type().await?.is_file()
                    && file.extension().is_some_and(|ext| ext == "json")
                {
                    files.push(file);
                }
            }
            files.sort();
            files
        } else {
            vec![path.to_path_buf()]
        };

        let mut tweets = Vec::new();
        for file in &files {
            let content = tokio::fs::read_to_string(file).await?;

            for (line_no, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }

                match serde_json::from_str::<Tweet>(line) {
                    Ok(tweet) => tweets.push(tweet),
                    Err(e) => tracing::warn!(
                        "Skipping malformed record {}:{}: {}",
                        file.display(),
                        line_no + 1,
                        e
                    ),
                }
            }
        }

        tracing::info!("Read {} records from {}", tweets.len(), path.display());
        Ok(tweets)
    }

    /// 投影并过滤：只保留目标语言，去掉转推
    pub fn process_tweets(&self, raw: Vec<Tweet>) -> Vec<ProcessedTweet> {
        let processed_at = Utc::now();

        let processed: Vec<ProcessedTweet> = raw
            .into_iter()
            .filter(|t| t.lang.as_deref() == Some(self.language.as_str()))
            .filter(|t| !t.text.starts_with("RT @"))
            .map(|t| ProcessedTweet {
                tweet_date: t.created_at.date_naive(),
                tweet_hour: t.created_at.hour(),
                id: t.id,
                text: t.text,
                created_at: t.created_at,
                author_id: t.author_id,
                lang: t.lang,
                retweet_count: t.retweet_count,
                like_count: t.like_count,
                reply_count: t.reply_count,
                quote_count: t.quote_count,
                collected_at: t.collected_at,
                processed_at,
            })
            .collect();

        tracing::info!("Processed {} tweets", processed.len());
        processed
    }

    /// 逐条情感分析，结果字段并入原记录
    pub fn add_sentiment_analysis(&self, processed: Vec<ProcessedTweet>) -> Vec<AnalyzedTweet> {
        self.classifier.classify_batch_par(processed)
    }

    /// 生成看板使用的聚合视图
    pub fn create_aggregated_views(&self, analyzed: &[AnalyzedTweet]) -> AggregatedViews {
        let mut hourly: BTreeMap<(NaiveDate, u32, SentimentLabel), Accumulator> = BTreeMap::new();
        let mut daily: BTreeMap<(NaiveDate, SentimentLabel), Accumulator> = BTreeMap::new();
        let mut trending: BTreeMap<NaiveDate, Accumulator> = BTreeMap::new();

        for tweet in analyzed {
            let date = tweet.record.tweet_date;
            let label = tweet.sentiment.sentiment_label;

            hourly
                .entry((date, tweet.record.tweet_hour, label))
                .or_default()
                .push(tweet);
            daily.entry((date, label)).or_default().push(tweet);

            if tweet.record.like_count > self.trending_min_likes {
                trending.entry(date).or_default().push(tweet);
            }
        }

        let views = AggregatedViews {
            hourly_sentiment: hourly
                .into_iter()
                .map(|((tweet_date, tweet_hour, sentiment_label), acc)| HourlySentiment {
                    tweet_date,
                    tweet_hour,
                    sentiment_label,
                    tweet_count: acc.count,
                    avg_polarity: acc.avg_polarity(),
                    avg_confidence: acc.avg_confidence(),
                })
                .collect(),
            daily_sentiment: daily
                .into_iter()
                .map(|((tweet_date, sentiment_label), acc)| DailySentiment {
                    tweet_date,
                    sentiment_label,
                    tweet_count: acc.count,
                    avg_polarity: acc.avg_polarity(),
                    total_likes: acc.likes,
                    total_retweets: acc.retweets,
                })
                .collect(),
            trending_topics: trending
                .into_iter()
                .map(|(tweet_date, acc)| TrendingTopic {
                    tweet_date,
                    total_engagement: acc.likes,
                    tweet_count: acc.count,
                    avg_sentiment: acc.avg_polarity(),
                })
                .collect(),
        };

        tracing::info!(
            "Created aggregated views: {} hourly, {} daily, {} trending rows",
            views.hourly_sentiment.len(),
            views.daily_sentiment.len(),
            views.trending_topics.len()
        );
        views
    }
}
