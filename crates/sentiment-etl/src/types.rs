//! 核心类型定义

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ETLResult<T> = Result<T, ETLError>;

#[derive(Debug, Error)]
pub enum ETLError {
    #[error("HTTP 请求失败: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("JSON 解析失败: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据源错误: {0}")]
    DataSource(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("其他错误: {0}")]
    Other(String),
}

/// 任何带有 `text` 字段的记录都可以被情感分类
pub trait TextRecord {
    fn text(&self) -> &str;
}

impl TextRecord for String {
    fn text(&self) -> &str {
        self
    }
}

impl TextRecord for &str {
    fn text(&self) -> &str {
        self
    }
}

/// 从社交 API 抓取的原始推文
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub quote_count: u64,
    /// 抓取时间
    pub collected_at: DateTime<Utc>,
}

impl TextRecord for Tweet {
    fn text(&self) -> &str {
        &self.text
    }
}

/// 投影、过滤之后的推文
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedTweet {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Option<String>,
    pub lang: Option<String>,
    pub retweet_count: u64,
    pub like_count: u64,
    pub reply_count: u64,
    pub quote_count: u64,
    pub collected_at: DateTime<Utc>,
    /// 处理时间
    pub processed_at: DateTime<Utc>,
    /// 分区日期（created_at 的日期部分）
    pub tweet_date: NaiveDate,
    /// 小时 [0, 23]
    pub tweet_hour: u32,
}

impl TextRecord for ProcessedTweet {
    fn text(&self) -> &str {
        &self.text
    }
}

/// 情感标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    /// 阈值之外才算有倾向，恰好等于 ±0.1 仍为中性
    pub const POSITIVE_THRESHOLD: f64 = 0.1;
    pub const NEGATIVE_THRESHOLD: f64 = -0.1;

    pub fn from_polarity(polarity: f64) -> Self {
        match polarity {
            p if p > Self::POSITIVE_THRESHOLD => SentimentLabel::Positive,
            p if p < Self::NEGATIVE_THRESHOLD => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SentimentLabel {
    type Err = ETLError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(SentimentLabel::Positive),
            "negative" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            other => Err(ETLError::Other(format!("未知情感标签: {}", other))),
        }
    }
}

/// 单条文本的情感分析结果，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub cleaned_text: String,
    /// 极性 [-1.0, 1.0]
    pub polarity: f64,
    /// 主观性 [0.0, 1.0]
    pub subjectivity: f64,
    pub sentiment_label: SentimentLabel,
    /// 恒等于 |polarity|
    pub confidence: f64,
}

impl SentimentResult {
    /// 分数被截断到各自的取值范围内；调用方需保证分数是有限值
    pub fn from_scores(cleaned_text: String, polarity: f64, subjectivity: f64) -> Self {
        let polarity = polarity.clamp(-1.0, 1.0);
        let subjectivity = subjectivity.clamp(0.0, 1.0);
        Self {
            cleaned_text,
            polarity,
            subjectivity,
            sentiment_label: SentimentLabel::from_polarity(polarity),
            confidence: polarity.abs(),
        }
    }

    /// 打分失败时的默认结果。与真正的中性结果无法区分，需要区分时使用
    /// `TextSentimentClassifier::try_classify`
    pub fn neutral_default(original_text: &str) -> Self {
        Self {
            cleaned_text: original_text.to_string(),
            polarity: 0.0,
            subjectivity: 0.0,
            sentiment_label: SentimentLabel::Neutral,
            confidence: 0.0,
        }
    }
}

/// 原始记录 + 情感字段
///
/// 序列化时两部分平铺到同一层，因此只有结构体记录（如 `Tweet`、`ProcessedTweet`）
/// 可以序列化；`String` / `&str` 记录只用于内存中的分类结果，序列化会返回错误。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classified<R> {
    #[serde(flatten)]
    pub record: R,
    #[serde(flatten)]
    pub sentiment: SentimentResult,
}

pub type AnalyzedTweet = Classified<ProcessedTweet>;
