//! 数据存储与仓库查询模块

use crate::processing::AggregatedViews;
use crate::types::{AnalyzedTweet, ETLError, ETLResult, SentimentLabel};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

fn db_err(e: sqlx::Error) -> ETLError {
    ETLError::Database(e.to_string())
}

/// 按平均极性强度划分的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentCategory {
    Strong,   // |avg| >= 0.5
    Moderate, // |avg| >= 0.1
    Weak,
}

impl SentimentCategory {
    pub fn from_avg_polarity(avg: f64) -> Self {
        match avg.abs() {
            a if a >= 0.5 => SentimentCategory::Strong,
            a if a >= 0.1 => SentimentCategory::Moderate,
            _ => SentimentCategory::Weak,
        }
    }
}

/// 每日情感趋势
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentTrend {
    pub tweet_date: NaiveDate,
    pub sentiment_label: SentimentLabel,
    pub tweet_count: u64,
    pub avg_polarity: f64,
    pub sentiment_category: SentimentCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyTrend {
    pub tweet_date: NaiveDate,
    pub tweet_hour: u32,
    pub sentiment_label: SentimentLabel,
    pub tweet_count: u64,
    pub avg_polarity: f64,
    pub avg_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCount {
    pub sentiment_label: SentimentLabel,
    pub count: u64,
}

/// 看板汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_tweets: u64,
    /// 最近一天的标签分布
    pub sentiment_distribution: Vec<LabelCount>,
    /// 最近一天的平均极性，没有数据时为空
    pub avg_sentiment: Option<f64>,
}

/// 看板主数据集的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRow {
    pub tweet_date: NaiveDate,
    pub tweet_hour: u32,
    pub sentiment_label: SentimentLabel,
    pub tweet_count: u64,
    pub avg_polarity: f64,
    pub avg_confidence: f64,
    pub total_likes: u64,
    pub total_retweets: u64,
}

#[derive(Debug)]
pub struct StorageStats {
    pub total_tweets: usize,
}

/// 数据存储
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// 创建新的存储实例
    pub async fn new(database_url: &str) -> ETLResult<Self> {
        let in_memory = database_url.contains(":memory:");

        if !in_memory {
            // 确保数据库文件的目录存在
            let file = database_url
                .trim_start_matches("sqlite:")
                .trim_start_matches("//")
                .split('?')
                .next()
                .unwrap_or_default();
            if let Some(parent) = Path::new(file).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(db_err)?
            .create_if_missing(true);

        // 内存库每个连接都是独立的数据库，只能用单连接
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(db_err)?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        tracing::info!("Connected to warehouse at {}", database_url);
        Ok(storage)
    }

    /// 初始化数据库schema
    async fn initialize_schema(&self) -> ETLResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS processed_tweets (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                cleaned_text TEXT NOT NULL,
                created_at TEXT NOT NULL,
                author_id TEXT,
                lang TEXT,
                retweet_count INTEGER NOT NULL,
                like_count INTEGER NOT NULL,
                reply_count INTEGER NOT NULL,
                quote_count INTEGER NOT NULL,
                collected_at TEXT NOT NULL,
                processed_at TEXT NOT NULL,
                tweet_date TEXT NOT NULL,
                tweet_hour INTEGER NOT NULL,
                polarity REAL NOT NULL,
                subjectivity REAL NOT NULL,
                sentiment_label TEXT NOT NULL,
                confidence REAL NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS hourly_sentiment (
                tweet_date TEXT NOT NULL,
                tweet_hour INTEGER NOT NULL,
                sentiment_label TEXT NOT NULL,
                tweet_count INTEGER NOT NULL,
                avg_polarity REAL NOT NULL,
                avg_confidence REAL NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS daily_sentiment (
                tweet_date TEXT NOT NULL,
                sentiment_label TEXT NOT NULL,
                tweet_count INTEGER NOT NULL,
                avg_polarity REAL NOT NULL,
                total_likes INTEGER NOT NULL,
                total_retweets INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS trending_topics (
                tweet_date TEXT NOT NULL,
                total_engagement INTEGER NOT NULL,
                tweet_count INTEGER NOT NULL,
                avg_sentiment REAL NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_tweets_date ON processed_tweets(tweet_date)",
            "CREATE INDEX IF NOT EXISTS idx_hourly_date ON hourly_sentiment(tweet_date)",
            "CREATE INDEX IF NOT EXISTS idx_daily_date ON daily_sentiment(tweet_date)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        }

        Ok(())
    }

    /// 追加保存分析后的推文（按 id 覆盖）
    pub async fn save_analyzed_tweets(&self, tweets: &[AnalyzedTweet]) -> ETLResult<usize> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        for tweet in tweets {
            let t = &tweet.record;
            let s = &tweet.sentiment;

            sqlx::query(
                r#"
                INSERT OR REPLACE INTO processed_tweets
                (id, text, cleaned_text, created_at, author_id, lang,
                 retweet_count, like_count, reply_count, quote_count,
                 collected_at, processed_at, tweet_date, tweet_hour,
                 polarity, subjectivity, sentiment_label, confidence)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&t.id)
            .bind(&t.text)
            .bind(&s.cleaned_text)
            .bind(t.created_at.to_rfc3339())
            .bind(&t.author_id)
            .bind(&t.lang)
            .bind(t.retweet_count as i64)
            .bind(t.like_count as i64)
            .bind(t.reply_count as i64)
            .bind(t.quote_count as i64)
            .bind(t.collected_at.to_rfc3339())
            .bind(t.processed_at.to_rfc3339())
            .bind(t.tweet_date.to_string())
            .bind(t.tweet_hour as i64)
            .bind(s.polarity)
            .bind(s.subjectivity)
            .bind(s.sentiment_label.as_str())
            .bind(s.confidence)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        tracing::info!("Saved {} analyzed tweets", tweets.len());
        Ok(tweets.len())
    }

    /// 覆盖写入聚合视图
    pub async fn save_views(&self, views: &AggregatedViews) -> ETLResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        for table in ["hourly_sentiment", "daily_sentiment", "trending_topics"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        for row in &views.hourly_sentiment {
            sqlx::query(
                "INSERT INTO hourly_sentiment VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(row.tweet_date.to_string())
            .bind(row.tweet_hour as i64)
            .bind(row.sentiment_label.as_str())
            .bind(row.tweet_count as i64)
            .bind(row.avg_polarity)
            .bind(row.avg_confidence)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        for row in &views.daily_sentiment {
            sqlx::query("INSERT INTO daily_sentiment VALUES (?, ?, ?, ?, ?, ?)")
                .bind(row.tweet_date.to_string())
                .bind(row.sentiment_label.as_str())
                .bind(row.tweet_count as i64)
                .bind(row.avg_polarity)
                .bind(row.total_likes as i64)
                .bind(row.total_retweets as i64)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        for row in &views.trending_topics {
            sqlx::query("INSERT INTO trending_topics VALUES (?, ?, ?, ?)")
                .bind(row.tweet_date.to_string())
                .bind(row.total_engagement as i64)
                .bind(row.tweet_count as i64)
                .bind(row.avg_sentiment)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        tracing::info!(
            "Saved aggregated views ({} hourly, {} daily, {} trending rows)",
            views.hourly_sentiment.len(),
            views.daily_sentiment.len(),
            views.trending_topics.len()
        );
        Ok(())
    }

    /// 最近 N 天的情感趋势
    pub async fn sentiment_trends(&self, days: i64) -> ETLResult<Vec<SentimentTrend>> {
        self.sentiment_trends_since(cutoff_date(days)).await
    }

    pub async fn sentiment_trends_since(&self, since: NaiveDate) -> ETLResult<Vec<SentimentTrend>> {
        let rows = sqlx::query(
            r#"
            SELECT tweet_date, sentiment_label, tweet_count, avg_polarity
            FROM daily_sentiment
            WHERE tweet_date >= ?
            ORDER BY tweet_date DESC, sentiment_label
            "#,
        )
        .bind(since.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let trends = rows
            .iter()
            .map(|row| {
                let avg_polarity: f64 = row.get("avg_polarity");
                Ok(SentimentTrend {
                    tweet_date: parse_date(row)?,
                    sentiment_label: parse_label(row)?,
                    tweet_count: row.get::<i64, _>("tweet_count") as u64,
                    avg_polarity,
                    sentiment_category: SentimentCategory::from_avg_polarity(avg_polarity),
                })
            })
            .collect::<ETLResult<Vec<SentimentTrend>>>()?;

        tracing::info!("Query executed successfully, returned {} rows", trends.len());
        Ok(trends)
    }

    /// 指定日期的小时趋势
    pub async fn hourly_trends(&self, date: NaiveDate) -> ETLResult<Vec<HourlyTrend>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM hourly_sentiment
            WHERE tweet_date = ?
            ORDER BY tweet_hour, sentiment_label
            "#,
        )
        .bind(date.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let trends = rows
            .iter()
            .map(|row| {
                Ok(HourlyTrend {
                    tweet_date: parse_date(row)?,
                    tweet_hour: row.get::<i64, _>("tweet_hour") as u32,
                    sentiment_label: parse_label(row)?,
                    tweet_count: row.get::<i64, _>("tweet_count") as u64,
                    avg_polarity: row.get("avg_polarity"),
                    avg_confidence: row.get("avg_confidence"),
                })
            })
            .collect::<ETLResult<Vec<HourlyTrend>>>()?;

        Ok(trends)
    }

    /// 看板汇总（总量 + 最近一天的分布与均值）
    pub async fn dashboard_summary(&self) -> ETLResult<DashboardSummary> {
        self.dashboard_summary_since(cutoff_date(1)).await
    }

    pub async fn dashboard_summary_since(&self, since: NaiveDate) -> ETLResult<DashboardSummary> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processed_tweets")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let rows = sqlx::query(
            r#"
            SELECT sentiment_label, COUNT(*) AS count
            FROM processed_tweets
            WHERE tweet_date >= ?
            GROUP BY sentiment_label
            ORDER BY sentiment_label
            "#,
        )
        .bind(since.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let sentiment_distribution = rows
            .iter()
            .map(|row| {
                Ok(LabelCount {
                    sentiment_label: parse_label(row)?,
                    count: row.get::<i64, _>("count") as u64,
                })
            })
            .collect::<ETLResult<Vec<LabelCount>>>()?;

        let avg_sentiment: Option<f64> = sqlx::query_scalar(
            "SELECT AVG(polarity) FROM processed_tweets WHERE tweet_date >= ?",
        )
        .bind(since.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(DashboardSummary {
            total_tweets: total as u64,
            sentiment_distribution,
            avg_sentiment,
        })
    }

    /// 看板主数据集：最近 N 天按 (日期, 小时, 标签) 聚合
    pub async fn dashboard_dataset(&self, days: i64) -> ETLResult<Vec<DashboardRow>> {
        let rows = sqlx::query(
            r#"
            SELECT
                tweet_date,
                tweet_hour,
                sentiment_label,
                COUNT(*) AS tweet_count,
                AVG(polarity) AS avg_polarity,
                AVG(confidence) AS avg_confidence,
                SUM(like_count) AS total_likes,
                SUM(retweet_count) AS total_retweets
            FROM processed_tweets
            WHERE tweet_date >= ?
            GROUP BY tweet_date, tweet_hour, sentiment_label
            ORDER BY tweet_date DESC, tweet_hour DESC, sentiment_label
            "#,
        )
        .bind(cutoff_date(days).to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let dataset = rows
            .iter()
            .map(|row| {
                Ok(DashboardRow {
                    tweet_date: parse_date(row)?,
                    tweet_hour: row.get::<i64, _>("tweet_hour") as u32,
                    sentiment_label: parse_label(row)?,
                    tweet_count: row.get::<i64, _>("tweet_count") as u64,
                    avg_polarity: row.get("avg_polarity"),
                    avg_confidence: row.get("avg_confidence"),
                    total_likes: row.get::<i64, _>("total_likes") as u64,
                    total_retweets: row.get::<i64, _>("total_retweets") as u64,
                })
            })
            .collect::<ETLResult<Vec<DashboardRow>>>()?;

        Ok(dataset)
    }

    /// 统计信息
    pub async fn stats(&self) -> ETLResult<StorageStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processed_tweets")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(StorageStats {
            total_tweets: total as usize,
        })
    }
}

fn cutoff_date(days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(days)
}

fn parse_date(row: &SqliteRow) -> ETLResult<NaiveDate> {
    let raw: String = row.get("tweet_date");
    raw.parse()
        .map_err(|e| ETLError::Database(format!("无效的日期 {:?}: {}", raw, e)))
}

fn parse_label(row: &SqliteRow) -> ETLResult<SentimentLabel> {
    let raw: String = row.get("sentiment_label");
    raw.parse()
        .map_err(|_| ETLError::Database(format!("无效的情感标签 {:?}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{DailySentiment, HourlySentiment, TrendingTopic};
    use crate::types::{Classified, ProcessedTweet, SentimentResult};
    use chrono::{TimeZone, Timelike};

    fn analyzed(id: &str, date: NaiveDate, hour: u32, polarity: f64, likes: u64) -> AnalyzedTweet {
        let created_at = Utc
            .from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap());
        Classified {
            record: ProcessedTweet {
                id: id.to_string(),
                text: format!("tweet {}", id),
                created_at,
                author_id: None,
                lang: Some("en".to_string()),
                retweet_count: 1,
                like_count: likes,
                reply_count: 0,
                quote_count: 0,
                collected_at: created_at,
                processed_at: created_at,
                tweet_date: date,
                tweet_hour: created_at.hour(),
            },
            sentiment: SentimentResult::from_scores(format!("tweet {}", id), polarity, 0.5),
        }
    }

    async fn memory_storage() -> Storage {
        Storage::new("sqlite::memory:").await.unwrap()
    }

    #[test]
    fn test_sentiment_category() {
        assert_eq!(SentimentCategory::from_avg_polarity(0.5), SentimentCategory::Strong);
        assert_eq!(SentimentCategory::from_avg_polarity(-0.7), SentimentCategory::Strong);
        assert_eq!(SentimentCategory::from_avg_polarity(0.1), SentimentCategory::Moderate);
        assert_eq!(SentimentCategory::from_avg_polarity(0.05), SentimentCategory::Weak);
    }

    #[tokio::test]
    async fn test_save_tweets_upserts_by_id() {
        let storage = memory_storage().await;
        let today = Utc::now().date_naive();

        storage
            .save_analyzed_tweets(&[analyzed("1", today, 3, 0.5, 1), analyzed("2", today, 4, -0.5, 2)])
            .await
            .unwrap();
        storage
            .save_analyzed_tweets(&[analyzed("1", today, 3, 0.0, 1)])
            .await
            .unwrap();

        assert_eq!(storage.stats().await.unwrap().total_tweets, 2);
    }

    #[tokio::test]
    async fn test_dashboard_summary() {
        let storage = memory_storage().await;
        let today = Utc::now().date_naive();
        let old = today - Duration::days(10);

        storage
            .save_analyzed_tweets(&[
                analyzed("1", today, 1, 0.6, 0),
                analyzed("2", today, 2, 0.2, 0),
                analyzed("3", today, 2, -0.4, 0),
                analyzed("4", old, 2, -1.0, 0),
            ])
            .await
            .unwrap();

        let summary = storage.dashboard_summary().await.unwrap();

        assert_eq!(summary.total_tweets, 4);
        assert_eq!(
            summary.sentiment_distribution,
            vec![
                LabelCount { sentiment_label: SentimentLabel::Negative, count: 1 },
                LabelCount { sentiment_label: SentimentLabel::Positive, count: 2 },
            ]
        );
        assert!((summary.avg_sentiment.unwrap() - 0.4 / 3.0).abs() < 1e-9);

        let empty = storage
            .dashboard_summary_since(today + Duration::days(5))
            .await
            .unwrap();
        assert!(empty.sentiment_distribution.is_empty());
        assert_eq!(empty.avg_sentiment, None);
    }

    #[tokio::test]
    async fn test_views_are_overwritten_and_queried() {
        let storage = memory_storage().await;
        let today = Utc::now().date_naive();
        let yesterday = today - Duration::days(1);
        let long_ago = today - Duration::days(40);

        let stale = AggregatedViews {
            hourly_sentiment: vec![],
            daily_sentiment: vec![DailySentiment {
                tweet_date: today,
                sentiment_label: SentimentLabel::Neutral,
                tweet_count: 99,
                avg_polarity: 0.0,
                total_likes: 0,
                total_retweets: 0,
            }],
            trending_topics: vec![],
        };
        storage.save_views(&stale).await.unwrap();

        let views = AggregatedViews {
            hourly_sentiment: vec![
                HourlySentiment {
                    tweet_date: today,
                    tweet_hour: 14,
                    sentiment_label: SentimentLabel::Positive,
                    tweet_count: 3,
                    avg_polarity: 0.4,
                    avg_confidence: 0.4,
                },
                HourlySentiment {
                    tweet_date: today,
                    tweet_hour: 9,
                    sentiment_label: SentimentLabel::Negative,
                    tweet_count: 1,
                    avg_polarity: -0.6,
                    avg_confidence: 0.6,
                },
            ],
            daily_sentiment: vec![
                DailySentiment {
                    tweet_date: yesterday,
                    sentiment_label: SentimentLabel::Positive,
                    tweet_count: 5,
                    avg_polarity: 0.7,
                    total_likes: 10,
                    total_retweets: 2,
                },
                DailySentiment {
                    tweet_date: today,
                    sentiment_label: SentimentLabel::Positive,
                    tweet_count: 3,
                    avg_polarity: 0.2,
                    total_likes: 1,
                    total_retweets: 0,
                },
                DailySentiment {
                    tweet_date: today,
                    sentiment_label: SentimentLabel::Negative,
                    tweet_count: 1,
                    avg_polarity: -0.05,
                    total_likes: 0,
                    total_retweets: 0,
                },
                DailySentiment {
                    tweet_date: long_ago,
                    sentiment_label: SentimentLabel::Neutral,
                    tweet_count: 7,
                    avg_polarity: 0.0,
                    total_likes: 0,
                    total_retweets: 0,
                },
            ],
            trending_topics: vec![TrendingTopic {
                tweet_date: today,
                total_engagement: 50,
                tweet_count: 2,
                avg_sentiment: 0.3,
            }],
        };
        storage.save_views(&views).await.unwrap();

        let trends = storage.sentiment_trends(7).await.unwrap();
        let summary: Vec<(NaiveDate, SentimentLabel, SentimentCategory)> = trends
            .iter()
            .map(|t| (t.tweet_date, t.sentiment_label, t.sentiment_category))
            .collect();
        assert_eq!(
            summary,
            vec![
                (today, SentimentLabel::Negative, SentimentCategory::Weak),
                (today, SentimentLabel::Positive, SentimentCategory::Moderate),
                (yesterday, SentimentLabel::Positive, SentimentCategory::Strong),
            ]
        );

        let hourly = storage.hourly_trends(today).await.unwrap();
        assert_eq!(hourly.len(), 2);
        assert_eq!(hourly[0].tweet_hour, 9);
        assert_eq!(hourly[1].tweet_hour, 14);
        assert!(storage.hourly_trends(yesterday).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_dataset() {
        let storage = memory_storage().await;
        let today = Utc::now().date_naive();

        storage
            .save_analyzed_tweets(&[
                analyzed("1", today, 8, 0.6, 10),
                analyzed("2", today, 8, 0.4, 5),
                analyzed("3", today, 9, -0.4, 0),
            ])
            .await
            .unwrap();

        let dataset = storage.dashboard_dataset(30).await.unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset[0].tweet_hour, 9);
        assert_eq!(dataset[1].tweet_hour, 8);
        assert_eq!(dataset[1].tweet_count, 2);
        assert_eq!(dataset[1].total_likes, 15);
        assert_eq!(dataset[1].total_retweets, 2);
        assert!((dataset[1].avg_polarity - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_corrupt_rows_are_reported() {
        let storage = memory_storage().await;
        let today = Utc::now().date_naive();

        sqlx::query("INSERT INTO daily_sentiment VALUES (?, 'furious', 1, 0.0, 0, 0)")
            .bind(today.to_string())
            .execute(&storage.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO hourly_sentiment VALUES (?, 3, 'sad', 1, 0.5, 0.5)")
            .bind(today.to_string())
            .execute(&storage.pool)
            .await
            .unwrap();

        assert!(matches!(
            storage.sentiment_trends(7).await,
            Err(ETLError::Database(_))
        ));
        assert!(matches!(
            storage.hourly_trends(today).await,
            Err(ETLError::Database(_))
        ));

        storage
            .save_analyzed_tweets(&[analyzed("1", today, 3, 0.5, 1)])
            .await
            .unwrap();
        sqlx::query("UPDATE processed_tweets SET sentiment_label = 'meh'")
            .execute(&storage.pool)
            .await
            .unwrap();
        assert!(matches!(
            storage.dashboard_summary().await,
            Err(ETLError::Database(_))
        ));
        assert!(matches!(
            storage.dashboard_dataset(7).await,
            Err(ETLError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_file_database_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("warehouse.db");
        let url = format!("sqlite:{}", db_path.display());

        let storage = Storage::new(&url).await.unwrap();
        assert_eq!(storage.stats().await.unwrap().total_tweets, 0);
        assert!(db_path.exists());
    }
}
