//! 看板数据导出（CSV）

use crate::config::DashboardConfig;
use crate::storage::{DashboardRow, HourlyTrend, SentimentTrend, Storage};
use crate::types::{ETLError, ETLResult, SentimentLabel};
use chrono::{Duration, NaiveDate, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::path::{Path, PathBuf};

const TRENDS_FILE: &str = "sentiment_trends.csv";
const HOURLY_FILE: &str = "hourly_trends.csv";
const SUMMARY_FILE: &str = "summary_stats.csv";
const DATASET_FILE: &str = "main_sentiment_data.csv";

const TREND_HEADERS: [&str; 5] = [
    "tweet_date",
    "sentiment_label",
    "tweet_count",
    "avg_polarity",
    "sentiment_category",
];
const SUMMARY_HEADERS: [&str; 3] = ["metric_type", "sentiment_label", "value"];
const HOURLY_HEADERS: [&str; 6] = [
    "tweet_date",
    "tweet_hour",
    "sentiment_label",
    "tweet_count",
    "avg_polarity",
    "avg_confidence",
];

/// 看板主数据集：仓库聚合 + 派生列
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardDatasetRow {
    pub tweet_date: NaiveDate,
    pub tweet_hour: u32,
    pub sentiment_label: SentimentLabel,
    pub tweet_count: u64,
    pub avg_polarity: f64,
    pub avg_confidence: f64,
    pub total_likes: u64,
    pub total_retweets: u64,
    /// 点赞 + 转推
    pub engagement_score: u64,
    /// |avg_polarity|
    pub sentiment_strength: f64,
    /// `YYYY-MM-DD H:00:00`
    pub datetime: String,
}

impl From<DashboardRow> for DashboardDatasetRow {
    fn from(row: DashboardRow) -> Self {
        Self {
            engagement_score: row.total_likes + row.total_retweets,
            sentiment_strength: row.avg_polarity.abs(),
            datetime: format!("{} {}:00:00", row.tweet_date, row.tweet_hour),
            tweet_date: row.tweet_date,
            tweet_hour: row.tweet_hour,
            sentiment_label: row.sentiment_label,
            tweet_count: row.tweet_count,
            avg_polarity: row.avg_polarity,
            avg_confidence: row.avg_confidence,
            total_likes: row.total_likes,
            total_retweets: row.total_retweets,
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryRecord {
    metric_type: &'static str,
    sentiment_label: Option<SentimentLabel>,
    value: f64,
}

/// 看板导出器
pub struct DashboardExporter {
    output_dir: PathBuf,
    export_days: i64,
    hourly_days: i64,
}

impl DashboardExporter {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            export_days: config.export_days,
            hourly_days: config.hourly_days,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    async fn write_file(&self, filename: &str, content: Vec<u8>) -> ETLResult<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(filename);
        tokio::fs::write(&path, content).await?;
        Ok(path)
    }

    /// 导出最近 N 天的情感趋势
    pub async fn export_trends(&self, storage: &Storage, days: i64) -> ETLResult<PathBuf> {
        let trends = storage.sentiment_trends(days).await?;
        let path = self.write_trends(&trends).await?;
        tracing::info!("Exported {} trend rows to {}", trends.len(), path.display());
        Ok(path)
    }

    async fn write_trends(&self, trends: &[SentimentTrend]) -> ETLResult<PathBuf> {
        let content = encode_csv(Some(&TREND_HEADERS[..]), trends)?;
        self.write_file(TRENDS_FILE, content).await
    }

    async fn write_hourly(&self, hourly: &[HourlyTrend]) -> ETLResult<PathBuf> {
        let content = encode_csv(Some(&HOURLY_HEADERS[..]), hourly)?;
        self.write_file(HOURLY_FILE, content).await
    }

    /// 导出趋势、小时趋势和汇总统计，返回写出的文件
    pub async fn export_to_csv(&self, storage: &Storage) -> ETLResult<Vec<PathBuf>> {
        let mut written = Vec::new();

        let trends = storage.sentiment_trends(self.export_days).await?;
        written.push(self.write_trends(&trends).await?);

        let today = Utc::now().date_naive();
        let mut hourly = Vec::new();
        for i in 0..self.hourly_days {
            let date = today - Duration::days(i);
            hourly.extend(storage.hourly_trends(date).await?);
        }
        if !hourly.is_empty() {
            written.push(self.write_hourly(&hourly).await?);
        }

        let summary = storage.dashboard_summary().await?;
        let mut records = vec![SummaryRecord {
            metric_type: "total_tweets",
            sentiment_label: None,
            value: summary.total_tweets as f64,
        }];
        records.extend(summary.sentiment_distribution.iter().map(|d| SummaryRecord {
            metric_type: "sentiment_distribution",
            sentiment_label: Some(d.sentiment_label),
            value: d.count as f64,
        }));
        if let Some(avg) = summary.avg_sentiment {
            records.push(SummaryRecord {
                metric_type: "avg_sentiment",
                sentiment_label: None,
                value: avg,
            });
        }

        let content = encode_csv(Some(&SUMMARY_HEADERS[..]), &records)?;
        written.push(self.write_file(SUMMARY_FILE, content).await?);

        tracing::info!("Data exported to {} CSV files for the dashboard", written.len());
        Ok(written)
    }

    /// 生成看板主数据集
    pub async fn create_dashboard_dataset(
        &self,
        storage: &Storage,
    ) -> ETLResult<Vec<DashboardDatasetRow>> {
        let rows: Vec<DashboardDatasetRow> = storage
            .dashboard_dataset(self.export_days)
            .await?
            .into_iter()
            .map(DashboardDatasetRow::from)
            .collect();

        let content = encode_csv(None, &rows)?;
        self.write_file(DATASET_FILE, content).await?;

        tracing::info!("Dashboard dataset created with {} rows", rows.len());
        Ok(rows)
    }
}

/// 在内存中编码 CSV；给定 `headers` 时总是写出表头，否则由第一行记录推导
fn encode_csv<T: Serialize>(headers: Option<&[&str]>, rows: &[T]) -> ETLResult<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(headers.is_none())
        .from_writer(Vec::new());

    if let Some(headers) = headers {
        writer.write_record(headers)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| ETLError::Io(e.into_error()))
}
