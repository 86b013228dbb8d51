//! ETL 管道与调度

use crate::config::PipelineConfig;
use crate::export::{DashboardDatasetRow, DashboardExporter};
use crate::ingestion::{raw_filename, save_tweets_to_file, PostSource, TwitterClient};
use crate::monitor::{HealthReport, PipelineMonitor};
use crate::processing::TweetProcessor;
use crate::storage::Storage;
use crate::types::ETLResult;
use chrono::Utc;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;

/// 一次完整运行的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineRun {
    pub collected_file: Option<String>,
    pub processed: usize,
    pub dashboard_updated: bool,
}

/// 情感分析 ETL 管道
pub struct SentimentPipeline {
    config: PipelineConfig,
    source: Box<dyn PostSource>,
    processor: TweetProcessor,
    storage: Arc<Storage>,
    exporter: DashboardExporter,
    monitor: PipelineMonitor,
}

impl SentimentPipeline {
    /// 使用 Twitter 数据源创建管道
    pub async fn new(config: PipelineConfig) -> ETLResult<Self> {
        let source = TwitterClient::from_config(&config.twitter)?;
        Self::with_source(config, Box::new(source)).await
    }

    pub async fn with_source(config: PipelineConfig, source: Box<dyn PostSource>) -> ETLResult<Self> {
        let storage = Storage::new(&config.storage.database_url).await?;
        let monitor = PipelineMonitor::new(config.monitor.clone(), config.processing.raw_dir.clone())?;

        Ok(Self {
            processor: TweetProcessor::new(&config.processing),
            exporter: DashboardExporter::new(&config.dashboard),
            storage: Arc::new(storage),
            monitor,
            source,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn storage(&self) -> Arc<Storage> {
        Arc::clone(&self.storage)
    }

    /// 采集推文并写入原始目录，返回文件名；数据源失败或无数据时返回 `None`
    pub async fn collect_tweets(
        &self,
        keywords: Option<&[String]>,
        max_results: Option<usize>,
    ) -> ETLResult<Option<String>> {
        let query = match keywords {
            Some(keywords) => keywords.join(" OR "),
            None => self.config.twitter.query(),
        };
        let max_results = max_results.unwrap_or(self.config.twitter.max_results);

        tracing::info!("Collecting up to {} posts from {}", max_results, self.source.name());

        let tweets = match self.source.search(&query, max_results).await {
            Ok(tweets) => tweets,
            Err(e) => {
                tracing::error!("Error collecting tweets from {}: {}", self.source.name(), e);
                return Ok(None);
            }
        };

        if tweets.is_empty() {
            tracing::warn!("No tweets returned for query {:?}", query);
            return Ok(None);
        }

        let filename = raw_filename(Utc::now());
        save_tweets_to_file(&self.config.processing.raw_dir, &tweets, &filename).await?;
        Ok(Some(filename))
    }

    /// 处理原始数据：指定文件名只处理该文件，否则处理整个原始目录
    pub async fn process_data(&self, filename: Option<&str>) -> ETLResult<usize> {
        let raw_dir = &self.config.processing.raw_dir;
        let path = match filename {
            Some(name) => raw_dir.join(name),
            None => raw_dir.clone(),
        };

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::warn!("No raw data at {}", path.display());
            return Ok(0);
        }

        let raw = self.processor.read_json_files(&path).await?;
        let processed = self.processor.process_tweets(raw);
        if processed.is_empty() {
            tracing::warn!("No tweets left to analyze in {}", path.display());
            return Ok(0);
        }

        let analyzed = self.processor.add_sentiment_analysis(processed);
        let views = self.processor.create_aggregated_views(&analyzed);

        let saved = self.storage.save_analyzed_tweets(&analyzed).await?;
        self.storage.save_views(&views).await?;

        tracing::info!("Data processing completed: {} tweets", saved);
        Ok(saved)
    }

    /// 导出最近几天的趋势给看板
    pub async fn update_dashboard_data(&self) -> ETLResult<PathBuf> {
        self.exporter
            .export_trends(&self.storage, self.config.dashboard.trend_days)
            .await
    }

    /// 完整导出：趋势、小时趋势、汇总和主数据集
    pub async fn export_dashboard(&self) -> ETLResult<(Vec<PathBuf>, Vec<DashboardDatasetRow>)> {
        let files = self.exporter.export_to_csv(&self.storage).await?;
        let dataset = self.exporter.create_dashboard_dataset(&self.storage).await?;
        Ok((files, dataset))
    }

    pub async fn health_report(&self) -> ETLResult<(HealthReport, PathBuf)> {
        self.monitor.generate_health_report().await
    }

    /// 采集 → 处理 → 看板；单个阶段失败只记录日志
    pub async fn run_full_pipeline(&self) -> PipelineRun {
        tracing::info!("Starting full pipeline run");
        let mut run = PipelineRun::default();

        match self.collect_tweets(None, None).await {
            Ok(collected) => run.collected_file = collected,
            Err(e) => tracing::error!("Collection stage failed: {}", e),
        }

        if let Some(filename) = run.collected_file.as_deref() {
            match self.process_data(Some(filename)).await {
                Ok(n) => run.processed = n,
                Err(e) => tracing::error!("Processing stage failed: {}", e),
            }
        }

        match self.update_dashboard_data().await {
            Ok(_) => run.dashboard_updated = true,
            Err(e) => tracing::error!("Dashboard update failed: {}", e),
        }

        tracing::info!("Pipeline run finished: {:?}", run);
        run
    }

    /// 定时运行管道和看板刷新，直到 `shutdown` 完成
    ///
    /// 运行中途收到 `shutdown` 也会立即退出：正在进行的运行被取消，
    /// 未提交的数据库事务随之回滚。
    pub async fn start_scheduler<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut pipeline_tick = tokio::time::interval(self.config.scheduler.pipeline_interval());
        let mut dashboard_tick = tokio::time::interval(self.config.scheduler.dashboard_interval());
        pipeline_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        dashboard_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            "Scheduler started (pipeline every {:?}, dashboard every {:?})",
            self.config.scheduler.pipeline_interval(),
            self.config.scheduler.dashboard_interval()
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = pipeline_tick.tick() => {
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => {
                            tracing::warn!("Shutdown requested, cancelling in-flight pipeline run");
                            break;
                        }
                        _ = self.run_full_pipeline() => {}
                    }
                }
                _ = dashboard_tick.tick() => {
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => break,
                        result = self.update_dashboard_data() => {
                            if let Err(e) = result {
                                tracing::error!("Scheduled dashboard update failed: {}", e);
                            }
                        }
                    }
                }
            }
        }

        tracing::info!("Scheduler stopped");
    }

    /// 获取存储统计信息
    pub async fn storage_stats(&self) -> ETLResult<String> {
        let stats = self.storage.stats().await?;
        Ok(format!("Total tweets: {}", stats.total_tweets))
    }
}

/// 管道构建器
pub struct SentimentPipelineBuilder {
    config: PipelineConfig,
    source: Option<Box<dyn PostSource>>,
}

impl SentimentPipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            source: None,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.config.twitter.keywords = keywords;
        self
    }

    pub fn with_database(mut self, url: String) -> Self {
        self.config.storage.database_url = url;
        self
    }

    pub fn with_raw_dir(mut self, dir: PathBuf) -> Self {
        self.config.processing.raw_dir = dir;
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.config.dashboard.output_dir = dir;
        self
    }

    pub fn with_source(mut self, source: Box<dyn PostSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub async fn build(self) -> ETLResult<SentimentPipeline> {
        match self.source {
            Some(source) => SentimentPipeline::with_source(self.config, source).await,
            None => SentimentPipeline::new(self.config).await,
        }
    }
}

impl Default for SentimentPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ETLError, Tweet};
    use async_trait::async_trait;
    use std::time::Duration;

    struct StaticSource(Vec<Tweet>);

    #[async_trait]
    impl PostSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn search(&self, _query: &str, max_results: usize) -> ETLResult<Vec<Tweet>> {
            Ok(self.0.iter().take(max_results).cloned().collect())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl PostSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn search(&self, _query: &str, _max_results: usize) -> ETLResult<Vec<Tweet>> {
            Err(ETLError::DataSource("rate limited".to_string()))
        }
    }

    fn tweet(id: &str, text: &str, lang: &str) -> Tweet {
        let now = Utc::now();
        Tweet {
            id: id.to_string(),
            text: text.to_string(),
            created_at: now,
            author_id: None,
            lang: Some(lang.to_string()),
            retweet_count: 1,
            like_count: 20,
            reply_count: 0,
            quote_count: 0,
            collected_at: now,
        }
    }

    fn sample_tweets() -> Vec<Tweet> {
        vec![
            tweet("1", "I love this amazing product! https://t.co/x", "en"),
            tweet("2", "This is terrible and awful @support", "en"),
            tweet("3", "RT @someone: I love it", "en"),
            tweet("4", "Me encanta", "es"),
        ]
    }

    async fn build(dir: &std::path::Path, source: Box<dyn PostSource>) -> SentimentPipeline {
        SentimentPipelineBuilder::new()
            .with_database("sqlite::memory:".to_string())
            .with_raw_dir(dir.join("raw"))
            .with_output_dir(dir.join("dashboard"))
            .with_source(source)
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_pipeline_run() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = build(dir.path(), Box::new(StaticSource(sample_tweets()))).await;

        let run = pipeline.run_full_pipeline().await;

        let filename = run.collected_file.expect("raw file");
        assert!(dir.path().join("raw").join(&filename).exists());
        assert_eq!(run.processed, 2);
        assert!(run.dashboard_updated);
        assert!(dir.path().join("dashboard").join("sentiment_trends.csv").exists());
        assert_eq!(pipeline.storage_stats().await.unwrap(), "Total tweets: 2");

        let trends = pipeline.storage().sentiment_trends(7).await.unwrap();
        assert_eq!(trends.len(), 2);
    }

    #[tokio::test]
    async fn test_source_failure_does_not_abort_run() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = build(dir.path(), Box::new(FailingSource)).await;

        assert_eq!(pipeline.collect_tweets(None, None).await.unwrap(), None);

        let run = pipeline.run_full_pipeline().await;
        assert_eq!(run.collected_file, None);
        assert_eq!(run.processed, 0);
        assert!(run.dashboard_updated);
    }

    #[tokio::test]
    async fn test_collect_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = build(dir.path(), Box::new(StaticSource(sample_tweets()))).await;

        let keywords = vec!["rust".to_string()];
        let filename = pipeline
            .collect_tweets(Some(&keywords), Some(1))
            .await
            .unwrap()
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("raw").join(filename)).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_process_data_without_raw_dir() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = build(dir.path(), Box::new(StaticSource(vec![]))).await;

        assert_eq!(pipeline.process_data(None).await.unwrap(), 0);
        assert_eq!(pipeline.collect_tweets(None, None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_export_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = build(dir.path(), Box::new(StaticSource(sample_tweets()))).await;
        pipeline.run_full_pipeline().await;

        let (files, dataset) = pipeline.export_dashboard().await.unwrap();

        assert_eq!(files.len(), 3);
        assert_eq!(dataset.iter().map(|r| r.tweet_count).sum::<u64>(), 2);
        assert!(dir.path().join("dashboard").join("main_sentiment_data.csv").exists());
    }

    #[tokio::test]
    async fn test_scheduler_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = build(dir.path(), Box::new(StaticSource(sample_tweets()))).await;

        pipeline
            .start_scheduler(tokio::time::sleep(Duration::from_millis(1000)))
            .await;

        assert_eq!(pipeline.storage().stats().await.unwrap().total_tweets, 2);
    }

    struct SlowSource;

    #[async_trait]
    impl PostSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        async fn search(&self, _query: &str, _max_results: usize) -> ETLResult<Vec<Tweet>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_shutdown_cancels_in_flight_run() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = build(dir.path(), Box::new(SlowSource)).await;

        let stopped = tokio::time::timeout(
            Duration::from_secs(10),
            pipeline.start_scheduler(tokio::time::sleep(Duration::from_millis(100))),
        )
        .await;

        assert!(stopped.is_ok());
        assert_eq!(pipeline.storage().stats().await.unwrap().total_tweets, 0);
    }
}
