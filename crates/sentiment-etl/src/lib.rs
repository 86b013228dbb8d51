//! # Sentiment ETL
//!
//! 社交媒体情感分析 ETL 管道
//!
//! ## 功能
//!
//! - 从社交 API 采集帖子，保存为 JSON Lines 原始文件
//! - 文本清洗与情感分类（正面 / 中性 / 负面）
//! - 按小时、按天聚合，写入 SQLite 数据仓库
//! - 导出看板 CSV，定时调度与健康检查

pub mod config;
pub mod types;
pub mod sentiment;
pub mod ingestion;
pub mod processing;
pub mod storage;
pub mod export;
pub mod monitor;
pub mod pipeline;

pub use config::PipelineConfig;
pub use pipeline::{PipelineRun, SentimentPipeline, SentimentPipelineBuilder};
pub use sentiment::{clean_text, LexiconScorer, PolarityScore, PolarityScorer, TextSentimentClassifier};
pub use types::{
    AnalyzedTweet, Classified, ETLError, ETLResult, ProcessedTweet, SentimentLabel,
    SentimentResult, TextRecord, Tweet,
};
