//! 社交媒体数据采集模块

pub mod twitter;

use crate::types::{ETLResult, Tweet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub use twitter::TwitterClient;

/// 帖子数据源接口
#[async_trait]
pub trait PostSource: Send + Sync {
    /// 数据源名称
    fn name(&self) -> &str;

    /// 搜索最近的帖子
    async fn search(&self, query: &str, max_results: usize) -> ETLResult<Vec<Tweet>>;
}

/// 通用 HTTP 客户端配置
pub fn create_http_client(timeout_secs: u64) -> ETLResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("sentiment-etl/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(Into::into)
}

/// 原始数据文件名：`tweets_%Y%m%d_%H%M%S.json`
pub fn raw_filename(now: DateTime<Utc>) -> String {
    format!("tweets_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// 以 JSON Lines 格式保存推文（每行一条），返回文件路径
pub async fn save_tweets_to_file(
    dir: &Path,
    tweets: &[Tweet],
    filename: &str,
) -> ETLResult<PathBuf> {
    let mut buffer = Vec::new();
    for tweet in tweets {
        serde_json::to_writer(&mut buffer, tweet)?;
        buffer.push(b'\n');
    }

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    tokio::fs::write(&path, buffer).await?;

    tracing::info!("Saved {} tweets to {}", tweets.len(), path.display());
    Ok(path)
}
