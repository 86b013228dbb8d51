//! 管道配置

use crate::types::{ETLError, ETLResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 管道配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub twitter: TwitterConfig,
    pub processing: ProcessingConfig,
    pub storage: StorageConfig,
    pub dashboard: DashboardConfig,
    pub scheduler: SchedulerConfig,
    pub monitor: MonitorConfig,
}

/// 社交 API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub base_url: String,
    /// 直接写在配置里的 token，优先于环境变量
    #[serde(skip_serializing)]
    pub bearer_token: Option<String>,
    /// 存放 token 的环境变量名
    pub bearer_token_env: String,
    /// 搜索关键词，以 OR 连接
    pub keywords: Vec<String>,
    /// 每次采集的最大条数
    pub max_results: usize,
    /// 请求超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twitter.com".to_string(),
            bearer_token: None,
            bearer_token_env: "TWITTER_BEARER_TOKEN".to_string(),
            keywords: vec![
                "technology".to_string(),
                "ai".to_string(),
                "machine learning".to_string(),
            ],
            max_results: 500,
            request_timeout_secs: 30,
        }
    }
}

impl TwitterConfig {
    pub fn bearer_token(&self) -> Option<String> {
        self.bearer_token
            .clone()
            .or_else(|| std::env::var(&self.bearer_token_env).ok())
            .filter(|t| !t.is_empty())
    }

    pub fn query(&self) -> String {
        self.keywords.join(" OR ")
    }
}

/// 处理阶段配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// 原始 JSON Lines 文件目录
    pub raw_dir: PathBuf,
    /// 只保留该语言
    pub language: String,
    /// 热门话题的点赞下限（不含）
    pub trending_min_likes: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            language: "en".to_string(),
            trending_min_likes: 10,
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/warehouse.db".to_string(),
        }
    }
}

/// 看板导出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub output_dir: PathBuf,
    /// 每次管道运行后导出的趋势天数
    pub trend_days: i64,
    /// 完整导出的趋势天数
    pub export_days: i64,
    /// 按小时导出的天数
    pub hourly_days: i64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data/dashboard"),
            trend_days: 7,
            export_days: 30,
            hourly_days: 7,
        }
    }
}

/// 调度配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub pipeline_interval_secs: u64,
    pub dashboard_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pipeline_interval_secs: 300,   // 5 分钟
            dashboard_interval_secs: 3600, // 1 小时
        }
    }
}

impl SchedulerConfig {
    pub fn pipeline_interval(&self) -> Duration {
        Duration::from_secs(self.pipeline_interval_secs.max(1))
    }

    pub fn dashboard_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard_interval_secs.max(1))
    }
}

/// 监控配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// 存储名称节点的 Web 地址
    pub name_node_url: String,
    /// 计算集群主节点的 Web 地址
    pub compute_master_url: String,
    pub check_timeout_secs: u64,
    /// 原始数据超过该时长视为过期
    pub max_data_age_secs: u64,
    pub reports_dir: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            name_node_url: "http://localhost:9870".to_string(),
            compute_master_url: "http://localhost:8080".to_string(),
            check_timeout_secs: 5,
            max_data_age_secs: 3600,
            reports_dir: PathBuf::from("reports"),
        }
    }
}

impl PipelineConfig {
    /// 按扩展名加载 YAML / TOML / JSON 配置
    pub fn load<P: AsRef<Path>>(path: P) -> ETLResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ETLError::Config(format!("{}: {}", path.display(), e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::parse(&content, ext)
    }

    pub fn parse(content: &str, format: &str) -> ETLResult<Self> {
        match format {
            "yaml" | "yml" => {
                serde_yaml::from_str(content).map_err(|e| ETLError::Config(e.to_string()))
            }
            "toml" => toml::from_str(content).map_err(|e| ETLError::Config(e.to_string())),
            "json" => serde_json::from_str(content).map_err(|e| ETLError::Config(e.to_string())),
            other => Err(ETLError::Config(format!("不支持的配置格式: {}", other))),
        }
    }

    /// 配置文件存在就加载，否则使用默认值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> ETLResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!("Config file {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }
}
