//! 管道健康监控

use crate::config::MonitorConfig;
use crate::ingestion::create_http_client;
use crate::types::ETLResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use sysinfo::{Disks, System};

/// CPU 使用率的采样间隔
const CPU_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// 单个外部服务的状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub name: String,
    pub url: String,
    pub up: bool,
}

/// 主机资源使用情况
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f32,
    pub memory_percent: f64,
    pub memory_available_gb: f64,
    /// 根分区；找不到磁盘信息时为空
    pub disk_percent: Option<f64>,
    pub disk_free_gb: Option<f64>,
}

/// 健康报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub system: SystemMetrics,
    pub services: Vec<ServiceStatus>,
    pub data_fresh: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.data_fresh && self.services.iter().all(|s| s.up)
    }
}

pub struct PipelineMonitor {
    client: reqwest::Client,
    config: MonitorConfig,
    raw_dir: PathBuf,
}

impl PipelineMonitor {
    pub fn new(config: MonitorConfig, raw_dir: PathBuf) -> ETLResult<Self> {
        Ok(Self {
            client: create_http_client(config.check_timeout_secs)?,
            config,
            raw_dir,
        })
    }

    /// 服务可达且返回 200 才算正常
    pub async fn check_service(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                tracing::warn!("Service check failed for {}: {}", url, e);
                false
            }
        }
    }

    /// 采样 CPU、内存和根分区磁盘使用率
    pub async fn check_system_resources(&self) -> SystemMetrics {
        let mut sys = System::new();
        sys.refresh_cpu();
        tokio::time::sleep(CPU_SAMPLE_INTERVAL).await;
        sys.refresh_cpu();
        sys.refresh_memory();

        let total_memory = sys.total_memory();
        let available_memory = sys.available_memory();
        let memory_percent = if total_memory == 0 {
            0.0
        } else {
            total_memory.saturating_sub(available_memory) as f64 / total_memory as f64 * 100.0
        };

        let disks = Disks::new_with_refreshed_list();
        let root = disks
            .list()
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))
            .or_else(|| disks.list().first())
            .filter(|d| d.total_space() > 0);

        let metrics = SystemMetrics {
            timestamp: Utc::now(),
            cpu_percent: sys.global_cpu_info().cpu_usage(),
            memory_percent,
            memory_available_gb: available_memory as f64 / GIB,
            disk_percent: root.map(|d| {
                d.total_space().saturating_sub(d.available_space()) as f64
                    / d.total_space() as f64
                    * 100.0
            }),
            disk_free_gb: root.map(|d| d.available_space() as f64 / GIB),
        };

        tracing::info!(
            "System metrics: cpu {:.1}%, memory {:.1}% ({:.2} GB available), disk {:?}% ({:?} GB free)",
            metrics.cpu_percent,
            metrics.memory_percent,
            metrics.memory_available_gb,
            metrics.disk_percent,
            metrics.disk_free_gb
        );
        metrics
    }

    /// 原始数据目录中最新文件是否在允许时长内
    pub async fn check_data_freshness(&self) -> bool {
        let max_age = Duration::from_secs(self.config.max_data_age_secs);

        match newest_modification(&self.raw_dir).await {
            Some(modified) => {
                let age = SystemTime::now()
                    .duration_since(modified)
                    .unwrap_or_default();
                if age > max_age {
                    tracing::warn!(
                        "Raw data is stale: newest file is {}s old",
                        age.as_secs()
                    );
                    false
                } else {
                    true
                }
            }
            None => {
                tracing::warn!("No raw data found in {}", self.raw_dir.display());
                false
            }
        }
    }

    /// 检查主机资源、所有服务和数据新鲜度，写出 JSON 报告
    pub async fn generate_health_report(&self) -> ETLResult<(HealthReport, PathBuf)> {
        let (system, name_node_up, compute_up, data_fresh) = futures::join!(
            self.check_system_resources(),
            self.check_service(&self.config.name_node_url),
            self.check_service(&self.config.compute_master_url),
            self.check_data_freshness()
        );

        let report = HealthReport {
            timestamp: Utc::now(),
            system,
            services: vec![
                ServiceStatus {
                    name: "name_node".to_string(),
                    url: self.config.name_node_url.clone(),
                    up: name_node_up,
                },
                ServiceStatus {
                    name: "compute_master".to_string(),
                    url: self.config.compute_master_url.clone(),
                    up: compute_up,
                },
            ],
            data_fresh,
        };

        tokio::fs::create_dir_all(&self.config.reports_dir).await?;
        let path = self.config.reports_dir.join(format!(
            "health_report_{}.json",
            report.timestamp.format("%Y%m%d_%H%M%S")
        ));
        tokio::fs::write(&path, serde_json::to_vec_pretty(&report)?).await?;

        tracing::info!(
            "Health report written to {} (healthy: {})",
            path.display(),
            report.is_healthy()
        );
        Ok((report, path))
    }
}

async fn newest_modification(dir: &Path) -> Option<SystemTime> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut newest: Option<SystemTime> = None;

    while let Ok(Some(entry)) = entries.next_entry().await {
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        if let Ok(modified) = meta.modified() {
            newest = newest.max(Some(modified));
        }
    }

    newest
}
