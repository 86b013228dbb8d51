//! 情感分析管道命令行
//!
//! - `run`: 执行一次完整管道
//! - `schedule`: 定时运行，Ctrl-C 退出
//! - `export`: 导出全部看板 CSV
//! - `health`: 生成健康报告

use anyhow::Result;
use clap::{Parser, Subcommand};
use sentiment_etl::{PipelineConfig, SentimentPipeline};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sentiment-pipeline")]
#[command(version, about = "Social media sentiment ETL pipeline")]
struct Cli {
    /// 配置文件（YAML / TOML / JSON）
    #[arg(short, long, env = "SENTIMENT_ETL_CONFIG", default_value = "config/pipeline.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline once
    Run {
        /// Override configured keywords
        #[arg(short, long)]
        keywords: Vec<String>,
        #[arg(short, long)]
        max_results: Option<usize>,
    },
    /// Run the pipeline on its schedule until interrupted
    Schedule,
    /// Export all dashboard CSV files
    Export,
    /// Check services and data freshness
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sentiment_etl=info,sentiment_pipeline=info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::load_or_default(&cli.config)?;
    let pipeline = SentimentPipeline::new(config).await?;

    match cli.command {
        Commands::Run {
            keywords,
            max_results,
        } => {
            if keywords.is_empty() && max_results.is_none() {
                let run = pipeline.run_full_pipeline().await;
                tracing::info!("Processed {} tweets", run.processed);
            } else {
                let keywords = (!keywords.is_empty()).then_some(keywords);
                if let Some(filename) = pipeline
                    .collect_tweets(keywords.as_deref(), max_results)
                    .await?
                {
                    pipeline.process_data(Some(&filename)).await?;
                }
                pipeline.update_dashboard_data().await?;
            }
            tracing::info!("{}", pipeline.storage_stats().await?);
        }
        Commands::Schedule => {
            pipeline
                .start_scheduler(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("Failed to listen for ctrl-c: {}", e);
                    }
                })
                .await;
        }
        Commands::Export => {
            let (files, dataset) = pipeline.export_dashboard().await?;
            for file in &files {
                tracing::info!("Wrote {}", file.display());
            }
            tracing::info!("Dashboard dataset has {} rows", dataset.len());
        }
        Commands::Health => {
            let (report, path) = pipeline.health_report().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_healthy() {
                tracing::warn!("Pipeline unhealthy, see {}", path.display());
            }
        }
    }

    Ok(())
}
