//! 基础情感分析示例
//!
//! 不访问网络：对几条本地推文做清洗、分类、聚合并写入内存仓库

use chrono::Utc;
use sentiment_etl::config::ProcessingConfig;
use sentiment_etl::processing::TweetProcessor;
use sentiment_etl::storage::Storage;
use sentiment_etl::{TextSentimentClassifier, Tweet};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== 情感分析基础示例 ===\n");

    // 1. 单条分类
    println!("1. 单条文本分类...");
    let classifier = TextSentimentClassifier::new();
    for text in [
        "I love this amazing product! @company #awesome https://example.com",
        "This is terrible and awful",
        "The weather is okay today",
    ] {
        let result = classifier.classify(text);
        println!(
            "   [{}] {:.3} (置信度 {:.3}) {}",
            result.sentiment_label, result.polarity, result.confidence, result.cleaned_text
        );
    }
    println!();

    // 2. 批量处理
    println!("2. 批量处理推文...");
    let now = Utc::now();
    let raw: Vec<Tweet> = [
        ("1", "Really great launch today", 25),
        ("2", "Not good at all, very bad support", 3),
        ("3", "RT @news: great launch", 100),
        ("4", "Nothing special", 12),
    ]
    .into_iter()
    .map(|(id, text, likes)| Tweet {
        id: id.to_string(),
        text: text.to_string(),
        created_at: now,
        author_id: None,
        lang: Some("en".to_string()),
        retweet_count: 0,
        like_count: likes,
        reply_count: 0,
        quote_count: 0,
        collected_at: now,
    })
    .collect();

    let processor = TweetProcessor::new(&ProcessingConfig::default());
    let analyzed = processor.add_sentiment_analysis(processor.process_tweets(raw));
    let views = processor.create_aggregated_views(&analyzed);

    println!("   分析了 {} 条推文", analyzed.len());
    for daily in &views.daily_sentiment {
        println!(
            "   {} {}: {} 条, 平均极性 {:.3}",
            daily.tweet_date, daily.sentiment_label, daily.tweet_count, daily.avg_polarity
        );
    }
    println!();

    // 3. 写入仓库
    println!("3. 写入内存仓库...");
    let storage = Storage::new("sqlite::memory:").await?;
    storage.save_analyzed_tweets(&analyzed).await?;
    storage.save_views(&views).await?;

    let summary = storage.dashboard_summary().await?;
    println!("   总数: {}", summary.total_tweets);
    println!("   平均情感: {:.3}", summary.avg_sentiment.unwrap_or_default());

    println!("\n=== 示例完成 ===");
    Ok(())
}
