//! 情感分析模块
//!
//! - `cleaner`: 推文文本清洗
//! - `lexicon`: 可替换的极性/主观性打分器
//! - `classifier`: 清洗 + 打分 + 阈值打标签

pub mod classifier;
pub mod cleaner;
pub mod lexicon;

pub use classifier::TextSentimentClassifier;
pub use cleaner::clean_text;
pub use lexicon::{LexiconScorer, PolarityScore, PolarityScorer, ScoreError};
