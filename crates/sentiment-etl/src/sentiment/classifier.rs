//! 文本情感分类器

use super::cleaner::clean_text;
use super::lexicon::{LexiconScorer, PolarityScorer, ScoreError};
use crate::types::{Classified, SentimentResult, TextRecord};
use rayon::prelude::*;

/// 情感分类器：清洗文本，交给打分器，再按固定阈值打标签
///
/// 无状态，每次调用互不影响，可以在多个线程间共享。
pub struct TextSentimentClassifier<S = LexiconScorer> {
    scorer: S,
}

impl TextSentimentClassifier<LexiconScorer> {
    pub fn new() -> Self {
        Self {
            scorer: LexiconScorer::new(),
        }
    }
}

impl Default for TextSentimentClassifier<LexiconScorer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: PolarityScorer> TextSentimentClassifier<S> {
    /// 使用自定义打分器
    pub fn with_scorer(scorer: S) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn clean_text(&self, text: &str) -> String {
        clean_text(text)
    }

    /// 严格版本：打分失败时返回错误，调用方可以区分“失败”和“中性”
    pub fn try_classify(&self, text: &str) -> Result<SentimentResult, ScoreError> {
        let cleaned_text = clean_text(text);
        let score = self.scorer.score(&cleaned_text)?;
        if !score.polarity.is_finite() || !score.subjectivity.is_finite() {
            return Err(ScoreError::Scorer(format!(
                "非有限分数: polarity={}, subjectivity={}",
                score.polarity, score.subjectivity
            )));
        }

        Ok(SentimentResult::from_scores(
            cleaned_text,
            score.polarity,
            score.subjectivity,
        ))
    }

    /// 分析单条文本，永不失败
    ///
    /// 打分失败时返回中性默认值，`cleaned_text` 为原始文本。
    pub fn classify(&self, text: &str) -> SentimentResult {
        match self.try_classify(text) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Error analyzing sentiment: {}", e);
                SentimentResult::neutral_default(text)
            }
        }
    }

    /// 批量分析，保持输入顺序
    pub fn classify_batch<R: TextRecord>(&self, records: Vec<R>) -> Vec<Classified<R>> {
        let results: Vec<Classified<R>> = records
            .into_iter()
            .map(|record| {
                let sentiment = self.classify(record.text());
                Classified { record, sentiment }
            })
            .collect();

        tracing::info!("Analyzed sentiment for {} records", results.len());
        results
    }

    /// 并行批量分析，输出顺序与输入一致
    pub fn classify_batch_par<R>(&self, records: Vec<R>) -> Vec<Classified<R>>
    where
        R: TextRecord + Send,
    {
        let results: Vec<Classified<R>> = records
            .into_par_iter()
            .map(|record| {
                let sentiment = self.classify(record.text());
                Classified { record, sentiment }
            })
            .collect();

        tracing::info!("Analyzed sentiment for {} records", results.len());
        results
    }

    /// 平均极性
    pub fn average_polarity(&self, results: &[SentimentResult]) -> f64 {
        if results.is_empty() {
            return 0.0;
        }

        let sum: f64 = results.iter().map(|r| r.polarity).sum();
        sum / results.len() as f64
    }
}
