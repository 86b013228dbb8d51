//! 极性/主观性打分器

use std::collections::HashMap;
use thiserror::Error;

/// 打分失败。被分类器完全吸收，不会传播给调用方
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("文本编码异常: {0}")]
    EncodingAnomaly(String),

    #[error("打分器错误: {0}")]
    Scorer(String),
}

/// 打分结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarityScore {
    /// [-1.0, 1.0]
    pub polarity: f64,
    /// [0.0, 1.0]
    pub subjectivity: f64,
}

impl PolarityScore {
    pub const ZERO: PolarityScore = PolarityScore {
        polarity: 0.0,
        subjectivity: 0.0,
    };

    pub fn new(polarity: f64, subjectivity: f64) -> Self {
        Self {
            polarity: polarity.clamp(-1.0, 1.0),
            subjectivity: subjectivity.clamp(0.0, 1.0),
        }
    }
}

/// 打分能力接口，分类器只依赖这一个方法
pub trait PolarityScorer: Send + Sync {
    fn score(&self, text: &str) -> Result<PolarityScore, ScoreError>;
}

impl<F> PolarityScorer for F
where
    F: Fn(&str) -> Result<PolarityScore, ScoreError> + Send + Sync,
{
    fn score(&self, text: &str) -> Result<PolarityScore, ScoreError> {
        self(text)
    }
}

/// 否定词把后面情感词的极性乘以该系数
const NEGATION_FACTOR: f64 = -0.5;

#[derive(Debug, Clone, Copy)]
struct LexiconEntry {
    polarity: f64,
    subjectivity: f64,
}

/// 基于词典的打分器
///
/// 每个命中的情感词给出 (极性, 主观性)，前面紧挨的程度副词按倍数放大，
/// 再往前的否定词翻转并减半。结果取所有命中词的平均值；一个都没命中时为 (0, 0)。
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    words: HashMap<String, LexiconEntry>,
    intensifiers: HashMap<String, f64>,
    negations: Vec<String>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        let mut scorer = Self {
            words: HashMap::new(),
            intensifiers: HashMap::new(),
            negations: Vec::new(),
        };

        scorer.initialize_dictionaries();
        scorer
    }

    fn initialize_dictionaries(&mut self) {
        // (词, 极性, 主观性)
        let positive_words = vec![
            ("love", 0.5, 0.6),
            ("loved", 0.7, 0.8),
            ("lovely", 0.5, 0.75),
            ("amazing", 0.6, 0.9),
            ("awesome", 1.0, 1.0),
            ("fantastic", 0.4, 0.9),
            ("wonderful", 1.0, 1.0),
            ("excellent", 1.0, 1.0),
            ("great", 0.8, 0.75),
            ("good", 0.7, 0.6),
            ("nice", 0.6, 1.0),
            ("best", 1.0, 0.3),
            ("better", 0.5, 0.5),
            ("happy", 0.8, 1.0),
            ("glad", 0.5, 1.0),
            ("beautiful", 0.85, 1.0),
            ("brilliant", 0.9, 1.0),
            ("perfect", 1.0, 1.0),
            ("impressive", 1.0, 1.0),
            ("enjoy", 0.4, 0.5),
            ("fun", 0.3, 0.2),
            ("cool", 0.35, 0.65),
            ("okay", 0.5, 0.5),
            ("ok", 0.5, 0.5),
            ("fine", 0.4, 0.5),
            ("helpful", 0.5, 0.5),
            ("exciting", 0.3, 0.8),
            ("excited", 0.375, 0.75),
            ("innovative", 0.5, 0.5),
            ("useful", 0.3, 0.0),
            ("interesting", 0.5, 0.5),
            ("successful", 0.75, 0.95),
            ("positive", 0.23, 0.55),
        ];

        let negative_words = vec![
            ("hate", -0.8, 0.9),
            ("hated", -0.9, 0.7),
            ("terrible", -1.0, 1.0),
            ("awful", -1.0, 1.0),
            ("horrible", -1.0, 1.0),
            ("worst", -1.0, 1.0),
            ("worse", -0.4, 0.6),
            ("bad", -0.7, 0.67),
            ("poor", -0.4, 0.6),
            ("sad", -0.5, 1.0),
            ("angry", -0.5, 1.0),
            ("annoying", -0.8, 0.9),
            ("disappointing", -0.6, 0.7),
            ("disappointed", -0.75, 0.75),
            ("boring", -1.0, 1.0),
            ("ugly", -0.7, 1.0),
            ("stupid", -0.8, 1.0),
            ("useless", -0.5, 0.2),
            ("broken", -0.4, 0.4),
            ("wrong", -0.5, 0.9),
            ("slow", -0.3, 0.4),
            ("difficult", -0.5, 1.0),
            ("dangerous", -0.6, 0.9),
            ("scary", -0.5, 1.0),
            ("negative", -0.3, 0.4),
            ("fail", -0.5, 0.3),
            ("failed", -0.5, 0.3),
        ];

        for (word, polarity, subjectivity) in positive_words.into_iter().chain(negative_words) {
            self.words.insert(
                word.to_string(),
                LexiconEntry {
                    polarity,
                    subjectivity,
                },
            );
        }

        let intensifiers = vec![
            ("very", 1.3),
            ("so", 1.3),
            ("really", 1.3),
            ("extremely", 1.5),
            ("incredibly", 1.5),
            ("super", 1.4),
            ("totally", 1.3),
            ("quite", 1.1),
            ("pretty", 1.1),
            ("slightly", 0.5),
            ("somewhat", 0.7),
        ];

        for (word, multiplier) in intensifiers {
            self.intensifiers.insert(word.to_string(), multiplier);
        }

        self.negations = ["not", "never", "no", "nothing", "hardly", "neither", "nor"]
            .iter()
            .map(|w| w.to_string())
            .collect();
    }

    /// 追加或覆盖词典条目
    pub fn with_word(mut self, word: &str, polarity: f64, subjectivity: f64) -> Self {
        self.words.insert(
            word.to_lowercase(),
            LexiconEntry {
                polarity: polarity.clamp(-1.0, 1.0),
                subjectivity: subjectivity.clamp(0.0, 1.0),
            },
        );
        self
    }

    fn is_negation(&self, token: &str) -> bool {
        token.ends_with("n't") || self.negations.iter().any(|n| n == token)
    }

    fn tokenize(text: &str) -> Vec<String> {
        text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '’'))
            .filter(|t| !t.is_empty())
            .map(|t| t.replace('’', "'").to_lowercase())
            .collect()
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl PolarityScorer for LexiconScorer {
    fn score(&self, text: &str) -> Result<PolarityScore, ScoreError> {
        if let Some(pos) = text.find(|c: char| c == char::REPLACEMENT_CHARACTER || c == '\0') {
            return Err(ScoreError::EncodingAnomaly(format!(
                "invalid character at byte {}",
                pos
            )));
        }

        let tokens = Self::tokenize(text);
        let mut hits: Vec<PolarityScore> = Vec::new();

        for (idx, token) in tokens.iter().enumerate() {
            let Some(entry) = self.words.get(token) else {
                continue;
            };

            let mut polarity = entry.polarity;
            let mut subjectivity = entry.subjectivity;
            let mut lookback = idx;

            if lookback > 0 {
                if let Some(&multiplier) = self.intensifiers.get(&tokens[lookback - 1]) {
                    polarity *= multiplier;
                    subjectivity *= multiplier;
                    lookback -= 1;
                }
            }

            if lookback > 0 && self.is_negation(&tokens[lookback - 1]) {
                polarity *= NEGATION_FACTOR;
            }

            hits.push(PolarityScore::new(polarity, subjectivity));
        }

        if hits.is_empty() {
            return Ok(PolarityScore::ZERO);
        }

        let n = hits.len() as f64;
        let polarity = hits.iter().map(|h| h.polarity).sum::<f64>() / n;
        let subjectivity = hits.iter().map(|h| h.subjectivity).sum::<f64>() / n;

        Ok(PolarityScore::new(polarity, subjectivity))
    }
}
