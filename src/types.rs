use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 設問数
pub const QUESTION_COUNT: usize = 15;

/// 1問あたりの選択肢数（回答値は 1..=OPTION_COUNT）
pub const OPTION_COUNT: u8 = 3;

/// 予測処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    #[error("回答数が不正です: 期待 {expected}, 実際 {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("設問 {question} の回答値 {value} は範囲外です (1-3)")]
    OutOfRange { question: usize, value: i64 },

    #[error("設問 {question} が未回答です")]
    Unanswered { question: usize },

    #[error("特徴量数が分類器と一致しません: 期待 {expected}, 実際 {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("分類器が未知のラベルコード {0} を返しました")]
    UnknownCode(usize),
}

/// 検証済みの回答ベクトル（15問、各値 1-3）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnswerVector([u8; QUESTION_COUNT]);

impl AnswerVector {
    /// 整数列から回答ベクトルを作成
    ///
    /// 長さが15でない場合、または1-3以外の値を含む場合はエラー
    pub fn new(values: &[i64]) -> Result<Self, PredictionError> {
        if values.len() != QUESTION_COUNT {
            return Err(PredictionError::WrongLength {
                expected: QUESTION_COUNT,
                actual: values.len(),
            });
        }

        let mut answers = [0u8; QUESTION_COUNT];
        for (i, &value) in values.iter().enumerate() {
            if value < 1 || value > OPTION_COUNT as i64 {
                return Err(PredictionError::OutOfRange {
                    question: i + 1,
                    value,
                });
            }
            answers[i] = value as u8;
        }

        Ok(Self(answers))
    }

    pub fn values(&self) -> &[u8; QUESTION_COUNT] {
        &self.0
    }

    /// 分類器への入力（特徴量ベクトル）に変換
    pub fn to_features(&self) -> Vec<f64> {
        self.0.iter().map(|&v| v as f64).collect()
    }
}

/// フォームの入力状態（設問ごとに未回答を区別できる）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerSheet {
    pub answers: Vec<Option<u8>>,
}

impl AnswerSheet {
    pub fn new(answers: Vec<Option<u8>>) -> Self {
        Self { answers }
    }

    /// 回答ベクトルに確定する
    ///
    /// `require_all_answered` が false の場合、未回答の設問は選択肢1として扱う。
    /// この場合「1を選んだ」と「触れていない」は区別できない。
    pub fn resolve(&self, require_all_answered: bool) -> Result<AnswerVector, PredictionError> {
        if self.answers.len() != QUESTION_COUNT {
            return Err(PredictionError::WrongLength {
                expected: QUESTION_COUNT,
                actual: self.answers.len(),
            });
        }

        let mut values = Vec::with_capacity(QUESTION_COUNT);
        for (i, answer) in self.answers.iter().enumerate() {
            match answer {
                Some(v) => values.push(*v as i64),
                None if require_all_answered => {
                    return Err(PredictionError::Unanswered { question: i + 1 });
                }
                None => values.push(1),
            }
        }

        AnswerVector::new(&values)
    }
}
