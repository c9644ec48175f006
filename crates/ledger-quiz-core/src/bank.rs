//! Question bank loading and draw order.

use crate::question::Question;
use crate::rng::QuizRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that prevent a question file from being used at all
#[derive(Debug, Error)]
pub enum QuestionLoadError {
    #[error("cannot read question file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("question file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("question file must contain a JSON array of questions")]
    NotAnArray,
}

/// An entry that was left out of the bank, with its position in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedQuestion {
    pub index: usize,
    pub reason: String,
}

/// Immutable set of questions shared by every attempt in this process
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Arc<[Question]>,
    skipped: Vec<SkippedQuestion>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions: questions.into(),
            skipped: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Load and validate a question file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuestionLoadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| QuestionLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bank = Self::parse(&json)?;
        info!(
            path = %path.display(),
            loaded = bank.len(),
            skipped = bank.skipped.len(),
            "question bank loaded"
        );
        Ok(bank)
    }

    /// Parse a JSON array of questions, skipping entries that break the invariants
    pub fn parse(json: &str) -> Result<Self, QuestionLoadError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let entries = match value {
            serde_json::Value::Array(entries) => entries,
            _ => return Err(QuestionLoadError::NotAnArray),
        };

        let mut questions = Vec::with_capacity(entries.len());
        let mut skipped = Vec::new();

        for (index, entry) in entries.into_iter().enumerate() {
            let checked = serde_json::from_value::<Question>(entry)
                .map_err(|e| e.to_string())
                .and_then(|q| q.validate().map(|_| q).map_err(|e| e.to_string()));

            match checked {
                Ok(question) => questions.push(question),
                Err(reason) => {
                    warn!(index, %reason, "skipping invalid question");
                    skipped.push(SkippedQuestion { index, reason });
                }
            }
        }

        Ok(Self {
            questions: questions.into(),
            skipped,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn skipped(&self) -> &[SkippedQuestion] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// A fresh random order for one attempt
    pub fn draw_sequence(&self, rng: &mut QuizRng) -> Vec<Question> {
        shuffled_draw_sequence(&self.questions, rng)
    }
}

/// Random permutation of `questions`; every question appears exactly once.
pub fn shuffled_draw_sequence(questions: &[Question], rng: &mut QuizRng) -> Vec<Question> {
    let mut draw = questions.to_vec();
    rng.shuffle(&mut draw);
    draw
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BANK: &str = r#"[
        {
            "transaction": "Paid rent in cash",
            "accounts": ["Rent Expense", "Cash", "Prepaid Rent"],
            "correct_debit": "Rent Expense",
            "correct_credit": "Cash",
            "question_type": "credit",
            "explanation": "Cash decreases, so it is credited."
        },
        {
            "transaction": "Bought supplies on account",
            "accounts": ["Supplies", "Accounts Payable", "Supplies"],
            "correct_debit": "Supplies",
            "correct_credit": "Accounts Payable",
            "question_type": "debit",
            "explanation": "Duplicate account names make this ambiguous."
        },
        { "transaction": "Missing most fields" },
        {
            "transaction": "Owner invested cash",
            "accounts": ["Cash", "Owner's Capital"],
            "correct_debit": "Cash",
            "correct_credit": "Owner's Capital",
            "question_type": "debit",
            "explanation": "Assets increase with debits."
        }
    ]"#;

    #[test]
    fn test_parse_skips_invalid_entries() {
        let bank = QuestionBank::parse(BANK).unwrap();
        assert_eq!(bank.len(), 2);
        let skipped: Vec<usize> = bank.skipped().iter().map(|s| s.index).collect();
        assert_eq!(skipped, vec![1, 2]);
        assert_eq!(bank.questions()[1].transaction, "Owner invested cash");
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(
            QuestionBank::parse(r#"{"transaction": "x"}"#),
            Err(QuestionLoadError::NotAnArray)
        ));
        assert!(matches!(
            QuestionBank::parse("not json"),
            Err(QuestionLoadError::Json(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = QuestionBank::load(dir.path().join("questions.json"));
        assert!(matches!(result, Err(QuestionLoadError::Io { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BANK.as_bytes()).unwrap();
        let bank = QuestionBank::load(file.path()).unwrap();
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn test_draw_sequence_uses_every_question_once() {
        let bank = QuestionBank::parse(BANK).unwrap();
        let mut rng = QuizRng::with_seed(3);
        let draw = bank.draw_sequence(&mut rng);
        assert_eq!(draw.len(), bank.len());
        for q in bank.questions() {
            assert_eq!(draw.iter().filter(|d| *d == q).count(), 1);
        }
    }

    #[test]
    fn test_shipped_question_bank_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../questions.json");
        let bank = QuestionBank::load(path).unwrap();
        assert!(!bank.is_empty());
        assert!(bank.skipped().is_empty());
    }
}
