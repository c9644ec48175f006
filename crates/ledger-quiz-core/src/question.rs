use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Which side of the entry the player is asked about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Debit,
    Credit,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Debit => write!(f, "debited"),
            QuestionType::Credit => write!(f, "credited"),
        }
    }
}

/// A single transaction to classify
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub transaction: String,
    pub accounts: Vec<String>,
    pub correct_debit: String,
    pub correct_credit: String,
    pub question_type: QuestionType,
    pub explanation: String,
}

/// Why a question record was rejected at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidQuestion {
    NoAccounts,
    DuplicateAccount(String),
    AnswerNotListed(String),
}

impl fmt::Display for InvalidQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAccounts => write!(f, "no answer accounts listed"),
            Self::DuplicateAccount(a) => write!(f, "account '{}' listed more than once", a),
            Self::AnswerNotListed(a) => write!(f, "correct answer '{}' is not among the accounts", a),
        }
    }
}

impl Question {
    /// The account that scores for this question
    pub fn correct_answer(&self) -> &str {
        match self.question_type {
            QuestionType::Debit => &self.correct_debit,
            QuestionType::Credit => &self.correct_credit,
        }
    }

    /// Prompt line shown above the answer choices
    pub fn prompt(&self) -> String {
        format!("Which account is {}?", self.question_type)
    }

    pub fn is_correct(&self, account: &str) -> bool {
        self.correct_answer() == account
    }

    pub fn validate(&self) -> Result<(), InvalidQuestion> {
        if self.accounts.is_empty() {
            return Err(InvalidQuestion::NoAccounts);
        }

        let mut seen = HashSet::new();
        for account in &self.accounts {
            if !seen.insert(account.as_str()) {
                return Err(InvalidQuestion::DuplicateAccount(account.clone()));
            }
        }

        let answer = self.correct_answer();
        if !seen.contains(answer) {
            return Err(InvalidQuestion::AnswerNotListed(answer.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample(transaction: &str, kind: QuestionType) -> Question {
    Question {
        transaction: transaction.to_string(),
        accounts: vec!["Cash".into(), "Revenue".into(), "Equipment".into()],
        correct_debit: "Cash".into(),
        correct_credit: "Revenue".into(),
        question_type: kind,
        explanation: "Cash increases with a debit; revenue with a credit.".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_answer_follows_type() {
        let debit = sample("Sold services for cash", QuestionType::Debit);
        let credit = sample("Sold services for cash", QuestionType::Credit);
        assert_eq!(debit.correct_answer(), "Cash");
        assert_eq!(credit.correct_answer(), "Revenue");
        assert!(credit.is_correct("Revenue"));
        assert!(!credit.is_correct("Cash"));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut q = sample("x", QuestionType::Debit);
        q.accounts.push("Cash".into());
        assert_eq!(
            q.validate(),
            Err(InvalidQuestion::DuplicateAccount("Cash".into()))
        );
    }

    #[test]
    fn test_validate_rejects_missing_answer() {
        let mut q = sample("x", QuestionType::Credit);
        q.correct_credit = "Unearned Revenue".into();
        assert!(matches!(q.validate(), Err(InvalidQuestion::AnswerNotListed(_))));

        q.accounts.clear();
        assert_eq!(q.validate(), Err(InvalidQuestion::NoAccounts));
    }

    #[test]
    fn test_only_active_side_must_be_listed() {
        // The inactive side is informational and may name any account
        let mut q = sample("x", QuestionType::Debit);
        q.correct_credit = "Accounts Payable".into();
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_question_type_json() {
        let json = serde_json::to_string(&QuestionType::Credit).unwrap();
        assert_eq!(json, "\"credit\"");
    }
}
