//! Per-player game state and the answer/advance state machine.
//!
//! A [`Session`] is a plain value: every user action becomes an [`Event`]
//! passed to [`Session::apply`], which returns the next session together with a
//! [`Transition`] describing what happened. Rendering only reads the session.

use crate::bank::QuestionBank;
use crate::question::{Question, QuestionType};
use crate::rng::QuizRng;
use crate::scoreboard::ScoreRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Base award for a correct answer
pub const BASE_POINTS: u32 = 10;
/// Consecutive correct answers needed to raise the multiplier by one
pub const STREAK_STEP: u32 = 3;

/// Points for a correct answer given the streak *before* this answer
pub fn points_for_streak(streak: u32) -> u32 {
    BASE_POINTS * (1 + streak / STREAK_STEP)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    AwaitingName,
    InProgress,
    GameOver,
}

/// One user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NameEntered(String),
    AnswerSubmitted(String),
    PlayAgain,
}

/// Audit record for one answered question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub transaction: String,
    pub question_type: QuestionType,
    pub chosen_answer: String,
    pub correct_answer: String,
    pub explanation: String,
    pub points_awarded: u32,
}

impl ReviewEntry {
    pub fn was_correct(&self) -> bool {
        self.chosen_answer == self.correct_answer
    }
}

/// Result of scoring one answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub points: u32,
    pub correct_answer: String,
    pub explanation: String,
    /// This answer ended the attempt
    pub finished: bool,
}

/// What an event did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The event does not apply in the current phase; session unchanged
    Ignored,
    /// Name accepted and the first attempt started
    Started,
    Answered(AnswerOutcome),
    /// New attempt after a finished one
    Restarted,
}

#[derive(Debug, Clone)]
pub struct Session {
    username: String,
    attempt: u32,
    question_number: usize,
    total_questions: usize,
    score: u32,
    streak: u32,
    remaining_questions: Vec<Question>,
    review: Vec<ReviewEntry>,
    score_saved: bool,
    phase: Phase,
    /// Display order of the current question's accounts (indices into `accounts`)
    option_order: Vec<usize>,
    bank: QuestionBank,
    rng: QuizRng,
}

impl Session {
    pub fn new(bank: QuestionBank) -> Self {
        Self::with_rng(bank, QuizRng::new())
    }

    /// Deterministic session for replays and tests
    pub fn with_seed(bank: QuestionBank, seed: u64) -> Self {
        Self::with_rng(bank, QuizRng::with_seed(seed))
    }

    fn with_rng(bank: QuestionBank, rng: QuizRng) -> Self {
        Self {
            username: String::new(),
            attempt: 0,
            question_number: 1,
            total_questions: bank.len(),
            score: 0,
            streak: 0,
            remaining_questions: Vec::new(),
            review: Vec::new(),
            score_saved: false,
            phase: Phase::AwaitingName,
            option_order: Vec::new(),
            bank,
            rng,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Current attempt, starting at 1; 0 until a name has been entered
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn question_number(&self) -> usize {
        self.question_number
    }

    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn review(&self) -> &[ReviewEntry] {
        &self.review
    }

    pub fn remaining_questions(&self) -> &[Question] {
        &self.remaining_questions
    }

    pub fn score_saved(&self) -> bool {
        self.score_saved
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Question awaiting an answer, if the attempt is in progress
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::InProgress => self.remaining_questions.first(),
            _ => None,
        }
    }

    /// Accounts of the current question in their shuffled display order
    pub fn current_options(&self) -> Vec<&str> {
        match self.current_question() {
            Some(q) => self
                .option_order
                .iter()
                .map(|&i| q.accounts[i].as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Points the next correct answer would earn
    pub fn next_award(&self) -> u32 {
        points_for_streak(self.streak)
    }

    /// Apply one event and return the resulting session
    pub fn apply(mut self, event: Event) -> (Session, Transition) {
        let transition = self.handle(event);
        (self, transition)
    }

    /// In-place form of [`Session::apply`] for owners that keep the session in a field
    pub fn handle(&mut self, event: Event) -> Transition {
        let transition = match (self.phase, event) {
            (Phase::AwaitingName, Event::NameEntered(name)) => {
                let name = name.trim();
                if name.is_empty() {
                    Transition::Ignored
                } else {
                    self.username = name.to_string();
                    self.start_attempt(1);
                    Transition::Started
                }
            }
            (Phase::InProgress, Event::AnswerSubmitted(account)) => self.answer(&account),
            (Phase::GameOver, Event::PlayAgain) => {
                let next = self.attempt + 1;
                self.start_attempt(next);
                Transition::Restarted
            }
            _ => Transition::Ignored,
        };

        debug!(
            ?transition,
            phase = ?self.phase,
            question = self.question_number,
            score = self.score,
            streak = self.streak,
            "session event applied"
        );
        transition
    }

    /// Hand out the score to persist, once per finished attempt.
    ///
    /// The flag is set before the caller tries to save, so a failed write is
    /// not retried on the next render.
    pub fn take_pending_save(&mut self) -> Option<ScoreRecord> {
        if self.phase != Phase::GameOver || self.score_saved {
            return None;
        }
        self.score_saved = true;
        Some(ScoreRecord::stamped_now(
            &self.username,
            self.score,
            self.attempt,
        ))
    }

    fn start_attempt(&mut self, attempt: u32) {
        self.attempt = attempt;
        self.question_number = 1;
        self.total_questions = self.bank.len();
        self.score = 0;
        self.streak = 0;
        self.review.clear();
        self.score_saved = false;
        self.remaining_questions = self.bank.draw_sequence(&mut self.rng);
        self.advance_or_finish();
    }

    fn answer(&mut self, account: &str) -> Transition {
        let Some(question) = self.remaining_questions.first() else {
            return Transition::Ignored;
        };
        if !question.accounts.iter().any(|a| a == account) {
            return Transition::Ignored;
        }

        let question = self.remaining_questions.remove(0);
        let correct = question.is_correct(account);

        let points = if correct {
            let points = points_for_streak(self.streak);
            self.score += points;
            self.streak += 1;
            points
        } else {
            self.streak = 0;
            0
        };

        let correct_answer = question.correct_answer().to_string();
        self.review.push(ReviewEntry {
            transaction: question.transaction,
            question_type: question.question_type,
            chosen_answer: account.to_string(),
            correct_answer: correct_answer.clone(),
            explanation: question.explanation.clone(),
            points_awarded: points,
        });

        self.question_number += 1;
        self.advance_or_finish();

        Transition::Answered(AnswerOutcome {
            correct,
            points,
            correct_answer,
            explanation: question.explanation,
            finished: self.phase == Phase::GameOver,
        })
    }

    /// Either shuffle the next question's options or end the attempt
    fn advance_or_finish(&mut self) {
        if self.question_number > self.total_questions {
            self.phase = Phase::GameOver;
            self.option_order.clear();
            return;
        }

        self.phase = Phase::InProgress;
        let count = self
            .remaining_questions
            .first()
            .map(|q| q.accounts.len())
            .unwrap_or(0);
        self.option_order = (0..count).collect();
        self.rng.shuffle(&mut self.option_order);
    }
}
