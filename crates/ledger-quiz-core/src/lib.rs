//! Engine for the Debit or Credit Challenge.
//!
//! - [`question`]: the question record and its load-time invariants
//! - [`bank`]: question file loading and per-attempt draw order
//! - [`session`]: the per-player state machine and scoring rules
//! - [`scoreboard`]: score persistence contract and leaderboard ranking

pub mod bank;
pub mod question;
pub mod rng;
pub mod scoreboard;
pub mod session;

pub use bank::{shuffled_draw_sequence, QuestionBank, QuestionLoadError, SkippedQuestion};
pub use question::{InvalidQuestion, Question, QuestionType};
pub use rng::QuizRng;
pub use scoreboard::{
    rank_rows, record_score, top, MemorySheet, RankedScore, ScoreRecord, SheetError,
    SheetResult, Worksheet, DEFAULT_TOP, HEADER,
};
pub use session::{
    points_for_streak, AnswerOutcome, Event, Phase, ReviewEntry, Session, Transition,
};
