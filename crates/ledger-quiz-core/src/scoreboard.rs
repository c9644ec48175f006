//! Score persistence contract and leaderboard ranking
//!
//! The remote store is an append-only table of string rows. Backends implement
//! [`Worksheet`]; everything here only relies on appending and reading rows.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

/// Header written before the first score of an empty sheet
pub const HEADER: [&str; 4] = ["Name", "Score", "Attempt Number", "Timestamp"];

/// Default leaderboard length
pub const DEFAULT_TOP: usize = 10;

/// Timestamp layout of the persisted rows
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors raised by a worksheet backend
#[derive(Debug, Clone, Error)]
pub enum SheetError {
    /// Network/connection error
    #[error("network error: {0}")]
    Network(String),
    /// Credential rejected or token exchange failed
    #[error("authentication failed: {0}")]
    Auth(String),
    /// Spreadsheet or worksheet does not exist
    #[error("sheet not found: {0}")]
    NotFound(String),
    /// Unexpected payload from the service
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Local storage error
    #[error("storage error: {0}")]
    Storage(String),
}

pub type SheetResult<T> = Result<T, SheetError>;

/// One worksheet of an append-only row store
pub trait Worksheet: Send + Sync {
    /// Append one row after the last existing row
    fn append_row(&self, row: &[String]) -> SheetResult<()>;

    /// Every row in insertion order, header included
    fn read_all_rows(&self) -> SheetResult<Vec<Vec<String>>>;

    /// Backend name for display
    fn backend_name(&self) -> &'static str;
}

/// One finished attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub name: String,
    pub score: u32,
    pub attempt: u32,
    pub timestamp: String,
}

impl ScoreRecord {
    pub fn stamped_now(name: &str, score: u32, attempt: u32) -> Self {
        Self {
            name: name.to_string(),
            score,
            attempt,
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.score.to_string(),
            self.attempt.to_string(),
            self.timestamp.clone(),
        ]
    }
}

/// Append a score, writing the header first when the sheet is empty.
///
/// Not idempotent: callers guard against saving the same attempt twice.
pub fn record_score(sheet: &dyn Worksheet, record: &ScoreRecord) -> SheetResult<()> {
    if sheet.read_all_rows()?.is_empty() {
        let header: Vec<String> = HEADER.iter().map(|h| h.to_string()).collect();
        sheet.append_row(&header)?;
    }
    sheet.append_row(&record.to_row())?;

    info!(
        backend = sheet.backend_name(),
        name = %record.name,
        score = record.score,
        attempt = record.attempt,
        "score saved"
    );
    Ok(())
}

/// A leaderboard line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedScore {
    pub rank: usize,
    pub name: String,
    pub score: i64,
    pub attempt: Option<u32>,
    pub timestamp: Option<String>,
}

/// Read the sheet and rank it
pub fn top(sheet: &dyn Worksheet, n: usize) -> SheetResult<Vec<RankedScore>> {
    Ok(rank_rows(&sheet.read_all_rows()?, n))
}

/// Rank raw rows by score, highest first, keeping insertion order among ties.
///
/// The header row and rows whose score is missing or non-numeric are dropped.
pub fn rank_rows(rows: &[Vec<String>], n: usize) -> Vec<RankedScore> {
    let body = match rows.first() {
        Some(first) if is_header(first) => &rows[1..],
        _ => rows,
    };

    let mut scored: Vec<(i64, &Vec<String>)> = body
        .iter()
        .filter_map(|row| {
            let score = parse_score(row.get(1)?)?;
            Some((score, row))
        })
        .collect();

    // sort_by is stable, so equal scores keep store order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (score, row))| RankedScore {
            rank: i + 1,
            name: row.first().cloned().unwrap_or_default(),
            score,
            attempt: row.get(2).and_then(|a| a.trim().parse().ok()),
            timestamp: row.get(3).filter(|t| !t.is_empty()).cloned(),
        })
        .collect()
}

fn is_header(row: &[String]) -> bool {
    row.len() >= 2
        && row[0].trim().eq_ignore_ascii_case(HEADER[0])
        && row[1].trim().eq_ignore_ascii_case(HEADER[1])
}

/// Integer scores, plus integral floats such as "30.0" that spreadsheets emit
fn parse_score(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if let Ok(v) = cell.parse::<i64>() {
        return Some(v);
    }
    let v = cell.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

// ==================== In-memory Worksheet ====================

/// In-memory worksheet for tests and offline runs
#[derive(Debug)]
pub struct MemorySheet {
    rows: Mutex<Vec<Vec<String>>>,
    available: Mutex<bool>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            available: Mutex::new(true),
        }
    }

    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: Mutex::new(rows),
            available: Mutex::new(true),
        }
    }

    /// Make every call fail like an unreachable service
    pub fn set_available(&self, available: bool) {
        *self.lock_available() = available;
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.lock_rows().clone()
    }

    fn lock_rows(&self) -> std::sync::MutexGuard<'_, Vec<Vec<String>>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_available(&self) -> std::sync::MutexGuard<'_, bool> {
        self.available.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> SheetResult<()> {
        if *self.lock_available() {
            Ok(())
        } else {
            Err(SheetError::Network("memory sheet unavailable".into()))
        }
    }
}

impl Default for MemorySheet {
    fn default() -> Self {
        Self::new()
    }
}

impl Worksheet for MemorySheet {
    fn append_row(&self, row: &[String]) -> SheetResult<()> {
        self.check()?;
        self.lock_rows().push(row.to_vec());
        Ok(())
    }

    fn read_all_rows(&self) -> SheetResult<Vec<Vec<String>>> {
        self.check()?;
        Ok(self.rows())
    }

    fn backend_name(&self) -> &'static str {
        "Memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn record(name: &str, score: u32) -> ScoreRecord {
        ScoreRecord {
            name: name.into(),
            score,
            attempt: 1,
            timestamp: "2026-01-05 09:30:00".into(),
        }
    }

    #[test]
    fn test_header_written_once() {
        let sheet = MemorySheet::new();
        record_score(&sheet, &record("Ada", 40)).unwrap();
        record_score(&sheet, &record("Bob", 20)).unwrap();

        let rows = sheet.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], row(&HEADER));
        assert_eq!(rows[1], row(&["Ada", "40", "1", "2026-01-05 09:30:00"]));
        assert_eq!(rows[2][0], "Bob");
    }

    #[test]
    fn test_no_header_when_sheet_has_rows() {
        let sheet = MemorySheet::with_rows(vec![row(&["Zed", "5", "1", "t0"])]);
        record_score(&sheet, &record("Ada", 40)).unwrap();
        let rows = sheet.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "Ada");
    }

    #[test]
    fn test_record_fails_when_unavailable() {
        let sheet = MemorySheet::new();
        sheet.set_available(false);
        let result = record_score(&sheet, &record("Ada", 40));
        assert!(matches!(result, Err(SheetError::Network(_))));
        sheet.set_available(true);
        assert!(sheet.rows().is_empty());
    }

    #[test]
    fn test_rank_drops_malformed_rows() {
        let rows = vec![
            row(&["A", "30", "1", "t1"]),
            row(&["B", "50", "1", "t2"]),
            row(&["C", "abc", "1", "t3"]),
        ];
        let ranked = rank_rows(&rows, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!((ranked[0].rank, ranked[0].name.as_str(), ranked[0].score), (1, "B", 50));
        assert_eq!((ranked[1].rank, ranked[1].name.as_str(), ranked[1].score), (2, "A", 30));
    }

    #[test]
    fn test_rank_skips_header_and_short_rows() {
        let rows = vec![
            row(&HEADER),
            row(&["A", "30.0", "2", "t1"]),
            row(&["B"]),
            row(&["C", "12.5", "1", "t3"]),
        ];
        let ranked = rank_rows(&rows, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 30);
        assert_eq!(ranked[0].attempt, Some(2));
    }

    #[test]
    fn test_ties_keep_insertion_order_and_limit() {
        let rows = vec![
            row(&["First", "20", "1", "t1"]),
            row(&["Top", "90", "1", "t2"]),
            row(&["Second", "20", "1", "t3"]),
            row(&["Low", "5", "1", "t4"]),
        ];
        let ranked = rank_rows(&rows, 3);
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Top", "First", "Second"]);
        let ranks: Vec<usize> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_top_reads_through_sheet() {
        let sheet = MemorySheet::new();
        record_score(&sheet, &record("Ada", 40)).unwrap();
        record_score(&sheet, &record("Bob", 70)).unwrap();
        let ranked = top(&sheet, DEFAULT_TOP).unwrap();
        assert_eq!(ranked[0].name, "Bob");
        assert_eq!(ranked[1].timestamp.as_deref(), Some("2026-01-05 09:30:00"));
    }

    #[test]
    fn test_stamped_now_format() {
        let record = ScoreRecord::stamped_now("Ada", 10, 1);
        assert!(chrono::NaiveDateTime::parse_from_str(&record.timestamp, TIMESTAMP_FORMAT).is_ok());
    }
}
