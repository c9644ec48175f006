use crate::sheets::SheetClient;
use crate::theme::{Theme, ThemeName};
use crossterm::event::{KeyCode, KeyEvent};
use ledger_quiz_core::{
    record_score, top, AnswerOutcome, Event, QuestionBank, RankedScore, Session, Transition,
};
use std::time::Duration;
use tracing::{info, warn};

/// Longest name accepted on the entry screen
pub const MAX_NAME_LEN: usize = 24;

/// Result of handling a key press
pub enum AppAction {
    Continue,
    Quit,
}

/// Current screen state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Name entry before the first attempt
    NameEntry,
    /// Answering questions
    Question,
    /// Attempt finished
    GameOver,
    /// Answer-by-answer review of the last attempt
    Review,
    /// Top scores from the sheet
    Leaderboard,
}

/// Persistence state of the finished attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// Attempt still running or save not attempted yet
    Pending,
    Saved,
    /// The sheet rejected the write
    Failed(String),
    /// No sheet connection; play continues without saving
    Offline(String),
}

/// The main application state
pub struct App {
    /// Game state for the current player
    pub session: Session,
    pub screen: Screen,
    /// Name typed so far on the entry screen
    pub name_input: String,
    /// Highlighted answer option
    pub selection: usize,
    /// Feedback for the previous answer
    pub last_outcome: Option<AnswerOutcome>,
    /// Message to display
    pub message: Option<String>,
    /// Message timer
    message_timer: u32,
    /// Color theme
    pub theme: Theme,
    pub theme_name: ThemeName,
    sheets: SheetClient,
    pub save_status: SaveStatus,
    /// Last leaderboard fetch; `None` until the screen is first opened
    pub leaderboard: Option<Result<Vec<RankedScore>, String>>,
    pub leaderboard_size: usize,
    pub invite_url: Option<String>,
    /// Scroll offset for the review list
    pub review_scroll: usize,
    /// Shown on the name screen when the question bank had problems
    pub bank_warning: Option<String>,
    /// Where Esc returns to from the leaderboard
    return_screen: Screen,
}

impl App {
    pub fn new(bank: QuestionBank, sheets: SheetClient, theme_name: ThemeName) -> Self {
        Self::with_session(Session::new(bank), sheets, theme_name)
    }

    pub fn with_session(session: Session, sheets: SheetClient, theme_name: ThemeName) -> Self {
        Self {
            session,
            screen: Screen::NameEntry,
            name_input: String::new(),
            selection: 0,
            last_outcome: None,
            message: None,
            message_timer: 0,
            theme: Theme::from_name(theme_name),
            theme_name,
            sheets,
            save_status: SaveStatus::Pending,
            leaderboard: None,
            leaderboard_size: ledger_quiz_core::DEFAULT_TOP,
            invite_url: None,
            review_scroll: 0,
            bank_warning: None,
            return_screen: Screen::NameEntry,
        }
    }

    pub fn with_leaderboard_size(mut self, size: usize) -> Self {
        self.leaderboard_size = size.max(1);
        self
    }

    pub fn with_invite_url(mut self, url: Option<String>) -> Self {
        self.invite_url = url;
        self
    }

    pub fn with_bank_warning(mut self, warning: Option<String>) -> Self {
        self.bank_warning = warning;
        self
    }

    /// Poll interval for the event loop
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(100)
    }

    /// Update timers and persist a finished attempt (called every tick)
    pub fn tick(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message = None;
            }
        }

        if self.screen == Screen::GameOver {
            self.persist_pending_score();
        }
    }

    /// Connection summary for the status line
    pub fn sheet_status(&self) -> String {
        self.sheets.status()
    }

    pub fn sheet_name(&self) -> &str {
        self.sheets.sheet_name()
    }

    /// Show a temporary message
    pub fn show_message(&mut self, msg: &str) {
        self.message = Some(msg.to_string());
        self.message_timer = 30; // ~3 seconds at 100ms poll
    }

    /// Handle a key press
    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        match self.screen {
            Screen::NameEntry => self.handle_name_key(key),
            Screen::Question => self.handle_question_key(key),
            Screen::GameOver => self.handle_game_over_key(key),
            Screen::Review => self.handle_review_key(key),
            Screen::Leaderboard => self.handle_leaderboard_key(key),
        }
    }

    fn handle_name_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Esc => return AppAction::Quit,
            KeyCode::Enter => {
                let name = self.name_input.clone();
                match self.session.handle(Event::NameEntered(name)) {
                    Transition::Started => {
                        info!(player = self.session.username(), "player started");
                        self.enter_attempt();
                    }
                    _ => self.show_message("Please enter your name"),
                }
            }
            KeyCode::Backspace => {
                self.name_input.pop();
            }
            KeyCode::Tab => self.open_leaderboard(),
            KeyCode::Char(c) if !c.is_control() => {
                if self.name_input.chars().count() < MAX_NAME_LEN {
                    self.name_input.push(c);
                }
            }
            _ => {}
        }
        AppAction::Continue
    }

    fn handle_question_key(&mut self, key: KeyEvent) -> AppAction {
        let count = self.session.current_options().len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return AppAction::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selection = self.selection.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selection + 1 < count {
                    self.selection += 1;
                }
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = (c as u8 - b'1') as usize;
                if index < count {
                    self.selection = index;
                    self.submit_selection();
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.submit_selection(),
            KeyCode::Char('t') => self.cycle_theme(),
            _ => {}
        }
        AppAction::Continue
    }

    fn handle_game_over_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return AppAction::Quit,
            KeyCode::Enter | KeyCode::Char('p') => {
                // Never leave an unsaved attempt behind
                self.persist_pending_score();
                if self.session.handle(Event::PlayAgain) == Transition::Restarted {
                    self.enter_attempt();
                    self.show_message(&format!("Attempt {}", self.session.attempt()));
                }
            }
            KeyCode::Char('r') => {
                self.review_scroll = 0;
                self.screen = Screen::Review;
            }
            KeyCode::Char('b') => self.open_leaderboard(),
            KeyCode::Char('t') => self.cycle_theme(),
            _ => {}
        }
        AppAction::Continue
    }

    fn handle_review_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.screen = Screen::GameOver,
            KeyCode::Up | KeyCode::Char('k') => {
                self.review_scroll = self.review_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let max = self.session.review().len().saturating_sub(1);
                self.review_scroll = (self.review_scroll + 1).min(max);
            }
            KeyCode::Char('b') => self.open_leaderboard(),
            _ => {}
        }
        AppAction::Continue
    }

    fn handle_leaderboard_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.screen = self.return_screen,
            KeyCode::Char('r') => {
                self.refresh_leaderboard();
                self.show_message("Leaderboard refreshed");
            }
            _ => {}
        }
        AppAction::Continue
    }

    fn submit_selection(&mut self) {
        let Some(account) = self
            .session
            .current_options()
            .get(self.selection)
            .map(|a| a.to_string())
        else {
            return;
        };

        if let Transition::Answered(outcome) = self.session.handle(Event::AnswerSubmitted(account))
        {
            self.selection = 0;
            if outcome.finished {
                self.screen = Screen::GameOver;
                self.save_status = SaveStatus::Pending;
            }
            self.last_outcome = Some(outcome);
        }
    }

    /// Screen for a freshly started attempt; an empty bank ends it immediately
    fn enter_attempt(&mut self) {
        self.selection = 0;
        self.last_outcome = None;
        self.review_scroll = 0;
        self.save_status = SaveStatus::Pending;
        self.screen = if self.session.is_game_over() {
            Screen::GameOver
        } else {
            Screen::Question
        };
    }

    /// Save the finished attempt, once; failures only change the status
    pub fn persist_pending_score(&mut self) {
        let Some(record) = self.session.take_pending_save() else {
            return;
        };

        let sheet = match self.sheets.connect() {
            Ok(sheet) => sheet,
            Err(e) => {
                warn!(error = %e, player = %record.name, "score not saved, no sheet connection");
                self.save_status = SaveStatus::Offline(e.to_string());
                return;
            }
        };

        match record_score(sheet.as_ref(), &record) {
            Ok(()) => {
                self.save_status = SaveStatus::Saved;
                // Stale now that a row was added
                self.leaderboard = None;
                self.show_message("Score saved");
            }
            Err(e) => {
                warn!(error = %e, player = %record.name, "score save failed");
                self.save_status = SaveStatus::Failed(e.to_string());
                self.show_message("Could not save score");
            }
        }
    }

    fn open_leaderboard(&mut self) {
        if self.screen != Screen::Leaderboard {
            self.return_screen = self.screen;
        }
        if self.leaderboard.is_none() {
            self.refresh_leaderboard();
        }
        self.screen = Screen::Leaderboard;
    }

    /// Fetch the top scores again
    pub fn refresh_leaderboard(&mut self) {
        let result = self
            .sheets
            .connect()
            .map_err(|e| e.to_string())
            .and_then(|sheet| top(sheet.as_ref(), self.leaderboard_size).map_err(|e| e.to_string()));

        if let Err(ref e) = result {
            warn!(error = %e, "leaderboard unavailable");
        }
        self.leaderboard = Some(result);
    }

    fn cycle_theme(&mut self) {
        self.theme_name = self.theme_name.next();
        self.theme = Theme::from_name(self.theme_name);
        self.show_message(&format!("Theme: {}", self.theme_name.label()));
    }
}
